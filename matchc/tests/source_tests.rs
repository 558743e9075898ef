use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::process;

use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;
use walkdir::WalkDir;

fn main() {
    let args = Arguments::from_args();

    let tests = find_source_files("tests").map(extract_module_test).collect();

    libtest_mimic::run(&args, tests).exit();
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "kebab-case")]
struct Config {
    #[serde(default = "DEFAULT_IGNORE")]
    ignore: bool,
    #[serde(default = "DEFAULT_EXIT_CODE")]
    exit_code: i32,
    #[serde(default = "DEFAULT_ALLOW_ERRORS")]
    allow_errors: bool,
    #[serde(default = "DEFAULT_CONTAINS")]
    stdout_contains: Vec<String>,
    #[serde(default = "DEFAULT_CONTAINS")]
    stdout_excludes: Vec<String>,
    #[serde(default = "DEFAULT_CONTAINS")]
    stderr_contains: Vec<String>,
}

const DEFAULT_IGNORE: fn() -> bool = || false;
const DEFAULT_EXIT_CODE: fn() -> i32 = || 0;
const DEFAULT_ALLOW_ERRORS: fn() -> bool = || false;
const DEFAULT_CONTAINS: fn() -> Vec<String> = Vec::new;

struct TestFailure {
    name: &'static str,
    details: Vec<(&'static str, String)>,
}

/// Recursively walk over test files under a file path.
fn find_source_files(root: impl AsRef<Path>) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| matches!(entry.path().extension(), Some(ext) if ext == "match"))
        .map(|entry| entry.into_path())
}

fn extract_module_test(path: PathBuf) -> Trial {
    let name = path.display().to_string();
    match read_config(&path) {
        Ok(config) if config.ignore => Trial::test(name, || Ok(())).with_ignored_flag(true),
        Ok(config) => Trial::test(name, move || run_test(&path, &config)),
        Err(failure) => Trial::test(name, move || Err(failures_to_outcome(&[failure]))),
    }
}

fn read_config(input_file: &Path) -> Result<Config, TestFailure> {
    use itertools::Itertools;

    const CONFIG_COMMENT_START: &str = "//~";

    let input_source = std::fs::read_to_string(input_file).map_err(|error| TestFailure {
        name: "unexpected test file error",
        details: vec![("std::io::Error", error.to_string())],
    })?;
    // Collect the lines with CONFIG_COMMENT_START prefix, stripping the prefix in the process
    let config_source = input_source
        .lines()
        .filter_map(|line| line.split(CONFIG_COMMENT_START).nth(1))
        .join("\n");

    // Parse those lines as TOML
    toml::from_str::<Config>(&config_source).map_err(|error| TestFailure {
        name: "config parse error",
        details: vec![("toml::de::Error", error.to_string())],
    })
}

fn run_test(input_file: &Path, config: &Config) -> Result<(), Failed> {
    let mut exe = process::Command::new(env!("CARGO_BIN_EXE_matchc"));
    exe.args(["compile", "--module"]).arg(input_file);
    if config.allow_errors {
        exe.arg("--allow-errors");
    }

    let output = match exe.output() {
        Ok(output) => output,
        Err(error) => {
            return Err(failures_to_outcome(&[TestFailure {
                name: "unexpected command error",
                details: vec![("std::io::Error", error.to_string())],
            }]));
        }
    };
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut failures = Vec::new();

    if output.status.code() != Some(config.exit_code) {
        failures.push(TestFailure {
            name: "unexpected exit status",
            details: vec![
                ("command", format!("{exe:?}")),
                ("status", output.status.to_string()),
                ("stderr", stderr.to_string()),
            ],
        });
    }

    let missing_stdout = (config.stdout_contains.iter())
        .filter(|expected| !stdout.contains(expected.as_str()))
        .map(|expected| ("expected", expected.clone()))
        .collect::<Vec<_>>();
    if !missing_stdout.is_empty() {
        let mut details = missing_stdout;
        details.push(("stdout", stdout.to_string()));
        failures.push(TestFailure {
            name: "missing stdout",
            details,
        });
    }

    let unexpected_stdout = (config.stdout_excludes.iter())
        .filter(|excluded| stdout.contains(excluded.as_str()))
        .map(|excluded| ("excluded", excluded.clone()))
        .collect::<Vec<_>>();
    if !unexpected_stdout.is_empty() {
        let mut details = unexpected_stdout;
        details.push(("stdout", stdout.to_string()));
        failures.push(TestFailure {
            name: "unexpected stdout",
            details,
        });
    }

    let missing_stderr = (config.stderr_contains.iter())
        .filter(|expected| !stderr.contains(expected.as_str()))
        .map(|expected| ("expected", expected.clone()))
        .collect::<Vec<_>>();
    if !missing_stderr.is_empty() {
        let mut details = missing_stderr;
        details.push(("stderr", stderr.to_string()));
        failures.push(TestFailure {
            name: "missing stderr",
            details,
        });
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures_to_outcome(&failures))
    }
}

fn failures_to_outcome(failures: &[TestFailure]) -> Failed {
    let mut msg = String::new();

    writeln!(msg).unwrap();
    for failure in failures {
        writeln!(msg, "    {}:", failure.name).unwrap();
        for (name, data) in &failure.details {
            writeln!(msg, "        ---- {name} ----").unwrap();
            for line in data.lines() {
                writeln!(msg, "        {line}").unwrap();
            }
        }
        writeln!(msg).unwrap();
    }
    writeln!(msg).unwrap();
    writeln!(msg, "    failures:").unwrap();
    for failure in failures {
        writeln!(msg, "        {}", failure.name).unwrap();
    }

    Failed::from(msg)
}
