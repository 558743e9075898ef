use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// A compiler for discriminant, literal and guard matches
#[derive(Parser)]
#[clap(author, version, about)]
enum Cli {
    /// Compile the match sites of a module, printing the result to stdout
    Compile {
        /// Path to a module to compile
        #[clap(long = "module", name = "MODULE_FILE", display_order = 0)]
        module_file: PathOrStdin,
        /// Continue even if errors were encountered
        #[clap(long = "allow-errors")]
        allow_errors: bool,
    },
    /// Check the match sites of a module for errors
    Check {
        /// Path to a module to check
        #[clap(long = "module", name = "MODULE_FILE", display_order = 0)]
        module_file: PathOrStdin,
    },
}

#[derive(Clone, Debug)]
enum PathOrStdin {
    StdIn,
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(src: &str) -> Result<PathOrStdin, std::convert::Infallible> {
        match src {
            "-" => Ok(PathOrStdin::StdIn),
            _ => Ok(PathOrStdin::Path(PathBuf::from(src))),
        }
    }
}

fn unwrap_or_exit<T>(option: Option<T>) -> T {
    option.unwrap_or_else(|| std::process::exit(matchc::Status::Error.exit_code()))
}

fn load_file_or_exit(driver: &mut matchc::Driver, file: PathOrStdin) -> matchc::files::FileId {
    unwrap_or_exit(match file {
        PathOrStdin::StdIn => driver.load_source("<stdin>".to_owned(), std::io::stdin()),
        PathOrStdin::Path(path) => driver.load_source_path(&path),
    })
}

const MAX_PRETTY_WIDTH: usize = 80;

fn get_pretty_width() -> usize {
    let term_width = termsize::get().map_or(usize::MAX, |size| usize::from(size.cols));
    std::cmp::min(term_width, MAX_PRETTY_WIDTH)
}

/// Log to stderr, filtered by `MATCHC_LOG`. Logging is off unless it is set.
fn init_logging() {
    let filter = EnvFilter::try_from_env("MATCHC_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ! {
    init_logging();

    match Cli::parse() {
        Cli::Compile {
            module_file,
            allow_errors,
        } => {
            let mut driver = matchc::Driver::new();
            driver.install_panic_hook();
            driver.set_allow_errors(allow_errors);
            driver.set_emit_width(get_pretty_width());

            let file_id = load_file_or_exit(&mut driver, module_file);
            let status = driver.compile_and_emit_module(file_id);

            std::process::exit(status.exit_code());
        }
        Cli::Check { module_file } => {
            let mut driver = matchc::Driver::new();
            driver.install_panic_hook();

            let file_id = load_file_or_exit(&mut driver, module_file);
            let status = driver.check_module(file_id);

            std::process::exit(status.exit_code());
        }
    }
}
