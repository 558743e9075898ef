use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::path::Path;

use codespan_reporting::diagnostic::{Diagnostic, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use scoped_arena::Scope;

use crate::core::{self, TempNames};
use crate::domain::TypeEnv;
use crate::files::{FileId, Files};
use crate::matching::{self, Compiled};
use crate::pass::surface_to_core;
use crate::source::ByteRange;
use crate::surface::{self, Item};
use crate::symbol::Symbol;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

/// A definition after its match has been compiled.
struct CompiledDef<'core> {
    name: Symbol,
    range: ByteRange,
    compiled: Compiled<'core>,
}

pub struct Driver {
    files: Files,
    /// Temporary names, shared by every match site the driver compiles.
    names: TempNames,

    allow_errors: bool,
    seen_errors: RefCell<bool>,
    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,

    emit_width: usize,
    emit_writer: RefCell<Box<dyn WriteColor>>,
}

fn color_choice(stream: atty::Stream) -> ColorChoice {
    if atty::is(stream) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: Files::new(),
            names: TempNames::new(),

            allow_errors: false,
            seen_errors: RefCell::new(false),
            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                color_choice(atty::Stream::Stderr),
            ))),

            emit_width: usize::MAX,
            emit_writer: RefCell::new(Box::new(BufferedStandardStream::stdout(color_choice(
                atty::Stream::Stdout,
            )))),
        }
    }

    /// Setup a global panic hook
    pub fn install_panic_hook(&self) {
        // Use the currently set codespan configuration
        let term_config = self.codespan_config.clone();
        // Fetch the default hook (which prints the panic message and an optional backtrace)
        let default_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            let location = info.location();
            let message = if let Some(message) = info.payload().downcast_ref::<String>() {
                message.as_str()
            } else if let Some(message) = info.payload().downcast_ref::<&str>() {
                message
            } else {
                "unknown panic type"
            };

            let diagnostic = Diagnostic::bug()
                .with_message(format!("compiler panicked at '{message}'"))
                .with_notes(vec![
                    match location {
                        Some(location) => format!("panicked at: {location}"),
                        None => "panicked at: unknown location".to_owned(),
                    },
                    "please file a bug report, including the module being compiled".to_owned(),
                ]);

            let mut writer = BufferedStandardStream::stderr(color_choice(atty::Stream::Stderr));
            let dummy_files = SimpleFiles::<String, String>::new();

            default_hook(info);
            eprintln!();
            // Nothing more can be done if the report itself fails
            let _ = codespan_reporting::term::emit(&mut writer, &term_config, &dummy_files, &diagnostic);
        }));
    }

    /// Set to true if we should attempt to continue after encountering errors
    pub fn set_allow_errors(&mut self, allow_errors: bool) {
        self.allow_errors = allow_errors;
    }

    /// Set the writer to use when rendering diagnostics
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Set the width to use when emitting compiled definitions
    pub fn set_emit_width(&mut self, emit_width: usize) {
        self.emit_width = emit_width;
    }

    /// Set the writer to use when emitting compiled definitions
    pub fn set_emit_writer(&mut self, stream: impl 'static + WriteColor) {
        self.emit_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Load a source string into the file database.
    pub fn load_source_string(&mut self, name: String, source: String) -> FileId {
        self.files.add(name, source)
    }

    /// Load a source file into the file database using a reader.
    pub fn load_source(&mut self, name: String, mut reader: impl Read) -> Option<FileId> {
        let mut source = String::new();
        match reader.read_to_string(&mut source) {
            Ok(_) => Some(self.load_source_string(name, source)),
            Err(error) => {
                self.emit_read_diagnostic(name, error);
                None
            }
        }
    }

    /// Load a source file into the file database from the given path.
    pub fn load_source_path(&mut self, path: &Path) -> Option<FileId> {
        match std::fs::File::open(path) {
            Ok(file) => self.load_source(path.display().to_string(), file),
            Err(error) => {
                self.emit_read_diagnostic(path.display(), error);
                None
            }
        }
    }

    /// Compile the match sites of a module, reporting any problems without
    /// emitting the compiled definitions.
    pub fn check_module(&self, file_id: FileId) -> Status {
        let surface_scope = Scope::new();
        let core_scope = Scope::new();

        if let Some(module) = self.parse_module(&surface_scope, file_id) {
            self.compile_module(&core_scope, &module);
        }

        if *self.seen_errors.borrow() {
            Status::Error
        } else {
            Status::Ok
        }
    }

    /// Compile the match sites of a module, emitting one definition per match
    /// site. Sites that could not be compiled are emitted as they were
    /// written.
    pub fn compile_and_emit_module(&self, file_id: FileId) -> Status {
        let surface_scope = Scope::new();
        let core_scope = Scope::new();

        let module = match self.parse_module(&surface_scope, file_id) {
            Some(module) => module,
            None => return Status::Error,
        };
        let defs = self.compile_module(&core_scope, &module);

        // Return early if we’ve seen any errors, unless `allow_errors` is enabled
        if *self.seen_errors.borrow() && !self.allow_errors {
            return Status::Error;
        }

        for def in &defs {
            if let Err(error) = self.emit_def(def) {
                let diagnostic =
                    Diagnostic::error().with_message(format!("couldn't write output: {error}"));
                self.emit_diagnostic(diagnostic);
                return Status::Error;
            }
        }

        Status::Ok
    }

    fn parse_module<'surface>(
        &self,
        scope: &'surface Scope<'surface>,
        file_id: FileId,
    ) -> Option<surface::Module<'surface>> {
        let source = match self.files.get(file_id) {
            Ok(file) => file.source(),
            Err(error) => {
                self.emit_diagnostic(Diagnostic::bug().with_message(error.to_string()));
                return None;
            }
        };

        let (module, messages) = surface::Module::parse(scope, file_id, source);
        self.emit_diagnostics(messages.iter().map(surface::ParseMessage::to_diagnostic));

        Some(module)
    }

    fn compile_module<'core>(
        &self,
        scope: &'core Scope<'core>,
        module: &surface::Module<'_>,
    ) -> Vec<CompiledDef<'core>> {
        let mut types = TypeEnv::new();
        let mut lowering = surface_to_core::Context::new(scope);
        lowering.define_types(module, &mut types);
        self.emit_diagnostics(lowering.drain_messages().map(|m| m.to_diagnostic()));

        let mut context = matching::Context::new(scope, &types, &self.names);
        let mut defs = Vec::new();

        for item in module.items {
            let def = match item {
                Item::Def(def) => def,
                Item::Type(_) => continue,
            };
            let _span = tracing::debug_span!("def", name = %def.name.1).entered();

            let scrutinee_type = lowering.scrutinee_type(&def.expr);
            let compiled = match lowering.lower_match(&def.expr, scrutinee_type.as_ref()) {
                Some(request) => context.compile_match(&request),
                None => Compiled::PassThrough,
            };
            self.emit_diagnostics(lowering.drain_messages().map(|m| m.to_diagnostic()));
            self.emit_diagnostics(context.drain_messages().map(|m| m.to_diagnostic()));

            if let Compiled::Term(_, strategy) = &compiled {
                tracing::debug!(%strategy, "compiled match");
            }
            defs.push(CompiledDef {
                name: def.name.1,
                range: def.range,
                compiled,
            });
        }

        defs
    }

    fn emit_def(&self, def: &CompiledDef<'_>) -> io::Result<()> {
        let mut emit_writer = self.emit_writer.borrow_mut();
        match &def.compiled {
            Compiled::Term(term, _) => {
                let context = core::pretty::Context::new();
                let doc = context.def(def.name, term);
                writeln!(emit_writer, "{}", doc.pretty(self.emit_width))?;
            }
            Compiled::PassThrough => {
                let source = self.files.source_slice(def.range).unwrap_or_default();
                writeln!(emit_writer, "{source}")?;
            }
        }
        emit_writer.flush()
    }

    fn emit_diagnostic(&self, diagnostic: Diagnostic<FileId>) {
        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;

        if let Err(error) =
            codespan_reporting::term::emit(&mut *writer, config, &self.files, &diagnostic)
        {
            tracing::error!(%error, "failed to render diagnostic");
        }
        if let Err(error) = writer.flush() {
            tracing::error!(%error, "failed to flush diagnostics");
        }

        if diagnostic.severity >= Severity::Error {
            *self.seen_errors.borrow_mut() = true;
        }
    }

    fn emit_diagnostics(&self, diagnostics: impl Iterator<Item = Diagnostic<FileId>>) {
        for diagnostic in diagnostics {
            self.emit_diagnostic(diagnostic);
        }
    }

    fn emit_read_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't read `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }
}

impl Default for Driver {
    fn default() -> Driver {
        Driver::new()
    }
}
