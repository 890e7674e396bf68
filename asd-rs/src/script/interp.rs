//! ASD script interpreter.
//!
//! The [`Interpreter`] owns the execution [`Env`] (variables, config,
//! output, input, diagnostics, RNG) and the ordered statement-handler
//! library.  A script is loaded into numbered lines, checked structurally,
//! and then walked with a single cursor.  Each line is offered first to the
//! control-flow executor and then to the handlers.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, ErrorCode};
use crate::var::VarStore;
use super::{
    block::{load_lines, validate, Line, StructuralError},
    expand::interpolate,
    expr::EvalError,
    handlers::{HandlerRegistry, Outcome},
    value::{Number, Value},
};

// ── Errors ────────────────────────────────────────────────────────────────────

/// A fault that stops a run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Structural(#[from] StructuralError),
    #[error("cannot read script {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Flow / RunOutcome ─────────────────────────────────────────────────────────

/// What the cursor does after a line or construct has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// `EXIT` ran; unwind every enclosing construct.
    Exit,
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Exited,
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Where statement output goes, one line per write.
pub enum Output {
    Writer(Box<dyn Write>),
    Captured(Vec<String>),
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Writer(_) => f.write_str("Output::Writer"),
            Output::Captured(lines) => f.debug_tuple("Output::Captured").field(lines).finish(),
        }
    }
}

// ── Env ───────────────────────────────────────────────────────────────────────

/// Everything a statement handler may touch.  Handlers never see the cursor.
pub struct Env {
    pub vars: VarStore,
    pub config: EngineConfig,
    output: Output,
    diagnostics: Diagnostics,
    input: Box<dyn BufRead>,
    rng: StdRng,
    /// Line currently executing, for diagnostics.
    line: usize,
}

impl Env {
    fn new(config: EngineConfig, sink: Option<Box<dyn DiagnosticSink>>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Env {
            vars: VarStore::new(),
            config,
            output: Output::Writer(Box::new(std::io::stdout())),
            diagnostics: Diagnostics::new(sink),
            input: Box::new(std::io::BufReader::new(std::io::stdin())),
            rng,
            line: 0,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    /// Write one line of output.
    pub fn emit(&mut self, text: impl Into<String>) {
        let text = text.into();
        match &mut self.output {
            Output::Captured(lines) => lines.push(text),
            Output::Writer(w) => {
                if let Err(e) = writeln!(w, "{text}").and_then(|()| w.flush()) {
                    tracing::debug!("output write failed: {e}");
                }
            }
        }
    }

    pub fn report(&mut self, diag: Diagnostic) {
        self.diagnostics.report(diag);
    }

    /// Report `code` against the current line with a specific message.
    pub fn diagnose(&mut self, code: ErrorCode, message: impl Into<String>) {
        let diag = Diagnostic::new(code, self.line).with_message(message);
        self.diagnostics.report(diag);
    }

    /// Report a failed expression against the current line.
    pub fn report_eval(&mut self, src: &str, err: &EvalError) {
        let code = match err {
            EvalError::Syntax(_) => ErrorCode::SyntaxInvalid,
            EvalError::Type(_) => ErrorCode::TypeArrayString,
            EvalError::Arithmetic(_) => ErrorCode::RuntimeDivisionZero,
        };
        self.diagnose(code, format!("{err} in `{src}`"));
    }

    /// Read one line of input, trimmed.  End of input reads as empty text.
    pub fn read_line(&mut self) -> String {
        let mut buf = String::new();
        if let Err(e) = self.input.read_line(&mut buf) {
            tracing::debug!("input read failed: {e}");
        }
        buf.trim().to_owned()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// `=(name)` interpolation that reports list references.
    pub fn interpolate(&mut self, text: &str) -> String {
        let expansion = interpolate(text, &self.vars);
        for name in &expansion.list_refs {
            self.diagnose(
                ErrorCode::TypeArrayString,
                format!("Variable '{name}' holds a list and cannot be printed"),
            );
        }
        expansion.text
    }

    /// A statement operand: the variable's value when `token` names one,
    /// otherwise the token read as a literal.
    pub fn resolve(&self, token: &str) -> Value {
        match self.vars.get(token) {
            Some(v) => v.clone(),
            None => Value::parse_literal(token),
        }
    }

    /// [`Env::resolve`] coerced to a number.  A list counts as zero and is
    /// reported.
    pub fn numeric_operand(&mut self, token: &str) -> Number {
        match self.resolve(token).coerce_numeric() {
            Ok(n) => n,
            Err(_) => {
                self.diagnose(
                    ErrorCode::TypeArrayString,
                    format!("List '{token}' used in a math operation"),
                );
                Number::Int(0)
            }
        }
    }
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// The ASD script interpreter.
pub struct Interpreter {
    pub(crate) env: Env,
    handlers: HandlerRegistry,
}

impl Interpreter {
    /// An interpreter writing to stdout, reading from stdin, and reporting
    /// diagnostics to `sink`.
    pub fn new(config: EngineConfig, sink: Option<Box<dyn DiagnosticSink>>) -> Self {
        Interpreter {
            env: Env::new(config, sink),
            handlers: HandlerRegistry::standard(),
        }
    }

    /// An interpreter that keeps its output in memory and reads no input.
    pub fn captured(config: EngineConfig) -> Self {
        Interpreter::new(config, None)
            .with_captured_output()
            .with_input(Box::new(std::io::empty()))
    }

    pub fn with_output(mut self, out: Box<dyn Write>) -> Self {
        self.env.output = Output::Writer(out);
        self
    }

    pub fn with_captured_output(mut self) -> Self {
        self.env.output = Output::Captured(Vec::new());
        self
    }

    pub fn with_input(mut self, input: Box<dyn BufRead>) -> Self {
        self.env.input = input;
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn vars(&self) -> &VarStore {
        &self.env.vars
    }

    pub fn vars_mut(&mut self) -> &mut VarStore {
        &mut self.env.vars
    }

    pub fn config(&self) -> &EngineConfig {
        &self.env.config
    }

    /// Captured output lines; empty when output goes to a writer.
    pub fn output(&self) -> &[String] {
        match &self.env.output {
            Output::Captured(lines) => lines,
            Output::Writer(_) => &[],
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.env.diagnostics.recorded()
    }

    pub fn diagnostic_count(&self, code: ErrorCode) -> usize {
        self.env.diagnostics.count(code)
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Execute an ASD script string.  Nothing runs if the script is
    /// structurally broken.
    pub fn run_script(&mut self, src: &str) -> Result<RunOutcome, EngineError> {
        let lines = load_lines(src);
        tracing::debug!(lines = lines.len(), "running script");
        let flow = validate(&lines)
            .and_then(|()| self.run_lines(&lines))
            .map_err(|e| self.structural(e))?;
        Ok(match flow {
            Flow::Exit => RunOutcome::Exited,
            Flow::Continue => RunOutcome::Completed,
        })
    }

    /// Read and execute a script file.
    pub fn run_file(&mut self, path: &Path) -> Result<RunOutcome, EngineError> {
        let src = std::fs::read_to_string(path).map_err(|source| EngineError::Read {
            path: path.to_owned(),
            source,
        })?;
        self.run_script(&src)
    }

    /// Walk `lines` with a cursor until the end or an `EXIT`.
    pub fn run_lines(&mut self, lines: &[Line]) -> Result<Flow, StructuralError> {
        let mut cursor = 0;
        while cursor < lines.len() {
            if let Some(flow) = self.try_control(lines, &mut cursor)? {
                if flow == Flow::Exit {
                    return Ok(Flow::Exit);
                }
                continue;
            }
            let line = &lines[cursor];
            cursor += 1;
            if self.dispatch(line) == Flow::Exit {
                return Ok(Flow::Exit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Offer one plain line to the handler library.
    pub fn dispatch(&mut self, line: &Line) -> Flow {
        if line.text.is_empty() {
            return Flow::Continue;
        }
        self.env.set_line(line.number);
        match self.handlers.dispatch(&line.text, &mut self.env) {
            Outcome::Handled => Flow::Continue,
            Outcome::Terminate => Flow::Exit,
            Outcome::NotHandled => {
                tracing::debug!(line = line.number, "no handler for `{}`", line.text);
                Flow::Continue
            }
        }
    }

    fn structural(&mut self, err: StructuralError) -> EngineError {
        let code = match err {
            StructuralError::UnterminatedBlock { .. } => ErrorCode::UnterminatedBlock,
            StructuralError::NestedConditional { .. } => ErrorCode::NestedConditional,
        };
        self.env
            .report(Diagnostic::new(code, err.line()).with_message(err.to_string()));
        EngineError::Structural(err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
