//! Structured diagnostics.
//!
//! Recoverable faults (a bad condition, division by zero, a missing file)
//! never stop a script.  They are reported here instead, with a category, a
//! code that selects the default message and tip, and the 1-based line the
//! fault was found on.  Only structural faults abort a run, and those are
//! reported through the same channel before the run returns.

use std::fmt;
use std::io::Write;

// ── Categories and codes ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Syntax,
    Runtime,
    Type,
    File,
    Variable,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCategory::Syntax => "Syntax Error",
            ErrorCategory::Runtime => "Runtime Error",
            ErrorCategory::Type => "Type Error",
            ErrorCategory::File => "File Error",
            ErrorCategory::Variable => "Variable Error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SyntaxInvalid,
    RuntimeDivisionZero,
    RuntimeException,
    TypeArrayString,
    FileNotFound,
    FileReadError,
    VariableUndefined,
    VariableWrongType,
    IterationLimit,
    UnterminatedBlock,
    NestedConditional,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::SyntaxInvalid => "syntax_invalid",
            ErrorCode::RuntimeDivisionZero => "runtime_division_zero",
            ErrorCode::RuntimeException => "runtime_exception",
            ErrorCode::TypeArrayString => "type_array_string",
            ErrorCode::FileNotFound => "file_not_found",
            ErrorCode::FileReadError => "file_read_error",
            ErrorCode::VariableUndefined => "variable_undefined",
            ErrorCode::VariableWrongType => "variable_wrong_type",
            ErrorCode::IterationLimit => "iteration_limit",
            ErrorCode::UnterminatedBlock => "unterminated_block",
            ErrorCode::NestedConditional => "nested_conditional",
        }
    }

    /// The category a code is reported under unless the caller overrides it.
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorCode::SyntaxInvalid
            | ErrorCode::UnterminatedBlock
            | ErrorCode::NestedConditional => ErrorCategory::Syntax,
            ErrorCode::RuntimeDivisionZero
            | ErrorCode::RuntimeException
            | ErrorCode::IterationLimit => ErrorCategory::Runtime,
            ErrorCode::TypeArrayString => ErrorCategory::Type,
            ErrorCode::FileNotFound | ErrorCode::FileReadError => ErrorCategory::File,
            ErrorCode::VariableUndefined | ErrorCode::VariableWrongType => {
                ErrorCategory::Variable
            }
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::SyntaxInvalid => "Invalid syntax in expression",
            ErrorCode::RuntimeDivisionZero => "Division by zero",
            ErrorCode::RuntimeException => "Runtime exception occurred",
            ErrorCode::TypeArrayString => "Array used where string expected",
            ErrorCode::FileNotFound => "File not found or not readable",
            ErrorCode::FileReadError => "Unable to read file",
            ErrorCode::VariableUndefined => "Undefined variable",
            ErrorCode::VariableWrongType => "Variable used with wrong type",
            ErrorCode::IterationLimit => "Loop iteration limit reached",
            ErrorCode::UnterminatedBlock => "Block is never closed",
            ErrorCode::NestedConditional => "IF nested directly inside another IF",
        }
    }

    pub fn tip(self) -> &'static str {
        match self {
            ErrorCode::SyntaxInvalid => "Verify your condition or expression follows ASD syntax rules",
            ErrorCode::RuntimeDivisionZero => "Check your DIV operation to ensure divisor is not zero",
            ErrorCode::RuntimeException => "Check your code for logical errors",
            ErrorCode::TypeArrayString => "Use individual array elements instead of the whole array",
            ErrorCode::FileNotFound => "Check file path and permissions",
            ErrorCode::FileReadError => "Verify file exists and is accessible",
            ErrorCode::VariableUndefined => "Initialize variable with SETVAR before use",
            ErrorCode::VariableWrongType => "Check variable content and expected type for operation",
            ErrorCode::IterationLimit => "Make sure the WHILE condition eventually becomes false",
            ErrorCode::UnterminatedBlock => "Close IF blocks with END and loop blocks with )",
            ErrorCode::NestedConditional => {
                "Move the inner IF into its own block or combine the conditions with AND"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Diagnostic ────────────────────────────────────────────────────────────────

/// One reported fault.  `line` is 0 when no script line applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub code: ErrorCode,
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, line: usize) -> Self {
        Diagnostic {
            category: code.category(),
            code,
            line,
            message: code.message().to_owned(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = category;
        self
    }

    pub fn tip(&self) -> &'static str {
        self.code.tip()
    }

    /// `ASD ERR!: <category>[ at line N]; <message>`, then the tip line and
    /// a blank line.
    pub fn render(&self, show_tips: bool) -> String {
        let mut out = format!("ASD ERR!: {}", self.category);
        if self.line > 0 {
            out.push_str(&format!(" at line {}", self.line));
        }
        out.push_str(&format!("; {}\n", self.message));
        if show_tips {
            out.push_str(&format!("💡 Tip: {}\n", self.tip()));
        }
        out.push('\n');
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)?;
        if self.line > 0 {
            write!(f, " at line {}", self.line)?;
        }
        Ok(())
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Destination for rendered diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diag: &Diagnostic);
}

/// Writes rendered diagnostics to standard error.
#[derive(Debug, Clone, Copy)]
pub struct StderrSink {
    pub show_tips: bool,
}

impl DiagnosticSink for StderrSink {
    fn report(&mut self, diag: &Diagnostic) {
        let mut err = std::io::stderr().lock();
        // Nothing sensible to do if stderr itself is gone.
        let _ = err.write_all(diag.render(self.show_tips).as_bytes());
    }
}

/// Collector owned by the interpreter.  Every diagnostic is recorded and
/// logged; it is also forwarded to the sink when one is installed.
#[derive(Default)]
pub struct Diagnostics {
    sink: Option<Box<dyn DiagnosticSink>>,
    recorded: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(sink: Option<Box<dyn DiagnosticSink>>) -> Self {
        Diagnostics {
            sink,
            recorded: Vec::new(),
        }
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn DiagnosticSink>>) {
        self.sink = sink;
    }

    pub fn report(&mut self, diag: Diagnostic) {
        tracing::warn!(code = diag.code.as_str(), line = diag.line, "{}", diag.message);
        if let Some(sink) = self.sink.as_mut() {
            sink.report(&diag);
        }
        self.recorded.push(diag);
    }

    pub fn recorded(&self) -> &[Diagnostic] {
        &self.recorded
    }

    pub fn count(&self, code: ErrorCode) -> usize {
        self.recorded.iter().filter(|d| d.code == code).count()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("has_sink", &self.sink.is_some())
            .field("recorded", &self.recorded)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn render_with_line_and_tip() {
        let d = Diagnostic::new(ErrorCode::RuntimeDivisionZero, 7);
        assert_eq!(
            d.render(true),
            "ASD ERR!: Runtime Error at line 7; Division by zero\n\
             💡 Tip: Check your DIV operation to ensure divisor is not zero\n\n"
        );
    }

    #[test]
    fn render_without_line_or_tip() {
        let d = Diagnostic::new(ErrorCode::FileNotFound, 0).with_message("missing.txt");
        assert_eq!(d.render(false), "ASD ERR!: File Error; missing.txt\n\n");
    }

    #[test]
    fn category_override() {
        let d = Diagnostic::new(ErrorCode::SyntaxInvalid, 1).with_category(ErrorCategory::Runtime);
        assert_eq!(d.category, ErrorCategory::Runtime);
        assert_eq!(d.tip(), ErrorCode::SyntaxInvalid.tip());
    }

    struct Shared(Rc<RefCell<Vec<ErrorCode>>>);

    impl DiagnosticSink for Shared {
        fn report(&mut self, diag: &Diagnostic) {
            self.0.borrow_mut().push(diag.code);
        }
    }

    #[test]
    fn records_and_forwards() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut diags = Diagnostics::new(Some(Box::new(Shared(Rc::clone(&seen)))));
        diags.report(Diagnostic::new(ErrorCode::IterationLimit, 3));
        diags.report(Diagnostic::new(ErrorCode::IterationLimit, 9));
        assert_eq!(diags.count(ErrorCode::IterationLimit), 2);
        assert_eq!(diags.recorded()[1].line, 9);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn records_without_sink() {
        let mut diags = Diagnostics::default();
        assert!(diags.is_empty());
        diags.report(Diagnostic::new(ErrorCode::VariableUndefined, 2));
        assert_eq!(diags.recorded().len(), 1);
    }
}
