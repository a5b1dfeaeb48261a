use super::code::ErrorCode;
use crate::span::Span;

/// Severity level of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A diagnostic message with location and context.
///
/// Compile-time problems are reported as diagnostics and collected; a
/// script with any error-severity diagnostic is not installed as runnable.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    severity: Severity,
    code: ErrorCode,
    message: String,
    line: u32,
    span: Span,
    label: Option<String>,
    notes: Vec<String>,
}

impl Diagnostic {
    /// Start building an error diagnostic.
    pub fn error(code: ErrorCode, line: u32) -> DiagnosticBuilder {
        DiagnosticBuilder::new(Severity::Error, code, line)
    }

    /// Start building a warning diagnostic.
    pub fn warning(code: ErrorCode, line: u32) -> DiagnosticBuilder {
        DiagnosticBuilder::new(Severity::Warning, code, line)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}] line {}: {}",
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
            },
            self.code.as_str(),
            self.line,
            self.message
        )
    }
}

/// Builder for constructing diagnostics.
pub struct DiagnosticBuilder {
    severity: Severity,
    code: ErrorCode,
    line: u32,
    span: Span,
    message: Option<String>,
    label: Option<String>,
    notes: Vec<String>,
}

impl DiagnosticBuilder {
    fn new(severity: Severity, code: ErrorCode, line: u32) -> Self {
        Self {
            severity,
            code,
            line,
            span: Span::DUMMY,
            message: None,
            label: None,
            notes: Vec::new(),
        }
    }

    /// Set the main message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the source span.
    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Set the primary label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Build the diagnostic.
    pub fn build(self) -> Diagnostic {
        Diagnostic {
            severity: self.severity,
            code: self.code,
            message: self.message.unwrap_or_else(|| self.code.message()),
            line: self.line,
            span: self.span,
            label: self.label,
            notes: self.notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_basic() {
        let diag = Diagnostic::error(ErrorCode::E100, 12)
            .message("custom message")
            .build();

        assert_eq!(diag.severity(), Severity::Error);
        assert!(diag.is_error());
        assert_eq!(diag.code(), ErrorCode::E100);
        assert_eq!(diag.message(), "custom message");
        assert_eq!(diag.line(), 12);
    }

    #[test]
    fn builder_default_message() {
        let diag = Diagnostic::error(ErrorCode::E001, 1).build();
        assert_eq!(diag.message(), "unrecognized character");
    }

    #[test]
    fn builder_with_label_and_notes() {
        let diag = Diagnostic::error(ErrorCode::E200, 3)
            .label("first declared here")
            .note("rename one of the declarations")
            .build();

        assert_eq!(diag.label(), Some("first declared here"));
        assert_eq!(diag.notes().len(), 1);
    }

    #[test]
    fn warning_severity() {
        let diag = Diagnostic::warning(ErrorCode::E100, 1).build();
        assert_eq!(diag.severity(), Severity::Warning);
        assert!(!diag.is_error());
    }

    #[test]
    fn display_form() {
        let diag = Diagnostic::error(ErrorCode::E002, 7).build();
        assert_eq!(
            diag.to_string(),
            "error[E002] line 7: unterminated string"
        );
    }
}
