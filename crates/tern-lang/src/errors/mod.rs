pub mod codes;

use crate::parser::ParseError;
use crate::syntax::Span;
use crate::types::{TypeError, TypeErrorKind};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use codes::ErrorCode;

/// A span label for multi-span diagnostics.
#[derive(Debug, Clone)]
pub struct SpanLabel {
    pub span: Span,
    pub label: String,
    pub is_primary: bool,
}

/// Unified diagnostic type for everything the front-end reports.
#[derive(Debug, Clone)]
pub struct TernDiagnostic {
    pub code: ErrorCode,
    pub message: String,
    pub labels: Vec<SpanLabel>,
}

impl TernDiagnostic {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            labels: Vec::new(),
        }
    }

    pub fn with_label(mut self, span: Span, label: impl Into<String>, primary: bool) -> Self {
        self.labels.push(SpanLabel {
            span,
            label: label.into(),
            is_primary: primary,
        });
        self
    }

    /// Primary span (first primary label, if any).
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.iter().find(|l| l.is_primary).map(|l| l.span)
    }
}

impl std::fmt::Display for TernDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Render a diagnostic to stderr using codespan-reporting.
pub fn report_diagnostic(filename: &str, source: &str, diag: &TernDiagnostic) {
    let mut files = SimpleFiles::new();
    let file_id = files.add(filename, source);

    let message = format!("[{}] {}", diag.code, diag.message);
    let labels: Vec<Label<usize>> = diag
        .labels
        .iter()
        .map(|l| {
            let label = if l.is_primary {
                Label::primary(file_id, l.span.start..l.span.end)
            } else {
                Label::secondary(file_id, l.span.start..l.span.end)
            };
            label.with_message(&l.label)
        })
        .collect();

    let diagnostic = if diag.code.is_warning() {
        Diagnostic::warning()
    } else {
        Diagnostic::error()
    }
    .with_message(message)
    .with_labels(labels);

    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    let _ = term::emit(&mut writer.lock(), &config, &files, &diagnostic);
}

// ── From conversions ─────────────────────────────────────────────

impl From<ParseError> for TernDiagnostic {
    fn from(e: ParseError) -> Self {
        let code = if e.message.contains("unexpected character") {
            ErrorCode::E0100
        } else if e.message.contains("unclosed") {
            ErrorCode::E0102
        } else {
            ErrorCode::E0101
        };
        TernDiagnostic::new(code, &e.message).with_label(e.span, &e.message, true)
    }
}

impl From<TypeError> for TernDiagnostic {
    fn from(e: TypeError) -> Self {
        let code = match e.kind {
            TypeErrorKind::Mismatch => ErrorCode::E0200,
            TypeErrorKind::Unbound => ErrorCode::E0201,
            TypeErrorKind::FnArity => ErrorCode::E0202,
            TypeErrorKind::Infinite => ErrorCode::E0203,
            TypeErrorKind::UnknownTyCon => ErrorCode::E0204,
            TypeErrorKind::TyConArity => ErrorCode::E0205,
            TypeErrorKind::BadForm => ErrorCode::E0206,
        };
        let mut diag = TernDiagnostic::new(code, &e.message);
        if let Some(span) = e.span {
            diag = diag.with_label(span, &e.message, true);
        }
        diag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_carries_the_code() {
        let diag = TernDiagnostic::new(ErrorCode::E0201, "unbound symbol 'foo'");
        let s = format!("{diag}");
        assert!(s.contains("[E0201]"));
        assert!(s.contains("unbound symbol 'foo'"));
    }

    #[test]
    fn primary_span_is_the_first_primary_label() {
        let diag = TernDiagnostic::new(ErrorCode::E0200, "mismatch")
            .with_label(Span::new(9, 12), "secondary", false)
            .with_label(Span::new(3, 7), "here", true);
        assert_eq!(diag.primary_span(), Some(Span::new(3, 7)));
    }

    #[test]
    fn parse_errors_map_by_message() {
        let diag: TernDiagnostic = ParseError {
            message: "unclosed (".to_string(),
            span: Span::new(0, 1),
        }
        .into();
        assert_eq!(diag.code, ErrorCode::E0102);
    }

    #[test]
    fn type_errors_map_by_kind() {
        let cases = [
            (TypeErrorKind::Mismatch, ErrorCode::E0200),
            (TypeErrorKind::Unbound, ErrorCode::E0201),
            (TypeErrorKind::FnArity, ErrorCode::E0202),
            (TypeErrorKind::Infinite, ErrorCode::E0203),
            (TypeErrorKind::UnknownTyCon, ErrorCode::E0204),
            (TypeErrorKind::TyConArity, ErrorCode::E0205),
            (TypeErrorKind::BadForm, ErrorCode::E0206),
        ];
        for (kind, code) in cases {
            let diag: TernDiagnostic = TypeError::new(kind, "msg").into();
            assert_eq!(diag.code, code);
        }
    }

    #[test]
    fn error_code_metadata() {
        assert_eq!(ErrorCode::E0203.title(), "infinite type");
        assert_eq!(ErrorCode::E0100.category(), "reader");
        assert_eq!(ErrorCode::E0204.category(), "type");
        assert!(ErrorCode::E0300.is_warning());
        assert!(!ErrorCode::E0200.is_warning());
        assert_eq!(ErrorCode::parse("e0201"), Some(ErrorCode::E0201));
        assert_eq!(ErrorCode::parse("E9999"), None);
    }

    #[test]
    fn rendering_does_not_panic() {
        let diag = TernDiagnostic::new(ErrorCode::E0200, "test error").with_label(
            Span::new(0, 3),
            "here",
            true,
        );
        report_diagnostic("test.tern", "(+ 1 2)", &diag);
    }
}
