//! Deffix error handling.
//!
//! Every failure in the crate is a [`DeffixError`]: a classified [`ErrorKind`]
//! plus optional source location and diagnostic hints, rendered through
//! `miette`. Errors raised while parsing carry a labeled span; errors raised by
//! the [`Context`](crate::Context) API have no source until the pipeline
//! attaches the span of the top-level form that triggered them.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::ast::Span;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Named source text used for labeled diagnostics.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// ERROR KINDS
// ============================================================================

/// All error types as a clean enum.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    // Parse errors
    #[error("Parse error: malformed {construct}")]
    MalformedConstruct { construct: String },
    #[error("Parse error: invalid {literal_type} '{value}'")]
    InvalidLiteral { literal_type: String, value: String },
    #[error("Parse error: missing {element}")]
    MissingElement { element: String },

    // Registration errors
    #[error("Registration error: operands are defined in name/value pairs, got {count} arguments")]
    OddArity { count: usize },
    #[error("Registration error: operand name must be a symbol, found {found}")]
    InvalidOperandName { found: String },
    #[error("Registration error: invalid '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },

    // Rewrite errors
    #[error("Internal error: list-nest index {index} is invalid for a list of length {len}")]
    MalformedListNestIndex { index: usize, len: usize },
    #[error("Runtime error: recursion limit of {limit} exceeded")]
    RecursionLimit { limit: usize },

    // Runtime errors
    #[error("Runtime error: undefined symbol '{symbol}'")]
    UndefinedSymbol { symbol: String },
    #[error("Runtime error: '{found}' is not callable")]
    NotCallable { found: String },
    #[error("Type error: '{operation}' expected {expected}, got {actual}")]
    TypeMismatch {
        operation: String,
        expected: String,
        actual: String,
    },
    #[error("Runtime error: '{operation}' expected {expected} arguments, got {actual}")]
    ArityMismatch {
        operation: String,
        expected: String,
        actual: usize,
    },
    #[error("Runtime error: division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Registration,
    Rewrite,
    Runtime,
}

impl ErrorCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Parse => "parse",
            ErrorCategory::Registration => "registration",
            ErrorCategory::Rewrite => "rewrite",
            ErrorCategory::Runtime => "runtime",
        }
    }
}

impl ErrorKind {
    /// Get the error category for test assertions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedConstruct { .. }
            | Self::InvalidLiteral { .. }
            | Self::MissingElement { .. } => ErrorCategory::Parse,

            Self::OddArity { .. }
            | Self::InvalidOperandName { .. }
            | Self::InvalidDirective { .. } => ErrorCategory::Registration,

            Self::MalformedListNestIndex { .. } | Self::RecursionLimit { .. } => {
                ErrorCategory::Rewrite
            }

            Self::UndefinedSymbol { .. }
            | Self::NotCallable { .. }
            | Self::TypeMismatch { .. }
            | Self::ArityMismatch { .. }
            | Self::DivisionByZero => ErrorCategory::Runtime,
        }
    }

    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::MalformedConstruct { .. } => "malformed_construct",
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::MissingElement { .. } => "missing_element",
            Self::OddArity { .. } => "odd_arity",
            Self::InvalidOperandName { .. } => "invalid_operand_name",
            Self::InvalidDirective { .. } => "invalid_directive",
            Self::MalformedListNestIndex { .. } => "malformed_list_nest_index",
            Self::RecursionLimit { .. } => "recursion_limit",
            Self::UndefinedSymbol { .. } => "undefined_symbol",
            Self::NotCallable { .. } => "not_callable",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::DivisionByZero => "division_by_zero",
        }
    }

    fn default_help(&self) -> Option<String> {
        match self {
            Self::OddArity { .. } => {
                Some("write operands as alternating names and values: (defoperand x 1 y 2)".into())
            }
            Self::MalformedListNestIndex { .. } => Some(
                "a precedence entry matched the first or last element of the list; \
                 make sure precedence entries are only used as infix operators"
                    .into(),
            ),
            Self::NotCallable { .. } => Some(
                "register the symbol with (register-operator ...) or define it with (defoperator ...)"
                    .into(),
            ),
            _ => None,
        }
    }

    fn primary_label(&self) -> &'static str {
        match self {
            Self::MalformedConstruct { .. } => "malformed syntax",
            Self::InvalidLiteral { .. } => "invalid literal",
            Self::MissingElement { .. } => "missing here",
            Self::OddArity { .. } => "unpaired operand",
            Self::InvalidOperandName { .. } => "invalid operand name",
            Self::InvalidDirective { .. } => "invalid directive",
            Self::MalformedListNestIndex { .. } => "while normalizing this form",
            Self::RecursionLimit { .. } => "recursion limit exceeded",
            Self::UndefinedSymbol { .. } => "undefined symbol",
            Self::NotCallable { .. } => "not callable",
            Self::TypeMismatch { .. } => "type mismatch",
            Self::ArityMismatch { .. } => "arity mismatch",
            Self::DivisionByZero => "division by zero",
        }
    }
}

// ============================================================================
// ERROR TYPE
// ============================================================================

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

/// The single error type of the crate.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct DeffixError {
    /// What went wrong
    pub kind: ErrorKind,
    /// Where it happened, when known
    pub source_info: Option<SourceInfo>,
    /// How to help
    pub diagnostic_info: DiagnosticInfo,
}

impl DeffixError {
    /// Creates an unlocated error with the default code and help for its kind.
    pub fn new(kind: ErrorKind) -> Self {
        let error_code = format!("deffix::{}::{}", kind.category().as_str(), kind.code_suffix());
        let help = kind.default_help();
        Self {
            kind,
            source_info: None,
            diagnostic_info: DiagnosticInfo { help, error_code },
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic_info.help = Some(help.into());
        self
    }

    /// Attaches a source location unless the error already has one.
    pub fn with_source(mut self, source: &SourceContext, span: Span) -> Self {
        if self.source_info.is_none() {
            self.source_info = Some(SourceInfo {
                source: source.to_named_source(),
                primary_span: to_source_span(span),
            });
        }
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

impl Diagnostic for DeffixError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let info = self.source_info.as_ref()?;
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.kind.primary_label().to_string()),
            info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_info
            .as_ref()
            .map(|info| &*info.source as &dyn miette::SourceCode)
    }
}

// ============================================================================
// ERROR CONSTRUCTION
// ============================================================================

/// Context-aware error creation for code that knows where it is in a source.
pub trait ErrorReporting {
    fn report(&self, kind: ErrorKind, span: Span) -> DeffixError;

    fn missing_element(&self, element: &str, span: Span) -> DeffixError {
        self.report(
            ErrorKind::MissingElement {
                element: element.into(),
            },
            span,
        )
    }

    fn invalid_literal(&self, literal_type: &str, value: &str, span: Span) -> DeffixError {
        self.report(
            ErrorKind::InvalidLiteral {
                literal_type: literal_type.into(),
                value: value.into(),
            },
            span,
        )
    }

    fn malformed(&self, construct: &str, span: Span) -> DeffixError {
        self.report(
            ErrorKind::MalformedConstruct {
                construct: construct.into(),
            },
            span,
        )
    }
}

impl ErrorReporting for SourceContext {
    fn report(&self, kind: ErrorKind, span: Span) -> DeffixError {
        DeffixError::new(kind).with_source(self, span)
    }
}

/// Converts an AST span to a miette SourceSpan.
pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.start..span.end)
}

/// Prints a DeffixError with full miette diagnostics.
pub fn print_error(error: DeffixError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    #[test]
    fn error_code_includes_category_and_kind() {
        let err = DeffixError::new(ErrorKind::OddArity { count: 3 });
        assert_eq!(err.diagnostic_info.error_code, "deffix::registration::odd_arity");
        assert_eq!(err.category(), ErrorCategory::Registration);
    }

    #[test]
    fn located_error_renders_label_and_help() {
        let source = SourceContext::from_file("test.dfx", "(defoperand x 1 y)");
        let err = source.report(ErrorKind::OddArity { count: 3 }, Span { start: 0, end: 18 });
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("name/value pairs"));
        assert!(output.contains("unpaired operand"));
        assert!(output.contains("test.dfx"));
    }

    #[test]
    fn with_source_keeps_the_first_location() {
        let first = SourceContext::from_file("first", "abc");
        let second = SourceContext::from_file("second", "xyz");
        let err = DeffixError::new(ErrorKind::DivisionByZero)
            .with_source(&first, Span { start: 0, end: 1 })
            .with_source(&second, Span { start: 1, end: 2 });
        let info = err.source_info.expect("located");
        assert_eq!(info.source.name(), "first");
    }

    #[test]
    fn unlocated_error_has_no_labels() {
        let err = DeffixError::new(ErrorKind::UndefinedSymbol {
            symbol: "y".into(),
        });
        assert!(err.labels().is_none());
        assert_eq!(err.to_string(), "Runtime error: undefined symbol 'y'");
    }
}
