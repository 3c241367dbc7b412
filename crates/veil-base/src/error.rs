//! Diagnostics: tagged errors with source location tracking.
//!
//! Every pass in the pipeline fails with a [`Diagnostic`] — a single error
//! `kind` (one of [`ErrorKind`]), a human-readable message, and the [`Span`]
//! where the problem was found. This is the common currency every crate in
//! the workspace returns, and `veil-pipeline` is the only place that chooses
//! what to do with one (report it and move to the next source unit).
//!
//! # Example
//!
//! ```
//! use veil_base::{Diagnostic, ErrorKind, Span, Result};
//!
//! fn parse_number(s: &str) -> Result<i32> {
//!     s.parse().map_err(|_| Diagnostic::new(
//!         ErrorKind::Syntax,
//!         format!("invalid number: '{}'", s),
//!         Span::new(0, s.len()),
//!     ))
//! }
//!
//! let err = parse_number("abc").unwrap_err();
//! assert!(err.to_string().contains("invalid number"));
//! ```

use crate::span::Span;
use std::fmt;

/// The tagged error kinds a pass can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised by the parser; carries a span (the parser itself is out of
    /// scope, but its errors are reported through this same channel).
    Syntax,
    /// Symbol resolution could not find a declaration for an identifier.
    UnknownIdentifier,
    /// The return checker found a path through a non-void function with
    /// no return statement.
    ReturnMissing,
    /// An assignment, call argument, or operator application had
    /// incompatible types or privacy labels.
    TypeMismatch,
    /// A type error that is not an assignability mismatch (e.g. a private
    /// operand reaching a non-homomorphic operator without `reveal`).
    TypeOther,
    /// A `require` condition was not `(bool, all)`.
    Require,
    /// A malformed `reveal` expression.
    Reclassify,
    /// A call to a function that is both `requires_verification_if_external`
    /// and recursive — the back-end cannot inline it.
    NonInlineableRecursion,
    /// The BSGS solver exhausted its search space.
    DlogNotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Syntax => "syntax",
            ErrorKind::UnknownIdentifier => "unknown-identifier",
            ErrorKind::ReturnMissing => "return-missing",
            ErrorKind::TypeMismatch => "type-mismatch",
            ErrorKind::TypeOther => "type-error",
            ErrorKind::Require => "require",
            ErrorKind::Reclassify => "reclassify",
            ErrorKind::NonInlineableRecursion => "non-inlineable-recursion",
            ErrorKind::DlogNotFound => "dlog-not-found",
        };
        f.write_str(s)
    }
}

/// An error annotated with its kind and source location.
///
/// Implements [`std::error::Error`] and [`fmt::Display`]. The display format
/// is the one-line form `{kind}: {message} at {start}..{end}`.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Which of the fixed error kinds this is.
    pub kind: ErrorKind,
    /// Human-readable error description.
    pub message: String,
    /// Location in source where the error occurred.
    pub span: Span,
}

impl Diagnostic {
    /// Creates a diagnostic with the given kind, message, and source location.
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}..{}",
            self.kind, self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for Diagnostic {}

/// Alias for `std::result::Result<T, Diagnostic>`.
///
/// Use this as the return type for fallible operations in veil.
pub type Result<T> = std::result::Result<T, Diagnostic>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_includes_kind_message_and_span() {
        let err = Diagnostic::new(ErrorKind::TypeMismatch, "test error", Span::new(5, 10));
        let display = format!("{}", err);
        assert!(display.contains("type-mismatch"));
        assert!(display.contains("test error"));
        assert!(display.contains("5..10"));
    }

    #[test]
    fn error_kind_display_is_stable() {
        assert_eq!(ErrorKind::DlogNotFound.to_string(), "dlog-not-found");
        assert_eq!(ErrorKind::NonInlineableRecursion.to_string(), "non-inlineable-recursion");
    }
}
