//! Error types shared by the lexer, the streaming decoder and the tree codec.
//!
//! Every failure is described by an [`ErrorKind`]. The streaming path wraps it
//! in a [`DecodeError`] carrying the byte offset of the offending event, and
//! the tree path wraps it in a [`TreeError`] carrying the [`Path`] of the
//! offending node.

use thiserror::Error;

use crate::{base64::Base64Error, path::Path, perfect_hash::PerfectHashError};

/// Coarse classification of an [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed JSON text.
    Lexical,
    /// The input has a different shape than the target type.
    TypeMismatch,
    /// Arity, missing or unknown members, unmatched alternatives.
    Structural,
    /// Malformed base64, non-finite floats, unparsable dates.
    Encoding,
    /// A `$ref` that cannot be resolved.
    Reference,
    /// A configured depth or memory bound was exceeded.
    ResourceExhaustion,
}

/// Malformed JSON text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A character that cannot start or continue a token.
    #[error("invalid character '{}'", .0.escape_debug())]
    InvalidCharacter(char),
    /// A backslash followed by a character JSON does not define.
    #[error("invalid escape sequence '\\{}'", .0.escape_debug())]
    InvalidEscape(char),
    /// A `\u` escape that is not a valid scalar value or surrogate pair.
    #[error("invalid unicode escape sequence \\u{0:04X}")]
    InvalidUnicodeEscape(u32),
    /// A raw control character inside a string.
    #[error("unescaped control character U+{0:04X} in string")]
    ControlCharacter(u32),
    /// The text ended inside a token or value.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    /// Non-whitespace after the root value.
    #[error("trailing characters after JSON value")]
    TrailingCharacters,
}

/// What went wrong, independent of where it went wrong.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ErrorKind {
    /// Malformed text.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// A value of the wrong JSON kind.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// What the target type accepts.
        expected: &'static str,
        /// What the input held.
        found: &'static str,
    },
    /// A number the target numeric type cannot hold.
    #[error("number {literal} is out of range for {target}")]
    NumberOutOfRange {
        /// The number as written.
        literal: String,
        /// Name of the target type.
        target: &'static str,
    },
    /// A number literal that does not parse.
    #[error("invalid number {0}")]
    InvalidNumber(String),

    /// A tuple array with the wrong number of elements.
    #[error("expected {expected} elements, found {found}")]
    ArityMismatch {
        /// Elements the tuple has.
        expected: usize,
        /// Elements the array had.
        found: usize,
    },
    /// A required member is absent.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    /// A member the type does not declare, under [`UnknownKeys::Reject`].
    ///
    /// [`UnknownKeys::Reject`]: crate::UnknownKeys::Reject
    #[error("unknown field '{0}'")]
    UnknownField(String),
    /// A set element or map key that occurs twice.
    #[error("duplicate element at index {0}")]
    DuplicateElement(usize),
    /// A string that names no variant of a string enum.
    #[error("unknown variant '{variant}' of {type_name}")]
    UnknownVariant {
        /// The string found.
        variant: String,
        /// Name of the enum.
        type_name: &'static str,
    },
    /// No alternative of a union accepts the value.
    #[error("no alternative of {0} matches")]
    NoMatchingAlternative(&'static str),
    /// An event after the root value completed.
    #[error("unexpected event after the root value")]
    TrailingEvent,
    /// The events ended before the root value completed.
    #[error("input ended before the value was complete")]
    Incomplete,

    /// Malformed base64 in a byte string.
    #[error("invalid base64: {0}")]
    Base64(#[from] Base64Error),
    /// NaN or an infinity, which JSON cannot express.
    #[error("cannot encode non-finite float {0}")]
    NonFiniteFloat(f64),
    /// A date or time string that does not parse.
    #[error("invalid {format} '{text}'")]
    InvalidDateTime {
        /// The expected format.
        format: &'static str,
        /// The string found.
        text: String,
    },

    /// A `$ref` whose target was not seen earlier in the document.
    #[error("unresolved reference '{0}'")]
    UnresolvedReference(String),
    /// A `$ref` whose target has another type.
    #[error("reference '{0}' points to a value of another type")]
    ReferenceTypeMismatch(String),

    /// Nesting deeper than the configured limit.
    #[error("nesting depth exceeds the limit of {0}")]
    DepthLimitExceeded(usize),
    /// Open frames larger than the configured byte budget.
    #[error("decoder frames exceed the limit of {0} bytes")]
    FrameMemoryExceeded(usize),

    /// A type's field names do not form a valid table.
    #[error("invalid field table: {0}")]
    FieldTable(#[from] PerfectHashError),
    /// A broken decoder invariant.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl ErrorKind {
    /// Returns the taxonomy bucket of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Syntax(_) => ErrorCategory::Lexical,
            Self::TypeMismatch { .. } | Self::NumberOutOfRange { .. } | Self::InvalidNumber(_) => {
                ErrorCategory::TypeMismatch
            }
            Self::ArityMismatch { .. }
            | Self::MissingField(_)
            | Self::UnknownField(_)
            | Self::DuplicateElement(_)
            | Self::UnknownVariant { .. }
            | Self::NoMatchingAlternative(_)
            | Self::TrailingEvent
            | Self::Incomplete
            | Self::FieldTable(_)
            | Self::Internal(_) => ErrorCategory::Structural,
            Self::Base64(_) | Self::NonFiniteFloat(_) | Self::InvalidDateTime { .. } => {
                ErrorCategory::Encoding
            }
            Self::UnresolvedReference(_) | Self::ReferenceTypeMismatch(_) => {
                ErrorCategory::Reference
            }
            Self::DepthLimitExceeded(_) | Self::FrameMemoryExceeded(_) => {
                ErrorCategory::ResourceExhaustion
            }
        }
    }
}

/// A failure on the streaming path, located by byte offset.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind} at offset {offset}")]
pub struct DecodeError {
    /// Byte offset of the event (or character) that caused the failure.
    pub offset: usize,
    /// What went wrong.
    pub kind: ErrorKind,
}

impl DecodeError {
    pub(crate) fn new(offset: usize, kind: impl Into<ErrorKind>) -> Self {
        Self {
            offset,
            kind: kind.into(),
        }
    }

    /// Shorthand for `self.kind.category()`.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

/// A failure on the tree path, located by node path.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind} at '{path}'")]
pub struct TreeError {
    /// Path of the node that caused the failure; empty for the root.
    pub path: Path,
    /// What went wrong.
    pub kind: ErrorKind,
}

impl TreeError {
    /// Shorthand for `self.kind.category()`.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn display_includes_location() {
        let err = DecodeError::new(21, SyntaxError::InvalidCharacter('['));
        assert_eq!(err.to_string(), "syntax error: invalid character '[' at offset 21");

        let err = TreeError {
            path: path!["list", 2],
            kind: ErrorKind::TypeMismatch {
                expected: "integer",
                found: "string",
            },
        };
        assert_eq!(err.to_string(), "expected integer, found string at '/list/2'");
    }

    #[test]
    fn categories() {
        assert_eq!(
            ErrorKind::DepthLimitExceeded(4).category(),
            ErrorCategory::ResourceExhaustion
        );
        assert_eq!(
            ErrorKind::UnresolvedReference("/a".into()).category(),
            ErrorCategory::Reference
        );
        assert_eq!(ErrorKind::NonFiniteFloat(f64::NAN).category(), ErrorCategory::Encoding);
        assert_eq!(
            ErrorKind::Syntax(SyntaxError::TrailingCharacters).category(),
            ErrorCategory::Lexical
        );
    }
}
