//! Error types for xcanon

use std::fmt;
use thiserror::Error;

/// Position in source input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidToken,
    Expected { expected: String, found: String },
    UnterminatedMarkup,
    MismatchedTag { open: String, close: String },
    DuplicateAttribute { name: String },
    InvalidEntity { entity: String },
    InvalidUtf8,
    Io { path: String },
    ResponseCount { id: String, found: usize },
    DuplicateSubmitted { id: String },
    MissingRecordId { tag: String },
}

impl ErrorKind {
    /// True for violations of the complaint-record schema assumptions, as
    /// opposed to malformed XML or I/O failures.
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            Self::ResponseCount { .. } | Self::DuplicateSubmitted { .. } | Self::MissingRecordId { .. }
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "invalid token"),
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::UnterminatedMarkup => write!(f, "unterminated markup"),
            Self::MismatchedTag { open, close } => {
                write!(f, "mismatched closing tag: expected </{open}>, found </{close}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity { entity } => write!(f, "invalid xml entity: &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::Io { path } => write!(f, "failed to read {path}"),
            Self::ResponseCount { id, found } => {
                write!(
                    f,
                    "complaint {id}: expected exactly one response child, found {found}"
                )
            }
            Self::DuplicateSubmitted { id } => {
                write!(f, "complaint {id}: more than one submitted element")
            }
            Self::MissingRecordId { tag } => {
                write!(f, "record element <{tag}> has no id attribute")
            }
        }
    }
}

/// Main error type for xcanon
#[derive(Error, Clone, Debug, PartialEq)]
#[error("error at {}: {}", .span.start, .message)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, offset: usize, line: u32, col: u32) -> Self {
        let pos = Pos::new(offset, line, col);
        Self::new(kind, Span::new(pos, pos))
    }
}

/// Result type alias for xcanon
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "42:10:5");
    }

    #[test]
    fn test_error_creation() {
        let err = Error::at(ErrorKind::InvalidToken, 0, 1, 1);
        assert_eq!(err.kind(), &ErrorKind::InvalidToken);
    }

    #[test]
    fn test_error_display() {
        let err = Error::at(ErrorKind::UnterminatedMarkup, 10, 2, 5);
        let display = err.to_string();
        assert!(display.contains("error at"));
        assert!(display.contains("unterminated markup"));
    }

    #[test]
    fn test_schema_violation_classification() {
        let schema = ErrorKind::ResponseCount {
            id: "7".to_string(),
            found: 0,
        };
        assert!(schema.is_schema_violation());
        assert!(!ErrorKind::InvalidToken.is_schema_violation());
        assert!(!ErrorKind::InvalidUtf8.is_schema_violation());
    }

    #[test]
    fn test_schema_violation_display_names_the_record() {
        let err = Error::new(
            ErrorKind::DuplicateSubmitted {
                id: "42".to_string(),
            },
            Span::empty(),
        );
        assert!(err.to_string().contains("complaint 42"));
    }
}
