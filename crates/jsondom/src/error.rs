//! Error types: an exhaustive [`ErrorKind`], a source [`Location`], and the
//! [`Error`] carried by every fallible operation in the crate.

use std::fmt;

/// Position in the source text where a parse error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based).
    pub column: usize,
    /// Byte offset from the start of the input (0-based).
    pub offset: usize,
}

impl Location {
    /// Compute the location of `offset` within `input` by scanning the
    /// prefix. Only runs on the error path.
    pub(crate) fn of_offset(input: &[u8], offset: usize) -> Location {
        let offset = offset.min(input.len());
        let mut line = 1;
        let mut column = 1;
        for &b in &input[..offset] {
            if b == b'\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Location {
            line,
            column,
            offset,
        }
    }
}

/// Classification of every error the crate can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Parse errors
    UnexpectedEndOfInput,
    UnexpectedCharacter,
    InvalidEscape,
    InvalidUnicodeEscape,
    InvalidNumber,
    UnterminatedString,
    UnterminatedArray,
    UnterminatedObject,
    TrailingContent,
    MaxDepthExceeded,
    InvalidLiteral,
    DuplicateKey,
    InvalidUtf8,
    InvalidComment,
    // Value access errors
    TypeMismatch,
    OutOfRange,
    KeyNotFound,
    IntegerOverflow,
    /// Reserved for strict serialization of non-finite floats. The DOM
    /// serializer and the incremental writer both emit `null` for NaN and
    /// Infinity unless `allow_nan_inf` is set, so this kind is not produced
    /// by the default configuration.
    NanOrInfinity,
}

impl ErrorKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnexpectedEndOfInput => "unexpected end of input",
            ErrorKind::UnexpectedCharacter => "unexpected character",
            ErrorKind::InvalidEscape => "invalid escape sequence",
            ErrorKind::InvalidUnicodeEscape => "invalid unicode escape",
            ErrorKind::InvalidNumber => "invalid number",
            ErrorKind::UnterminatedString => "unterminated string",
            ErrorKind::UnterminatedArray => "unterminated array",
            ErrorKind::UnterminatedObject => "unterminated object",
            ErrorKind::TrailingContent => "trailing content after JSON",
            ErrorKind::MaxDepthExceeded => "maximum nesting depth exceeded",
            ErrorKind::InvalidLiteral => "invalid literal",
            ErrorKind::DuplicateKey => "duplicate key",
            ErrorKind::InvalidUtf8 => "invalid UTF-8 encoding",
            ErrorKind::InvalidComment => "invalid comment",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::OutOfRange => "index out of range",
            ErrorKind::KeyNotFound => "key not found",
            ErrorKind::IntegerOverflow => "integer overflow",
            ErrorKind::NanOrInfinity => "NaN or Infinity not representable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error produced while parsing, accessing, or writing JSON.
///
/// Parse errors carry a [`Location`]; value access and writer errors do not.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    location: Option<Location>,
    message: Box<str>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<Box<str>>) -> Error {
        Error {
            kind,
            location: None,
            message: message.into(),
        }
    }

    pub(crate) fn at(kind: ErrorKind, message: impl Into<Box<str>>, location: Location) -> Error {
        Error {
            kind,
            location: Some(location),
            message: message.into(),
        }
    }

    /// The error classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Where the error occurred in the input, for parse errors.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// The human-readable message, without the location prefix.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "JSON parse error at line {}, column {}: {}",
                loc.line, loc.column, self.message
            ),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
