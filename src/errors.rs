use std::fmt;

use thiserror::Error;

/// The phase or rule that rejected a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed characters, strings, escapes or numbers.
    Lex,
    /// Grammar violations.
    Parse,
    /// Ill-typed comparisons or function arguments.
    Type,
    /// Integers outside the interoperable range, or negative zero where it is not allowed.
    Range,
    /// Unknown function names.
    Name,
    /// Broken engine invariants. Never expected for a compiled query.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lex => "syntax",
            ErrorKind::Parse => "parse",
            ErrorKind::Type => "type",
            ErrorKind::Range => "range",
            ErrorKind::Name => "name",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

// A single tagged error carrying the query it was raised for
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}{}", Location(.span, .query))]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub query: String,
    /// `(offset, length)` in characters from the start of `query`.
    pub span: Option<(usize, usize)>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>, query: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            query: query.to_owned(),
            span: None,
        }
    }

    pub fn at(mut self, offset: usize, length: usize) -> Self {
        self.span = Some((offset, length));
        self
    }

    pub fn offset(&self) -> Option<usize> {
        self.span.map(|(offset, _)| offset)
    }
}

struct Location<'e>(&'e Option<(usize, usize)>, &'e str);

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((offset, _)) => write!(f, " (at offset {offset} in `{}`)", self.1),
            None => write!(f, " (in `{}`)", self.1),
        }
    }
}

// Type alias for results that use `Error` as the error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_includes_offset_and_query() {
        let err = Error::new(ErrorKind::Parse, "unexpected token", "$.a]").at(3, 1);
        assert_eq!(
            err.to_string(),
            "parse error: unexpected token (at offset 3 in `$.a]`)"
        );
    }

    #[test]
    fn display_without_span() {
        let err = Error::new(ErrorKind::Name, "unknown function `foo`", "$[?foo(@)]");
        assert_eq!(err.to_string(), "name error: unknown function `foo` (in `$[?foo(@)]`)");
        assert_eq!(err.offset(), None);
    }
}
