use std::fmt;
use std::net::AddrParseError;
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::request::RequestLineError;

/// Which field an [`ParseError::InvalidValue`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Host,
    Timestamp,
    Request,
    Status,
    Bytes,
    ResponseTime,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Host => "IP",
            Field::Timestamp => "timestamp",
            Field::Request => "request line",
            Field::Status => "status",
            Field::Bytes => "bytes",
            Field::ResponseTime => "response time",
        })
    }
}

/// Conversion failure wrapped by [`ParseError::InvalidValue`].
#[derive(Debug, Clone, Error)]
pub enum ValueError {
    #[error(transparent)]
    Addr(#[from] AddrParseError),
    #[error(transparent)]
    Time(#[from] chrono::ParseError),
    #[error(transparent)]
    Int(#[from] ParseIntError),
    #[error(transparent)]
    Float(#[from] ParseFloatError),
    #[error(transparent)]
    Request(#[from] RequestLineError),
}

/// One error per failed line; the parse aborts on the first of these and
/// never returns a partial entry.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// Expected a literal token but the input held a different code point.
    #[error("{column}: expected {expected:?} but got {found:?}")]
    MalformedField {
        expected: char,
        found: char,
        column: usize,
    },

    /// Expected a literal token but the input was exhausted.
    #[error("expected {expected:?} but got end of input")]
    UnexpectedEof { expected: char },

    /// The delimiter terminating a field never appears in the remaining text.
    #[error("{rest:?}: cannot find separator {separator:?} in line: {line:?}")]
    MissingSeparator {
        rest: String,
        separator: String,
        line: String,
    },

    /// A field's text does not convert to its target type.
    #[error("cannot parse {field} {value:?}: {source}")]
    InvalidValue {
        field: Field,
        value: String,
        source: ValueError,
    },
}
