use super::scanner::QueryTokenKind;
use crate::parsing::DurationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("expected token but reached end of query")]
    UnexpectedEndOfStream,

    #[error("unexpected token, expected {expected} but got {found}:{text} at offset {offset}")]
    UnexpectedToken {
        expected: &'static str,
        found: QueryTokenKind,
        text: String,
        offset: usize,
    },

    #[error("invalid range: {0}")]
    InvalidDuration(#[from] DurationError),
}
