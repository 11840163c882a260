use super::token::TokenKind;
use std::num::ParseFloatError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    #[error("unexpected token, expected {expected} but got {found}:{text} in line {line}")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenKind,
        text: String,
        line: usize,
    },

    #[error("invalid sample value {text:?} in line {line}: {source}")]
    InvalidSampleValue {
        text: String,
        line: usize,
        #[source]
        source: ParseFloatError,
    },
}

impl ParseError {
    /// Source line of the offending token, when there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedEndOfStream => None,
            ParseError::UnexpectedToken { line, .. }
            | ParseError::InvalidSampleValue { line, .. } => Some(*line),
        }
    }
}
