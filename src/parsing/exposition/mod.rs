//! Line-oriented text exposition format, as served by scrape targets.
//!
//! ```text
//! # comments and blank lines are ignored
//! memory_usage{pod="a",namespace="n"} 512.0
//! up 1
//! ```

pub mod error;
pub mod parser;
pub mod scanner;
pub mod token;

pub use error::ParseError;
pub use parser::Parser;
pub use scanner::Scanner;
pub use token::{Token, TokenKind};

use crate::datamodel::Sample;

/// Scans and parses a whole scrape payload.
///
/// Any error rejects the entire payload; there is no partial acceptance.
pub fn parse_exposition(text: &str) -> Result<Vec<Sample>, ParseError> {
    let tokens = Scanner::new(text).scan();
    Parser::new(&tokens).parse()
}
