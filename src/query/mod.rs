//! The query language: a single metric selector with an optional lookback
//! window, e.g. `up` or `up[5m]`.

pub mod ast;
pub mod error;
pub mod parser;
pub mod scanner;

pub use ast::{Expr, Selector};
pub use error::QueryError;
pub use parser::QueryParser;
pub use scanner::{QueryScanner, QueryToken, QueryTokenKind};

pub fn parse_query(text: &str) -> Result<Expr, QueryError> {
    let tokens = QueryScanner::new(text).scan();
    QueryParser::new(&tokens).parse()
}
