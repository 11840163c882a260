use super::ast::{Expr, Selector};
use super::error::QueryError;
use super::scanner::{QueryToken, QueryTokenKind};
use crate::parsing::parse_duration;

/// ```text
/// selector := NAME ('[' NAME ']')?
/// ```
pub struct QueryParser<'t, 'a> {
    tokens: &'t [QueryToken<'a>],
    index: usize,
}

impl<'t, 'a> QueryParser<'t, 'a> {
    pub fn new(tokens: &'t [QueryToken<'a>]) -> Self {
        Self { tokens, index: 0 }
    }

    fn peek(&self) -> Option<&'t QueryToken<'a>> {
        self.tokens.get(self.index)
    }

    fn expect(&mut self, kind: QueryTokenKind) -> Result<&'t QueryToken<'a>, QueryError> {
        let token = self.peek().ok_or(QueryError::UnexpectedEndOfStream)?;
        if token.kind != kind {
            return Err(unexpected(kind.as_str(), token));
        }
        self.index += 1;
        Ok(token)
    }

    fn selector(&mut self) -> Result<Selector, QueryError> {
        let name = self.expect(QueryTokenKind::Name)?;
        let mut selector = Selector::instant(name.text);

        if self.peek().is_some() {
            self.expect(QueryTokenKind::LBracket)?;
            let range = self.expect(QueryTokenKind::Name)?;
            self.expect(QueryTokenKind::RBracket)?;
            let range = parse_duration(range.text)?;
            // A zero window is the same as no window
            selector.range = (!range.is_zero()).then_some(range);
        }

        Ok(selector)
    }

    /// Parses exactly one selector; anything after it is an error.
    pub fn parse(mut self) -> Result<Expr, QueryError> {
        let selector = self.selector()?;
        if let Some(token) = self.peek() {
            return Err(unexpected("end of query", token));
        }
        Ok(Expr::Selector(selector))
    }
}

fn unexpected(expected: &'static str, token: &QueryToken<'_>) -> QueryError {
    QueryError::UnexpectedToken {
        expected,
        found: token.kind,
        text: token.text.to_string(),
        offset: token.offset,
    }
}
