use super::error::ParseError;
use super::token::{Token, TokenKind};
use crate::datamodel::{Label, Labels, Sample};

/// Recursive-descent parser over a flat token stream.
///
/// ```text
/// payload    := timeseries*
/// timeseries := NAME ('{' labelList '}')? NAME
/// labelList  := label (',' label)*
/// label      := NAME '=' QUOTE NAME? QUOTE
/// ```
pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    index: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens, index: 0 }
    }

    fn has_tokens(&self) -> bool {
        self.index < self.tokens.len()
    }

    fn peek(&self) -> Result<&'t Token<'a>, ParseError> {
        self.tokens
            .get(self.index)
            .ok_or(ParseError::UnexpectedEndOfStream)
    }

    fn next(&mut self) -> Result<&'t Token<'a>, ParseError> {
        let token = self.peek()?;
        self.index += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&'t Token<'a>, ParseError> {
        let token = self.next()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(kind.as_str(), token))
        }
    }

    fn label(&mut self) -> Result<Label, ParseError> {
        let name = self.expect(TokenKind::Name)?;
        self.expect(TokenKind::Equals)?;
        self.expect(TokenKind::Quote)?;

        let value = if self.peek()?.kind == TokenKind::Quote {
            ""
        } else {
            self.expect(TokenKind::Name)?.text
        };

        self.expect(TokenKind::Quote)?;
        Ok(Label::new(name.text, value))
    }

    fn label_list(&mut self, labels: &mut Labels) -> Result<(), ParseError> {
        loop {
            labels.push(self.label()?);

            let lookahead = self.peek()?;
            match lookahead.kind {
                TokenKind::Comma => self.index += 1,
                TokenKind::RBrace => return Ok(()),
                _ => return Err(unexpected("`,` or `}`", lookahead)),
            }
        }
    }

    fn timeseries(&mut self) -> Result<Sample, ParseError> {
        let name = self.expect(TokenKind::Name)?;

        let mut labels = Labels::new();
        labels.push(Label::metric_name(name.text));

        if self.peek()?.kind == TokenKind::LBrace {
            self.index += 1;
            self.label_list(&mut labels)?;
            self.expect(TokenKind::RBrace)?;
        }

        let value = self.expect(TokenKind::Name)?;
        Ok(Sample {
            labels,
            value: parse_value(value)?,
        })
    }

    /// Parses every remaining entry. The first error aborts the whole payload.
    pub fn parse(mut self) -> Result<Vec<Sample>, ParseError> {
        let mut samples = Vec::new();
        while self.has_tokens() {
            samples.push(self.timeseries()?);
        }
        Ok(samples)
    }
}

fn unexpected(expected: &'static str, token: &Token<'_>) -> ParseError {
    ParseError::UnexpectedToken {
        expected,
        found: token.kind,
        text: token.text.to_string(),
        line: token.line,
    }
}

fn parse_value(token: &Token<'_>) -> Result<f64, ParseError> {
    if token.text.is_empty() {
        return Ok(0.0);
    }
    token
        .text
        .parse::<f64>()
        .map_err(|source| ParseError::InvalidSampleValue {
            text: token.text.to_string(),
            line: token.line,
            source,
        })
}
