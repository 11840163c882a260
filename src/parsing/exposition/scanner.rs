use super::token::{Token, TokenKind};

/// Tokenizer for exposition payloads.
///
/// Scanning never fails: malformed structure is left for the parser to
/// report. Lines starting with `#` and blank lines produce no tokens, and
/// whitespace outside quotes only separates tokens. Quoted label values are
/// read verbatim up to the next quote on the same line, with no escape
/// handling.
pub struct Scanner<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
}

fn is_structural(c: char) -> bool {
    matches!(c, '{' | '}' | '=' | ',' | '"')
}

fn structural_kind(c: char) -> Option<TokenKind> {
    match c {
        '{' => Some(TokenKind::LBrace),
        '}' => Some(TokenKind::RBrace),
        '=' => Some(TokenKind::Equals),
        ',' => Some(TokenKind::Comma),
        '"' => Some(TokenKind::Quote),
        _ => None,
    }
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
        }
    }

    pub fn scan(mut self) -> Vec<Token<'a>> {
        for (line_number, line) in self.source.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            self.scan_line(trimmed, line_number);
        }
        self.tokens
    }

    fn scan_line(&mut self, line: &'a str, line_number: usize) {
        let mut rest = line;

        while let Some(c) = rest.chars().next() {
            if c.is_whitespace() {
                rest = &rest[c.len_utf8()..];
                continue;
            }

            match structural_kind(c) {
                Some(TokenKind::Quote) => {
                    rest = self.quoted(&rest[1..], line_number);
                }
                Some(kind) => {
                    self.tokens.push(Token::structural(kind, line_number));
                    rest = &rest[1..];
                }
                None => {
                    let end = rest
                        .find(|c: char| c.is_whitespace() || is_structural(c))
                        .unwrap_or(rest.len());
                    self.tokens.push(Token::name(&rest[..end], line_number));
                    rest = &rest[end..];
                }
            }
        }
    }

    /// Emits the opening quote, the value (if any) and the closing quote
    /// (if present), and returns what follows it.
    fn quoted(&mut self, rest: &'a str, line_number: usize) -> &'a str {
        self.tokens
            .push(Token::structural(TokenKind::Quote, line_number));

        match rest.find('"') {
            Some(end) => {
                if end > 0 {
                    self.tokens.push(Token::name(&rest[..end], line_number));
                }
                self.tokens
                    .push(Token::structural(TokenKind::Quote, line_number));
                &rest[end + 1..]
            }
            None => {
                // Unterminated, the parser will complain.
                if !rest.is_empty() {
                    self.tokens.push(Token::name(rest, line_number));
                }
                ""
            }
        }
    }
}
