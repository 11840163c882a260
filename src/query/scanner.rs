use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryTokenKind {
    Name,
    LBracket,
    RBracket,
}

impl QueryTokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryTokenKind::Name => "name",
            QueryTokenKind::LBracket => "[",
            QueryTokenKind::RBracket => "]",
        }
    }
}

impl fmt::Display for QueryTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `offset` is the byte offset of the token in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryToken<'a> {
    pub kind: QueryTokenKind,
    pub text: &'a str,
    pub offset: usize,
}

pub struct QueryScanner<'a> {
    source: &'a str,
}

impl<'a> QueryScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    pub fn scan(self) -> Vec<QueryToken<'a>> {
        let mut tokens = Vec::new();
        let mut chars = self.source.char_indices().peekable();

        while let Some(&(offset, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }

            let kind = match c {
                '[' => QueryTokenKind::LBracket,
                ']' => QueryTokenKind::RBracket,
                _ => QueryTokenKind::Name,
            };

            if kind != QueryTokenKind::Name {
                chars.next();
                tokens.push(QueryToken {
                    kind,
                    text: "",
                    offset,
                });
                continue;
            }

            let mut end = self.source.len();
            while let Some(&(index, c)) = chars.peek() {
                if c.is_whitespace() || c == '[' || c == ']' {
                    end = index;
                    break;
                }
                chars.next();
            }
            tokens.push(QueryToken {
                kind,
                text: &self.source[offset..end],
                offset,
            });
        }

        tokens
    }
}
