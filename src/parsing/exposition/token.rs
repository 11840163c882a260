use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Metric names, label names, label values and sample values alike.
    /// The grammar decides what a name means.
    Name,
    LBrace,
    RBrace,
    Equals,
    Comma,
    Quote,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Name => "name",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Equals => "=",
            TokenKind::Comma => ",",
            TokenKind::Quote => "\"",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token borrowing its text from the scanned payload.
///
/// Structural tokens carry an empty `text`. `line` is the zero-based index of
/// the source line the token was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub line: usize,
}

impl<'a> Token<'a> {
    pub fn name(text: &'a str, line: usize) -> Self {
        Self {
            kind: TokenKind::Name,
            text,
            line,
        }
    }

    pub fn structural(kind: TokenKind, line: usize) -> Self {
        Self {
            kind,
            text: "",
            line,
        }
    }
}
