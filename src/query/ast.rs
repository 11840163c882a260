use std::time::Duration;

/// Parsed query. Only selectors exist today; new operators become new
/// variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Selector(Selector),
}

/// Selects every series whose `__name__` equals `name`.
///
/// Without a range only the most recent sample of each series is returned,
/// with one every sample newer than `now - range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub name: String,
    pub range: Option<Duration>,
}

impl Selector {
    pub fn instant(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: None,
        }
    }

    pub fn range(name: impl Into<String>, range: Duration) -> Self {
        Self {
            name: name.into(),
            range: Some(range),
        }
    }
}

impl From<Selector> for Expr {
    fn from(selector: Selector) -> Self {
        Expr::Selector(selector)
    }
}
