use smallvec::SmallVec;
use std::fmt;

/// Name of the synthetic label holding the metric name.
pub const NAME_LABEL: &str = "__name__";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn metric_name(value: impl Into<String>) -> Self {
        Self::new(NAME_LABEL, value)
    }

    pub fn is_metric_name(&self) -> bool {
        self.name == NAME_LABEL
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.name, self.value)
    }
}

/// Labels in parse order. Most series carry only a handful.
pub type Labels = SmallVec<[Label; 8]>;
