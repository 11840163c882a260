use super::label::{Label, Labels};

/// One observed value, as produced by the exposition parser.
///
/// The first label is always the synthetic `__name__` label, followed by the
/// payload's labels in the order they appeared on the wire. That order is
/// significant: the storage identity hash is computed over it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Labels,
    pub value: f64,
}

impl Sample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        let mut labels = Labels::new();
        labels.push(Label::metric_name(name));
        Self { labels, value }
    }

    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push(Label::new(name, value));
        self
    }

    /// The metric name, read back from the `__name__` label.
    pub fn name(&self) -> Option<&str> {
        self.labels
            .iter()
            .find(|label| label.is_metric_name())
            .map(|label| label.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_prepends_name_label() {
        let sample = Sample::new("memory_usage", 512.0)
            .with_label("pod", "a")
            .with_label("namespace", "n");

        assert_eq!(sample.name(), Some("memory_usage"));
        assert_eq!(sample.labels.len(), 3);
        assert_eq!(sample.labels[0], Label::metric_name("memory_usage"));
        assert_eq!(sample.labels[1], Label::new("pod", "a"));
        assert_eq!(sample.labels[2], Label::new("namespace", "n"));
        assert_eq!(sample.value, 512.0);
    }

    #[test]
    fn test_name_missing() {
        let sample = Sample {
            labels: Labels::new(),
            value: 1.0,
        };
        assert_eq!(sample.name(), None);
    }
}
