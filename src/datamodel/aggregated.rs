use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedLabel {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    /// Unix timestamp, in seconds.
    pub timestamp: i64,
    pub value: f64,
}

/// Query result for one matched series: its reconstructed labels and the
/// selected sample rows.
///
/// An instant selector yields exactly one point (the most recent), a range
/// selector yields every point inside the window in ascending time order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTimeseries {
    pub metric: String,
    /// Labels other than `__name__`, in first-seen order.
    pub labels: Vec<AggregatedLabel>,
    pub samples: Vec<SamplePoint>,
}

impl AggregatedTimeseries {
    /// The most recent selected value.
    pub fn value(&self) -> Option<f64> {
        self.samples.last().map(|point| point.value)
    }

    fn write_series_name(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.metric)?;
        if self.labels.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (index, label) in self.labels.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}=\"{}\"", label.name, label.value)?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for AggregatedTimeseries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, point) in self.samples.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            self.write_series_name(f)?;
            write!(f, " {} @{}", point.value, point.timestamp)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> AggregatedTimeseries {
        AggregatedTimeseries {
            metric: "memory_usage".to_string(),
            labels: vec![
                AggregatedLabel {
                    name: "pod".to_string(),
                    value: "a".to_string(),
                },
                AggregatedLabel {
                    name: "namespace".to_string(),
                    value: "n".to_string(),
                },
            ],
            samples: vec![
                SamplePoint {
                    timestamp: 100,
                    value: 1.5,
                },
                SamplePoint {
                    timestamp: 101,
                    value: 512.0,
                },
            ],
        }
    }

    #[test]
    fn test_value_is_latest() {
        assert_eq!(series().value(), Some(512.0));

        let mut empty = series();
        empty.samples.clear();
        assert_eq!(empty.value(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            series().to_string(),
            "memory_usage{pod=\"a\",namespace=\"n\"} 1.5 @100\nmemory_usage{pod=\"a\",namespace=\"n\"} 512 @101"
        );

        let bare = AggregatedTimeseries {
            metric: "up".to_string(),
            labels: vec![],
            samples: vec![SamplePoint {
                timestamp: 7,
                value: 1.0,
            }],
        };
        assert_eq!(bare.to_string(), "up 1 @7");
    }
}
