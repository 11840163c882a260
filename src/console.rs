//! Line evaluation for the interactive console.

use crate::query::parse_query;
use crate::storage::StorageHandle;
use std::fmt::Write;

pub const PROMPT: &str = "> ";

/// Evaluates one console line and returns what should be printed.
///
/// Blank lines return `None`. Errors are rendered as text.
pub async fn evaluate_line(line: &str, storage: &StorageHandle) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line == ".stats" {
        return Some(match storage.stats().await {
            Ok(stats) => format!(
                "timeseries: {}\nlabels: {}\nsamples: {}\ntimeseries_labels: {}",
                stats.timeseries, stats.labels, stats.samples, stats.timeseries_labels
            ),
            Err(e) => format!("[error] {e}"),
        });
    }

    let expr = match parse_query(line) {
        Ok(expr) => expr,
        Err(e) => return Some(format!("[error] {e}")),
    };

    Some(match storage.query(expr).await {
        Ok(series) if series.is_empty() => "no results".to_string(),
        Ok(series) => {
            let mut output = String::new();
            for (i, timeseries) in series.iter().enumerate() {
                if i > 0 {
                    output.push('\n');
                }
                let _ = write!(output, "{timeseries}");
            }
            output
        }
        Err(e) => format!("[error] {e}"),
    })
}
