use crate::datamodel::{AggregatedLabel, AggregatedTimeseries, NAME_LABEL, SamplePoint};
use crate::query::Selector;
use crate::storage::StorageError;
use sqlx::SqliteConnection;
use std::collections::HashSet;

pub async fn select_series(
    connection: &mut SqliteConnection,
    selector: &Selector,
    now: i64,
) -> Result<Vec<AggregatedTimeseries>, StorageError> {
    let name_label_id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM labels WHERE name = ?
        "#,
    )
    .bind(NAME_LABEL)
    .fetch_optional(&mut *connection)
    .await?;

    // Nothing was ever stored
    let Some(name_label_id) = name_label_id else {
        return Ok(Vec::new());
    };

    let timeseries_ids: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT timeseries_id FROM timeseries_labels
        WHERE label_id = ? AND label_value = ?
        ORDER BY timeseries_id
        "#,
    )
    .bind(name_label_id)
    .bind(&selector.name)
    .fetch_all(&mut *connection)
    .await?;

    let mut result = Vec::with_capacity(timeseries_ids.len());
    for timeseries_id in timeseries_ids {
        let samples = select_samples(connection, timeseries_id, selector, now).await?;
        if samples.is_empty() {
            continue;
        }

        let (metric, labels) = select_labels(connection, timeseries_id).await?;
        result.push(AggregatedTimeseries {
            metric: metric.unwrap_or_else(|| selector.name.clone()),
            labels,
            samples,
        });
    }

    Ok(result)
}

/// Rebuilds the label set of a series. The join table holds one row-set per
/// stored sample, so labels are de-duplicated by name, first row wins.
///
/// A label name repeated within one sample (`m{a="1",a="2"}`) is stored
/// twice but comes back once, with its first value.
async fn select_labels(
    connection: &mut SqliteConnection,
    timeseries_id: i64,
) -> Result<(Option<String>, Vec<AggregatedLabel>), StorageError> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT l.name, tl.label_value
        FROM timeseries_labels tl
        JOIN labels l ON l.id = tl.label_id
        WHERE tl.timeseries_id = ?
        ORDER BY tl.rowid
        "#,
    )
    .bind(timeseries_id)
    .fetch_all(&mut *connection)
    .await?;

    let mut seen = HashSet::new();
    let mut metric = None;
    let mut labels = Vec::new();
    for (name, value) in rows {
        if !seen.insert(name.clone()) {
            continue;
        }
        if name == NAME_LABEL {
            metric = Some(value);
        } else {
            labels.push(AggregatedLabel { name, value });
        }
    }

    Ok((metric, labels))
}

async fn select_samples(
    connection: &mut SqliteConnection,
    timeseries_id: i64,
    selector: &Selector,
    now: i64,
) -> Result<Vec<SamplePoint>, StorageError> {
    // SQLite stores NaN as NULL
    let rows: Vec<(i64, Option<f64>)> = match selector.range {
        Some(range) => {
            let range = i64::try_from(range.as_secs()).unwrap_or(i64::MAX);
            sqlx::query_as(
                r#"
                SELECT timestamp, value FROM samples
                WHERE timeseries_id = ? AND timestamp >= ?
                ORDER BY timestamp
                "#,
            )
            .bind(timeseries_id)
            .bind(now.saturating_sub(range))
            .fetch_all(&mut *connection)
            .await?
        }
        None => {
            sqlx::query_as(
                r#"
                SELECT timestamp, value FROM samples
                WHERE timeseries_id = ?
                ORDER BY timestamp DESC
                LIMIT 1
                "#,
            )
            .bind(timeseries_id)
            .fetch_all(&mut *connection)
            .await?
        }
    };

    Ok(rows
        .into_iter()
        .map(|(timestamp, value)| SamplePoint {
            timestamp,
            value: value.unwrap_or(f64::NAN),
        })
        .collect())
}
