use crate::storage::StorageError;
use sqlx::{Sqlite, Transaction};

pub async fn get_timeseries_id_or_create(
    transaction: &mut Transaction<'_, Sqlite>,
    hash: &str,
) -> Result<i64, StorageError> {
    let timeseries_id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM timeseries WHERE hash = ?
        "#,
    )
    .bind(hash)
    .fetch_optional(&mut **transaction)
    .await?;

    // If the timeseries exists, it's returned
    if let Some(timeseries_id) = timeseries_id {
        return Ok(timeseries_id);
    }

    let timeseries_id = sqlx::query(
        r#"
        INSERT INTO timeseries (hash)
        VALUES (?)
        "#,
    )
    .bind(hash)
    .execute(&mut **transaction)
    .await?
    .last_insert_rowid();

    Ok(timeseries_id)
}

pub async fn get_label_id_or_create(
    transaction: &mut Transaction<'_, Sqlite>,
    label_name: &str,
) -> Result<i64, StorageError> {
    let label_id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM labels WHERE name = ?
        "#,
    )
    .bind(label_name)
    .fetch_optional(&mut **transaction)
    .await?;

    // If the label name exists, it's returned
    if let Some(label_id) = label_id {
        return Ok(label_id);
    }

    let label_id = sqlx::query(
        r#"
        INSERT INTO labels (name)
        VALUES (?)
        "#,
    )
    .bind(label_name)
    .execute(&mut **transaction)
    .await?
    .last_insert_rowid();

    Ok(label_id)
}

/// Returns false when the series already has a sample at `timestamp`.
pub async fn insert_sample_row(
    transaction: &mut Transaction<'_, Sqlite>,
    timestamp: i64,
    timeseries_id: i64,
    value: f64,
) -> Result<bool, StorageError> {
    let result = sqlx::query(
        r#"
        INSERT INTO samples (timestamp, timeseries_id, value)
        VALUES (?, ?, ?)
        ON CONFLICT (timestamp, timeseries_id) DO NOTHING
        "#,
    )
    .bind(timestamp)
    .bind(timeseries_id)
    .bind(value)
    .execute(&mut **transaction)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn insert_timeseries_label(
    transaction: &mut Transaction<'_, Sqlite>,
    timeseries_id: i64,
    label_id: i64,
    label_value: &str,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO timeseries_labels (timeseries_id, label_id, label_value)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(timeseries_id)
    .bind(label_id)
    .bind(label_value)
    .execute(&mut **transaction)
    .await?;

    Ok(())
}
