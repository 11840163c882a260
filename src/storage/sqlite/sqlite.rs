use super::queries::select_series;
use super::sqlite_utilities::*;
use crate::datamodel::{AggregatedTimeseries, Sample};
use crate::query::Expr;
use crate::storage::{StorageError, StorageInstance, StorageStats, WriteOutcome, timeseries_hash};
use async_trait::async_trait;
use clru::CLruCache;
use smallvec::SmallVec;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct SqliteSettings {
    pub busy_timeout: Duration,
    /// Capacity of each of the writer's id caches.
    pub id_cache_size: NonZeroUsize,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            id_cache_size: NonZeroUsize::new(4096).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

// SQLite implementation
pub struct SqliteStorage {
    pool: SqlitePool,
    // Only filled after a commit, so a rolled back id never leaks in.
    timeseries_ids: CLruCache<String, i64>,
    label_ids: CLruCache<String, i64>,
}

impl fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("pool", &self.pool)
            .field("cached_timeseries_ids", &self.timeseries_ids.len())
            .field("cached_label_ids", &self.label_ids.len())
            .finish()
    }
}

impl SqliteStorage {
    /// Opens (or creates) a database file.
    pub async fn open(
        path: impl AsRef<Path>,
        settings: SqliteSettings,
    ) -> Result<Self, StorageError> {
        let connect_options = SqliteConnectOptions::new()
            .filename(path)
            // The Wal mode lets readers of the file work next to the writer
            .journal_mode(SqliteJournalMode::Wal);

        Self::connect_with(connect_options, settings).await
    }

    /// Connects from a `sqlite:` connection string, e.g. `sqlite::memory:`.
    pub async fn connect(
        connection_string: &str,
        settings: SqliteSettings,
    ) -> Result<Self, StorageError> {
        let connect_options = SqliteConnectOptions::from_str(connection_string)?;
        Self::connect_with(connect_options, settings).await
    }

    pub async fn in_memory() -> Result<Self, StorageError> {
        Self::connect("sqlite::memory:", SqliteSettings::default()).await
    }

    async fn connect_with(
        connect_options: SqliteConnectOptions,
        settings: SqliteSettings,
    ) -> Result<Self, StorageError> {
        let connect_options = connect_options
            // Create the database file if it doesn't exist
            .create_if_missing(true)
            // Foreign keys are not used by the schema
            .foreign_keys(false)
            .busy_timeout(settings.busy_timeout);

        // A single connection, held for the whole lifetime of the storage:
        // there is exactly one writer, and in-memory databases live as long
        // as their connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;

        Ok(Self {
            pool,
            timeseries_ids: CLruCache::new(settings.id_cache_size),
            label_ids: CLruCache::new(settings.id_cache_size),
        })
    }

    async fn timeseries_id(
        &mut self,
        transaction: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        hash: &str,
    ) -> Result<i64, StorageError> {
        match self.timeseries_ids.get(hash) {
            Some(timeseries_id) => Ok(*timeseries_id),
            None => get_timeseries_id_or_create(transaction, hash).await,
        }
    }

    async fn label_id(
        &mut self,
        transaction: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        label_name: &str,
    ) -> Result<i64, StorageError> {
        match self.label_ids.get(label_name) {
            Some(label_id) => Ok(*label_id),
            None => get_label_id_or_create(transaction, label_name).await,
        }
    }
}

#[async_trait]
impl StorageInstance for SqliteStorage {
    async fn create_or_migrate(&mut self) -> Result<(), StorageError> {
        sqlx::migrate!("src/storage/sqlite/migrations")
            .run(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_sample(
        &mut self,
        sample: &Sample,
        timestamp: i64,
    ) -> Result<WriteOutcome, StorageError> {
        let hash = timeseries_hash(&sample.labels);

        let mut transaction = self.pool.begin().await?;

        let timeseries_id = self.timeseries_id(&mut transaction, &hash).await?;

        let mut label_ids: SmallVec<[i64; 8]> = SmallVec::with_capacity(sample.labels.len());
        for label in sample.labels.iter() {
            label_ids.push(self.label_id(&mut transaction, &label.name).await?);
        }

        let inserted =
            insert_sample_row(&mut transaction, timestamp, timeseries_id, sample.value).await?;

        // The label rows follow every new sample row, not only the first one
        if inserted {
            for (label, label_id) in sample.labels.iter().zip(label_ids.iter()) {
                insert_timeseries_label(&mut transaction, timeseries_id, *label_id, &label.value)
                    .await?;
            }
        }

        transaction.commit().await?;

        self.timeseries_ids.put(hash, timeseries_id);
        for (label, label_id) in sample.labels.iter().zip(label_ids) {
            self.label_ids.put(label.name.clone(), label_id);
        }

        if inserted {
            Ok(WriteOutcome::Inserted)
        } else {
            debug!(timeseries_id, timestamp, "Series already has a sample at this second");
            Ok(WriteOutcome::Duplicate)
        }
    }

    async fn evaluate(
        &mut self,
        expr: &Expr,
        now: i64,
    ) -> Result<Vec<AggregatedTimeseries>, StorageError> {
        let mut connection = self.pool.acquire().await?;
        match expr {
            Expr::Selector(selector) => select_series(&mut connection, selector, now).await,
        }
    }

    async fn stats(&mut self) -> Result<StorageStats, StorageError> {
        let mut connection = self.pool.acquire().await?;
        let (timeseries, labels, samples, timeseries_labels): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM timeseries),
                    (SELECT COUNT(*) FROM labels),
                    (SELECT COUNT(*) FROM samples),
                    (SELECT COUNT(*) FROM timeseries_labels)
                "#,
            )
            .fetch_one(&mut *connection)
            .await?;

        Ok(StorageStats {
            timeseries,
            labels,
            samples,
            timeseries_labels,
        })
    }

    async fn close(&mut self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::{AggregatedLabel, SamplePoint};
    use crate::query::Selector;
    use std::time::Duration;

    async fn storage() -> SqliteStorage {
        let mut storage = SqliteStorage::in_memory().await.unwrap();
        storage.create_or_migrate().await.unwrap();
        storage
    }

    fn memory_usage(pod: &str, value: f64) -> Sample {
        Sample::new("memory_usage", value)
            .with_label("pod", pod)
            .with_label("namespace", "n")
    }

    #[tokio::test]
    async fn test_create_or_migrate_is_idempotent() {
        let mut storage = storage().await;
        storage.create_or_migrate().await.unwrap();
        assert_eq!(storage.stats().await.unwrap(), StorageStats::default());
    }

    #[tokio::test]
    async fn test_insert_sample() {
        let mut storage = storage().await;

        let outcome = storage
            .insert_sample(&memory_usage("a", 512.0), 1000)
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Inserted);

        assert_eq!(
            storage.stats().await.unwrap(),
            StorageStats {
                timeseries: 1,
                labels: 3,
                samples: 1,
                timeseries_labels: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_one_sample_per_series_per_second() {
        let mut storage = storage().await;

        let first = storage
            .insert_sample(&memory_usage("a", 1.0), 1000)
            .await
            .unwrap();
        let second = storage
            .insert_sample(&memory_usage("a", 2.0), 1000)
            .await
            .unwrap();
        assert_eq!(first, WriteOutcome::Inserted);
        assert_eq!(second, WriteOutcome::Duplicate);

        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.samples, 1);
        // A dropped sample writes no label rows
        assert_eq!(stats.timeseries_labels, 3);

        // The first value wins
        let result = storage
            .evaluate(&Selector::instant("memory_usage").into(), 1000)
            .await
            .unwrap();
        assert_eq!(result[0].value(), Some(1.0));
    }

    #[tokio::test]
    async fn test_label_rows_accumulate_per_accepted_sample() {
        let mut storage = storage().await;
        for timestamp in 1000..1003 {
            storage
                .insert_sample(&memory_usage("a", 1.0), timestamp)
                .await
                .unwrap();
        }

        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.timeseries, 1);
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.timeseries_labels, 9);
        assert_eq!(stats.labels, 3);
    }

    #[tokio::test]
    async fn test_distinct_label_sets_are_distinct_series() {
        let mut storage = storage().await;
        storage
            .insert_sample(&memory_usage("a", 512.0), 1000)
            .await
            .unwrap();
        storage
            .insert_sample(&memory_usage("b", 512.0), 1000)
            .await
            .unwrap();

        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.timeseries, 2);
        assert_eq!(stats.samples, 2);
        // Names are shared, values are not normalized
        assert_eq!(stats.labels, 3);
    }

    #[tokio::test]
    async fn test_reordered_labels_are_a_different_series() {
        let mut storage = storage().await;
        let ordered = Sample::new("up", 1.0)
            .with_label("pod", "a")
            .with_label("namespace", "n");
        let reordered = Sample::new("up", 1.0)
            .with_label("namespace", "n")
            .with_label("pod", "a");

        storage.insert_sample(&ordered, 1000).await.unwrap();
        storage.insert_sample(&reordered, 1000).await.unwrap();

        assert_eq!(storage.stats().await.unwrap().timeseries, 2);
    }

    #[tokio::test]
    async fn test_instant_query_returns_latest_sample() {
        let mut storage = storage().await;
        storage
            .insert_sample(&memory_usage("a", 1.0), 1000)
            .await
            .unwrap();
        storage
            .insert_sample(&memory_usage("a", 3.0), 1002)
            .await
            .unwrap();
        storage
            .insert_sample(&memory_usage("a", 2.0), 1001)
            .await
            .unwrap();
        storage
            .insert_sample(&Sample::new("up", 1.0), 1002)
            .await
            .unwrap();

        let result = storage
            .evaluate(&Selector::instant("memory_usage").into(), 2000)
            .await
            .unwrap();

        assert_eq!(
            result,
            vec![AggregatedTimeseries {
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
                samples: vec![SamplePoint {
                    timestamp: 1002,
                    value: 3.0,
                }],
            }]
        );
    }

    #[tokio::test]
    async fn test_range_query_restricts_to_window() {
        let mut storage = storage().await;
        for (timestamp, value) in [(1000, 1.0), (1100, 2.0), (1200, 3.0), (1300, 4.0)] {
            storage
                .insert_sample(&memory_usage("a", value), timestamp)
                .await
                .unwrap();
        }

        let result = storage
            .evaluate(
                &Selector::range("memory_usage", Duration::from_secs(200)).into(),
                1300,
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        let values: Vec<f64> = result[0].samples.iter().map(|point| point.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
    }

    #[tokio::test]
    async fn test_range_query_omits_series_outside_window() {
        let mut storage = storage().await;
        storage
            .insert_sample(&memory_usage("old", 1.0), 1000)
            .await
            .unwrap();
        storage
            .insert_sample(&memory_usage("new", 2.0), 1290)
            .await
            .unwrap();

        let result = storage
            .evaluate(
                &Selector::range("memory_usage", Duration::from_secs(60)).into(),
                1300,
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].labels[0].value, "new");
    }

    #[tokio::test]
    async fn test_query_on_empty_database() {
        let mut storage = storage().await;
        let result = storage
            .evaluate(&Selector::instant("up").into(), 1000)
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_query_unknown_metric() {
        let mut storage = storage().await;
        storage
            .insert_sample(&Sample::new("up", 1.0), 1000)
            .await
            .unwrap();
        let result = storage
            .evaluate(&Selector::instant("down").into(), 1000)
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_nan_round_trips_through_null() {
        let mut storage = storage().await;
        storage
            .insert_sample(&Sample::new("ratio", f64::NAN), 1000)
            .await
            .unwrap();
        let result = storage
            .evaluate(&Selector::instant("ratio").into(), 1000)
            .await
            .unwrap();
        assert!(result[0].value().unwrap().is_nan());
    }

    #[tokio::test]
    async fn test_empty_label_value_is_stored() {
        let mut storage = storage().await;
        storage
            .insert_sample(&Sample::new("up", 1.0).with_label("pod", ""), 1000)
            .await
            .unwrap();
        let result = storage
            .evaluate(&Selector::instant("up").into(), 1000)
            .await
            .unwrap();
        assert_eq!(
            result[0].labels,
            vec![AggregatedLabel {
                name: "pod".to_string(),
                value: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn test_repeated_label_name_comes_back_once() {
        let mut storage = storage().await;
        let sample = Sample::new("m", 1.0)
            .with_label("a", "1")
            .with_label("a", "2");
        storage.insert_sample(&sample, 1000).await.unwrap();

        // Both rows are stored
        assert_eq!(storage.stats().await.unwrap().timeseries_labels, 3);

        let result = storage
            .evaluate(&Selector::instant("m").into(), 1000)
            .await
            .unwrap();
        assert_eq!(
            result[0].labels,
            vec![AggregatedLabel {
                name: "a".to_string(),
                value: "1".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_reopen_file_keeps_data() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("metrics.db");

        {
            let mut storage = SqliteStorage::open(&path, SqliteSettings::default())
                .await
                .unwrap();
            storage.create_or_migrate().await.unwrap();
            storage
                .insert_sample(&memory_usage("a", 1.0), 1000)
                .await
                .unwrap();
            storage.close().await;
        }

        let mut storage = SqliteStorage::open(&path, SqliteSettings::default())
            .await
            .unwrap();
        storage.create_or_migrate().await.unwrap();
        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.samples, 1);

        // Ids resolved from the file match the ones written before
        storage
            .insert_sample(&memory_usage("a", 2.0), 1001)
            .await
            .unwrap();
        assert_eq!(storage.stats().await.unwrap().timeseries, 1);
    }
}
