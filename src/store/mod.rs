use std::{fmt::Display, path::PathBuf, str::FromStr, time::Instant};

use serde::Serialize;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

mod schema;
mod upsert;
pub use upsert::Record;

pub const DEFAULT_WRITE_BATCH_SIZE: usize = 10_000;
const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Store is closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Agencies,
    Stops,
    Routes,
    Trips,
    StopTimes,
    Calendars,
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Agencies,
        Table::Stops,
        Table::Routes,
        Table::Trips,
        Table::StopTimes,
        Table::Calendars,
    ];

    /// Children before parents.
    pub const CLEAR_ORDER: [Table; 6] = [
        Table::StopTimes,
        Table::Trips,
        Table::Routes,
        Table::Stops,
        Table::Calendars,
        Table::Agencies,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Table::Agencies => "agencies",
            Table::Stops => "stops",
            Table::Routes => "routes",
            Table::Trips => "trips",
            Table::StopTimes => "stop_times",
            Table::Calendars => "calendar",
        }
    }

    /// Tables whose rows a delete on `self` can reach through cascades,
    /// including `self`.
    pub const fn cascade(&self) -> &'static [Table] {
        match self {
            Table::Agencies => &[
                Table::Agencies,
                Table::Routes,
                Table::Trips,
                Table::StopTimes,
            ],
            Table::Routes => &[Table::Routes, Table::Trips, Table::StopTimes],
            Table::Trips => &[Table::Trips, Table::StopTimes],
            Table::Stops => &[Table::Stops, Table::StopTimes],
            Table::StopTimes => &[Table::StopTimes],
            Table::Calendars => &[Table::Calendars],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: Location,
    pub max_connections: u32,
    /// Rows written per transaction.
    pub write_batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: Location::File("transito.db".into()),
            max_connections: 4,
            write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            ..Default::default()
        }
    }

    /// A private database that lives as long as the store. Uses a single
    /// connection since every in-memory connection is its own database.
    pub fn memory() -> Self {
        Self {
            location: Location::Memory,
            max_connections: 1,
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_write_batch_size(mut self, write_batch_size: usize) -> Self {
        self.write_batch_size = write_batch_size.max(1);
        self
    }
}

/// Durable storage for the six feed tables.
///
/// Cloning is cheap; clones share the pool and the change channel. Every
/// committed write publishes the affected [`Table`]s to subscribers.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    changes: broadcast::Sender<Table>,
    write_batch_size: usize,
}

impl Store {
    pub async fn open(config: StoreConfig) -> Result<Self, Error> {
        let options = match &config.location {
            Location::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
            Location::Memory => SqliteConnectOptions::from_str("sqlite::memory:")?,
        }
        .foreign_keys(true);

        let max_connections = match config.location {
            Location::Memory => 1,
            Location::File(_) => config.max_connections.max(1),
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        for statement in schema::PRAGMAS.iter().chain(schema::SCHEMA) {
            sqlx::query(statement).execute(&pool).await?;
        }
        debug!(location = ?config.location, "Opened store");

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            pool,
            changes,
            write_batch_size: config.write_batch_size.max(1),
        })
    }

    pub async fn open_in_memory() -> Result<Self, Error> {
        Self::open(StoreConfig::memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Change events, one per table per committed write.
    pub fn subscribe(&self) -> broadcast::Receiver<Table> {
        self.changes.subscribe()
    }

    fn notify(&self, tables: &[Table]) {
        for table in tables {
            // No receivers is fine.
            let _ = self.changes.send(*table);
        }
    }

    /// Upserts `records`, one transaction per `write_batch_size` rows.
    /// Returns the number of rows written; child rows whose parent is absent
    /// are not written.
    pub async fn insert<T: Record>(&self, records: &[T]) -> Result<u64, Error> {
        let now = Instant::now();
        let mut written = 0;
        for chunk in records.chunks(self.write_batch_size) {
            let mut tx = self.pool.begin().await?;
            for record in chunk {
                written += record.upsert().execute(&mut *tx).await?.rows_affected();
            }
            tx.commit().await?;
            self.notify(&[T::TABLE]);
        }
        debug!(
            table = T::TABLE.name(),
            received = records.len(),
            written,
            "Inserting took {:?}",
            now.elapsed()
        );
        Ok(written)
    }

    /// Deletes every row of `table` and, through cascades, their dependents.
    pub async fn delete_all(&self, table: Table) -> Result<u64, Error> {
        let statement = format!("DELETE FROM {}", table.name());
        let deleted = sqlx::query(&statement)
            .execute(&self.pool)
            .await?
            .rows_affected();
        self.notify(table.cascade());
        Ok(deleted)
    }

    /// Empties the store in [`Table::CLEAR_ORDER`] within one transaction.
    pub async fn clear(&self) -> Result<(), Error> {
        let now = Instant::now();
        let mut tx = self.pool.begin().await?;
        for table in Table::CLEAR_ORDER {
            let statement = format!("DELETE FROM {}", table.name());
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        self.notify(&Table::CLEAR_ORDER);
        debug!("Clearing store took {:?}", now.elapsed());
        Ok(())
    }

    pub async fn count(&self, table: Table) -> Result<i64, Error> {
        let statement = format!("SELECT COUNT(*) FROM {}", table.name());
        let count = sqlx::query_scalar::<_, i64>(&statement)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
