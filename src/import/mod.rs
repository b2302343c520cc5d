use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
    time::Instant,
};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

mod manager;
mod sink;
pub use manager::*;

use crate::{
    gtfs::{self, FeedTables, GtfsParser},
    repository::{FeedStats, Repository},
    store::{self, Store, Table},
};
use sink::{ChannelSink, Message};

/// Batches in flight between the parse worker and the writer.
const CHANNEL_CAPACITY: usize = 4;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Gtfs(#[from] gtfs::Error),
    #[error(transparent)]
    Store(#[from] store::Error),
    #[error("Import was cancelled")]
    Cancelled,
    #[error("Import worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportProgress {
    /// 0 to 100.
    pub percent: u8,
    pub message: String,
}

/// Forwards progress with a percent that never goes backwards. The parse
/// notifications for trips and stop times arrive after the reference tables
/// were written at a higher percent.
struct Reporter<F> {
    callback: F,
    percent: usize,
}

impl<F: FnMut(ImportProgress)> Reporter<F> {
    fn new(callback: F) -> Self {
        Self {
            callback,
            percent: 0,
        }
    }

    fn report(&mut self, percent: usize, message: impl Into<String>) {
        self.percent = self.percent.max(percent.min(100));
        (self.callback)(ImportProgress {
            percent: self.percent as u8,
            message: message.into(),
        });
    }
}

/// Outcome for one table file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: Table,
    pub file_name: String,
    /// `false` when the archive had no such file.
    pub present: bool,
    pub parsed: usize,
    pub skipped: usize,
    /// Rows written; parsed rows minus those whose parent was missing.
    pub stored: u64,
}

impl TableReport {
    /// Parsed rows that were not written because a referenced parent was
    /// missing from the store.
    pub fn orphaned(&self) -> u64 {
        (self.parsed as u64).saturating_sub(self.stored)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub tables: Vec<TableReport>,
    pub stats: FeedStats,
    pub elapsed_ms: u64,
}

impl ImportReport {
    pub fn table(&self, table: Table) -> Option<&TableReport> {
        self.tables.iter().find(|report| report.table == table)
    }
}

#[derive(Debug, Default)]
struct Stored {
    agencies: u64,
    stops: u64,
    routes: u64,
    trips: u64,
    stop_times: u64,
    calendars: u64,
}

impl Stored {
    fn get(&self, table: Table) -> u64 {
        match table {
            Table::Agencies => self.agencies,
            Table::Stops => self.stops,
            Table::Routes => self.routes,
            Table::Trips => self.trips,
            Table::StopTimes => self.stop_times,
            Table::Calendars => self.calendars,
        }
    }
}

/// Replaces the store's contents with one feed.
///
/// Sequence: clear, then a streaming parse on a blocking worker whose batches
/// are written as they arrive. Parents are written before children, so the
/// four small tables land before the first trip batch.
///
/// Progress percent by phase:
/// - clear: 0 to 5
/// - parse table `i` of `n`: 10 + i * 40 / n
/// - agencies, stops, routes, calendar written: 50, 52, 55, 58
/// - trips after `t` received: 60 + min(9, t / 1000)
/// - stop times after `s` received: 70 + min(29, s / 10000)
/// - done: 100
///
/// Batches committed before a failure stay committed.
#[derive(Debug, Clone)]
pub struct Importer {
    store: Store,
    config: gtfs::Config,
}

impl Importer {
    pub fn new(store: Store, config: gtfs::Config) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &gtfs::Config {
        &self.config
    }

    pub async fn run_file<P, F>(&self, path: P, progress: F) -> Result<ImportReport, Error>
    where
        P: AsRef<Path>,
        F: FnMut(ImportProgress) + Send,
    {
        let file = File::open(path).map_err(gtfs::Error::from)?;
        self.run(BufReader::new(file), progress).await
    }

    pub async fn run<R, F>(&self, source: R, progress: F) -> Result<ImportReport, Error>
    where
        R: Read + Seek + Send + 'static,
        F: FnMut(ImportProgress) + Send,
    {
        let now = Instant::now();
        let mut progress = Reporter::new(progress);
        info!("Starting import");

        progress.report(0, "Clearing existing data...");
        self.store.clear().await?;
        progress.report(5, "Parsing GTFS data...");

        let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
        let parser = GtfsParser::new(self.config.clone());
        let worker = tokio::task::spawn_blocking(move || {
            let mut sink = ChannelSink::new(tx.clone());
            let mut listener = move |current: usize, total: usize, message: &str| {
                // A closed channel surfaces through the sink on its next batch.
                let _ = tx.blocking_send(Message::Progress {
                    current,
                    total,
                    message: message.to_string(),
                });
            };
            parser.parse_streaming(source, &mut sink, &mut listener)
        });

        let mut stored = Stored::default();
        let mut trips_received = 0;
        let mut stop_times_received = 0;
        while let Some(message) = rx.recv().await {
            match message {
                Message::Progress {
                    current,
                    total,
                    message,
                } => {
                    let total = total.max(1);
                    progress.report(10 + current * 40 / total, message);
                }
                Message::ReferenceTables(tables) => {
                    self.insert_reference_tables(&tables, &mut stored, &mut progress)
                        .await?;
                }
                Message::Trips(batch) => {
                    trips_received += batch.len();
                    stored.trips += self.store.insert(&batch).await?;
                    progress.report(
                        60 + (trips_received / 1_000).min(9),
                        format!("Inserted {trips_received} trips..."),
                    );
                }
                Message::StopTimes(batch) => {
                    stop_times_received += batch.len();
                    stored.stop_times += self.store.insert(&batch).await?;
                    progress.report(
                        70 + (stop_times_received / 10_000).min(29),
                        format!("Inserted {stop_times_received} stop times..."),
                    );
                }
            }
        }

        let tables = match worker.await {
            Ok(result) => result?,
            Err(err) if err.is_cancelled() => return Err(Error::Cancelled),
            Err(err) => return Err(Error::Worker(err.to_string())),
        };

        let stats = Repository::new(self.store.clone()).statistics().await?;
        let report = ImportReport {
            tables: self.table_reports(&tables, &stored),
            stats,
            elapsed_ms: now.elapsed().as_millis() as u64,
        };
        let skipped: usize = report.tables.iter().map(|table| table.skipped).sum();
        if skipped > 0 {
            warn!(skipped, "Import dropped unreadable rows");
        }
        for table in report.tables.iter().filter(|table| table.orphaned() > 0) {
            warn!(
                table = %table.table,
                parsed = table.parsed,
                stored = table.stored,
                "Rows referencing a missing parent were not stored"
            );
        }
        progress.report(100, "Import complete");
        info!(
            stops = stats.stops,
            routes = stats.routes,
            trips = stats.trips,
            stop_times = stats.stop_times,
            "Import took {:?}",
            now.elapsed()
        );
        Ok(report)
    }

    async fn insert_reference_tables<F>(
        &self,
        tables: &FeedTables,
        stored: &mut Stored,
        progress: &mut Reporter<F>,
    ) -> Result<(), Error>
    where
        F: FnMut(ImportProgress) + Send,
    {
        progress.report(50, "Inserting agencies...");
        stored.agencies = self.store.insert(&tables.agencies).await?;
        progress.report(52, "Inserting stops...");
        stored.stops = self.store.insert(&tables.stops).await?;
        progress.report(55, "Inserting routes...");
        stored.routes = self.store.insert(&tables.routes).await?;
        progress.report(58, "Inserting calendar...");
        stored.calendars = self.store.insert(&tables.calendars).await?;
        debug!(
            agencies = stored.agencies,
            stops = stored.stops,
            routes = stored.routes,
            calendars = stored.calendars,
            "Inserted reference tables"
        );
        Ok(())
    }

    fn table_reports(&self, tables: &FeedTables, stored: &Stored) -> Vec<TableReport> {
        let config = &self.config;
        Table::ALL
            .iter()
            .map(|table| {
                let file_name = match table {
                    Table::Agencies => &config.agency_file_name,
                    Table::Stops => &config.stops_file_name,
                    Table::Routes => &config.routes_file_name,
                    Table::Trips => &config.trips_file_name,
                    Table::StopTimes => &config.stop_times_file_name,
                    Table::Calendars => &config.calendar_file_name,
                };
                let summary = tables.summary(file_name);
                TableReport {
                    table: *table,
                    file_name: file_name.clone(),
                    present: summary.is_some(),
                    parsed: summary.map_or(0, |s| s.rows),
                    skipped: summary.map_or(0, |s| s.skipped),
                    stored: stored.get(*table),
                }
            })
            .collect()
    }
}
