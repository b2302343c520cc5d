use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
    time::Instant,
};

use tracing::debug;
use zip::ZipArchive;

use crate::gtfs::{
    self, Config, TableSummary,
    models::{Agency, Calendar, Route, Stop, StopTime, Trip},
    table::{Row, read_table},
};

/// Number of table files a feed can contribute.
pub const TABLE_COUNT: usize = 6;

/// Side channel for coarse parse progress: `current` of `total` table files.
pub trait ProgressListener {
    fn on_progress(&mut self, current: usize, total: usize, message: &str);
}

impl<F> ProgressListener for F
where
    F: FnMut(usize, usize, &str),
{
    fn on_progress(&mut self, current: usize, total: usize, message: &str) {
        self(current, total, message)
    }
}

/// Discards progress.
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn on_progress(&mut self, _: usize, _: usize, _: &str) {}
}

/// Receives trips and stop times in fixed-size chunks during a streaming parse.
///
/// Returning an error stops the parse; the error is passed back to the caller
/// of [`GtfsParser::parse_streaming`].
pub trait BatchSink {
    /// Called once the four small tables are parsed, before the first trip batch.
    fn reference_tables(&mut self, _tables: &FeedTables) -> Result<(), gtfs::Error> {
        Ok(())
    }

    fn trips(&mut self, batch: Vec<Trip>) -> Result<(), gtfs::Error>;

    fn stop_times(&mut self, batch: Vec<StopTime>) -> Result<(), gtfs::Error>;
}

/// Records decoded from one feed. After a streaming parse `trips` and
/// `stop_times` are empty; their records went to the sink instead.
#[derive(Debug, Default, Clone)]
pub struct FeedTables {
    pub agencies: Vec<Agency>,
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendars: Vec<Calendar>,
    /// One entry per table file found in the archive, in the order it was read.
    pub summaries: Vec<TableSummary>,
}

impl FeedTables {
    pub fn summary(&self, file_name: &str) -> Option<&TableSummary> {
        self.summaries
            .iter()
            .find(|summary| summary.file_name == file_name)
    }
}

#[derive(Default)]
pub struct GtfsParser {
    config: Config,
}

impl GtfsParser {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parse_file<P, L>(&self, path: P, progress: &mut L) -> Result<FeedTables, gtfs::Error>
    where
        P: AsRef<Path>,
        L: ProgressListener,
    {
        let file = File::open(path)?;
        self.parse(BufReader::new(file), progress)
    }

    /// Decodes every known table into memory, in archive order.
    pub fn parse<R, L>(&self, reader: R, progress: &mut L) -> Result<FeedTables, gtfs::Error>
    where
        R: Read + Seek,
        L: ProgressListener,
    {
        let now = Instant::now();
        let mut archive = ZipArchive::new(reader)?;
        let mut tables = FeedTables::default();
        let mut processed = 0;
        let config = &self.config;

        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            let name = base_name(file.name()).to_string();
            let summary = match name.as_str() {
                val if val == config.agency_file_name => {
                    processed += 1;
                    progress.on_progress(processed, TABLE_COUNT, "Parsing agencies...");
                    collect(file, val, Agency::from_row, &mut tables.agencies)?
                }
                val if val == config.stops_file_name => {
                    processed += 1;
                    progress.on_progress(processed, TABLE_COUNT, "Parsing stops...");
                    collect(file, val, Stop::from_row, &mut tables.stops)?
                }
                val if val == config.routes_file_name => {
                    processed += 1;
                    progress.on_progress(processed, TABLE_COUNT, "Parsing routes...");
                    collect(file, val, Route::from_row, &mut tables.routes)?
                }
                val if val == config.trips_file_name => {
                    processed += 1;
                    progress.on_progress(processed, TABLE_COUNT, "Parsing trips...");
                    collect(file, val, Trip::from_row, &mut tables.trips)?
                }
                val if val == config.stop_times_file_name => {
                    processed += 1;
                    progress.on_progress(processed, TABLE_COUNT, "Parsing stop times...");
                    collect(file, val, StopTime::from_row, &mut tables.stop_times)?
                }
                val if val == config.calendar_file_name => {
                    processed += 1;
                    progress.on_progress(processed, TABLE_COUNT, "Parsing calendar...");
                    collect(file, val, Calendar::from_row, &mut tables.calendars)?
                }
                _ => {
                    debug!("Ignoring {name}");
                    continue;
                }
            };
            tables.summaries.push(summary);
        }

        debug!("Parsing feed took {:?}", now.elapsed());
        Ok(tables)
    }

    /// Decodes the feed in dependency order, keeping the four small tables in
    /// memory and flushing trips and stop times to `sink` every
    /// `config.batch_size` records.
    pub fn parse_streaming<R, S, L>(
        &self,
        reader: R,
        sink: &mut S,
        progress: &mut L,
    ) -> Result<FeedTables, gtfs::Error>
    where
        R: Read + Seek,
        S: BatchSink,
        L: ProgressListener,
    {
        let now = Instant::now();
        let mut archive = ZipArchive::new(reader)?;
        let mut tables = FeedTables::default();
        let mut processed = 0;
        let config = &self.config;
        let batch_size = config.batch_size.max(1);

        let small_tables = [
            (&config.agency_file_name, "Parsing agencies..."),
            (&config.stops_file_name, "Parsing stops..."),
            (&config.routes_file_name, "Parsing routes..."),
            (&config.calendar_file_name, "Parsing calendar..."),
        ];
        for (position, (file_name, message)) in small_tables.into_iter().enumerate() {
            let Some(index) = locate(&archive, file_name) else {
                debug!("{file_name} not present in feed");
                continue;
            };
            processed += 1;
            progress.on_progress(processed, TABLE_COUNT, message);
            let file = archive.by_index(index)?;
            let summary = match position {
                0 => collect(file, file_name, Agency::from_row, &mut tables.agencies)?,
                1 => collect(file, file_name, Stop::from_row, &mut tables.stops)?,
                2 => collect(file, file_name, Route::from_row, &mut tables.routes)?,
                _ => collect(file, file_name, Calendar::from_row, &mut tables.calendars)?,
            };
            tables.summaries.push(summary);
        }
        sink.reference_tables(&tables)?;

        if let Some(index) = locate(&archive, &config.trips_file_name) {
            processed += 1;
            progress.on_progress(processed, TABLE_COUNT, "Parsing trips...");
            let file = archive.by_index(index)?;
            let summary = stream(
                file,
                &config.trips_file_name,
                batch_size,
                Trip::from_row,
                |batch| sink.trips(batch),
            )?;
            tables.summaries.push(summary);
        }

        if let Some(index) = locate(&archive, &config.stop_times_file_name) {
            processed += 1;
            progress.on_progress(processed, TABLE_COUNT, "Parsing stop times...");
            let file = archive.by_index(index)?;
            let summary = stream(
                file,
                &config.stop_times_file_name,
                batch_size,
                StopTime::from_row,
                |batch| sink.stop_times(batch),
            )?;
            tables.summaries.push(summary);
        }

        debug!("Streaming feed took {:?}", now.elapsed());
        Ok(tables)
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn locate<R: Read + Seek>(archive: &ZipArchive<R>, file_name: &str) -> Option<usize> {
    (0..archive.len()).find(|i| {
        archive
            .name_for_index(*i)
            .is_some_and(|name| base_name(name) == file_name)
    })
}

fn collect<R, T>(
    reader: R,
    file_name: &str,
    build: fn(&Row) -> Option<T>,
    buf: &mut Vec<T>,
) -> Result<TableSummary, gtfs::Error>
where
    R: Read,
{
    let now = Instant::now();
    let summary = read_table(reader, file_name, build, |value| {
        buf.push(value);
        Ok(())
    })?;
    debug!(
        rows = summary.rows,
        "Loading {file_name} took {:?}",
        now.elapsed()
    );
    Ok(summary)
}

fn stream<R, T, F>(
    reader: R,
    file_name: &str,
    batch_size: usize,
    build: fn(&Row) -> Option<T>,
    mut flush: F,
) -> Result<TableSummary, gtfs::Error>
where
    R: Read,
    F: FnMut(Vec<T>) -> Result<(), gtfs::Error>,
{
    let now = Instant::now();
    let mut buffer: Vec<T> = Vec::with_capacity(batch_size);
    let mut batches = 0;
    let summary = read_table(reader, file_name, build, |value| {
        buffer.push(value);
        if buffer.len() >= batch_size {
            batches += 1;
            flush(std::mem::replace(&mut buffer, Vec::with_capacity(batch_size)))?;
        }
        Ok(())
    })?;
    if !buffer.is_empty() {
        batches += 1;
        flush(buffer)?;
    }
    debug!(
        rows = summary.rows,
        batches,
        "Streaming {file_name} took {:?}",
        now.elapsed()
    );
    Ok(summary)
}
