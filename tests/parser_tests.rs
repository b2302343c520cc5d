mod common;

use std::io::Cursor;

use common::*;
use transito::{
    gtfs::{self, NoProgress},
    prelude::*,
};

#[derive(Default)]
struct RecordingSink {
    calls: Vec<&'static str>,
    trip_batches: Vec<usize>,
    stop_time_batches: Vec<usize>,
}

impl BatchSink for RecordingSink {
    fn reference_tables(&mut self, tables: &FeedTables) -> Result<(), gtfs::Error> {
        assert!(tables.trips.is_empty());
        self.calls.push("reference");
        Ok(())
    }

    fn trips(&mut self, batch: Vec<Trip>) -> Result<(), gtfs::Error> {
        self.calls.push("trips");
        self.trip_batches.push(batch.len());
        Ok(())
    }

    fn stop_times(&mut self, batch: Vec<StopTime>) -> Result<(), gtfs::Error> {
        self.calls.push("stop_times");
        self.stop_time_batches.push(batch.len());
        Ok(())
    }
}

#[test]
fn parse_whole_feed_test() {
    let tables = GtfsParser::default()
        .parse(Cursor::new(sample_feed()), &mut NoProgress)
        .unwrap();

    assert_eq!(tables.agencies.len(), 1);
    assert_eq!(tables.stops.len(), 4);
    assert_eq!(tables.routes.len(), 2);
    assert_eq!(tables.trips.len(), 3);
    assert_eq!(tables.stop_times.len(), 7);
    assert_eq!(tables.calendars.len(), 2);
    assert_eq!(tables.summaries.len(), 6);

    let stop = &tables.stops[1];
    assert_eq!(stop.stop_id, "S2");
    assert_eq!(stop.name, "Place de l'École");
    assert_eq!(stop.code, None);

    let route = &tables.routes[1];
    assert_eq!(route.short_name.as_deref(), Some("T3"));
    assert_eq!(route.route_type, 0);

    let calendar = &tables.calendars[0];
    assert!(calendar.monday && calendar.friday);
    assert!(!calendar.saturday && !calendar.sunday);
    assert_eq!(calendar.start_date, "20240101");

    assert_eq!(tables.stop_times[6].arrival_time, "25:10:00");
}

#[test]
fn parse_reports_progress_per_table_test() {
    let mut events = Vec::new();
    let mut listener = |current: usize, total: usize, message: &str| {
        events.push((current, total, message.to_string()));
    };
    GtfsParser::default()
        .parse(Cursor::new(sample_feed()), &mut listener)
        .unwrap();

    assert_eq!(events.len(), 6);
    for (i, (current, total, _)) in events.iter().enumerate() {
        assert_eq!(*current, i + 1);
        assert_eq!(*total, 6);
    }
    // Archive order: stop_times.txt is the first entry.
    assert_eq!(events[0].2, "Parsing stop times...");
}

#[test]
fn stop_rows_without_coordinates_are_dropped_test() {
    let stops = "\
stop_id,stop_name,stop_lat,stop_lon
S1,Valid,48.1,2.1
S2,No latitude,,2.2
S3,Bad longitude,48.3,east
S4,Valid again,48.4,2.4
S5,Infinite,inf,2.5
";
    let feed = zip_feed(&[("stops.txt", stops)]);
    let tables = GtfsParser::default()
        .parse(Cursor::new(feed), &mut NoProgress)
        .unwrap();

    let ids: Vec<_> = tables.stops.iter().map(|stop| stop.stop_id.as_str()).collect();
    assert_eq!(ids, ["S1", "S4"]);
    let summary = tables.summary("stops.txt").unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.skipped, 3);
}

#[test]
fn blank_cells_and_padded_headers_test() {
    let routes = "route_id , agency_id,route_short_name, route_long_name ,route_type\nR1,,  ,Long name,tram\n";
    let feed = zip_feed(&[("routes.txt", routes)]);
    let tables = GtfsParser::default()
        .parse(Cursor::new(feed), &mut NoProgress)
        .unwrap();

    let route = &tables.routes[0];
    assert_eq!(route.route_id, "R1");
    assert_eq!(route.agency_id, None);
    assert_eq!(route.short_name, None);
    assert_eq!(route.long_name.as_deref(), Some("Long name"));
    assert_eq!(route.route_type, 3);
}

#[test]
fn missing_tables_are_empty_test() {
    let feed = zip_feed(&[("stops.txt", STOPS), ("README.md", "not a table")]);
    let tables = GtfsParser::default()
        .parse(Cursor::new(feed), &mut NoProgress)
        .unwrap();

    assert_eq!(tables.stops.len(), 4);
    assert!(tables.agencies.is_empty());
    assert!(tables.trips.is_empty());
    assert!(tables.stop_times.is_empty());
    assert_eq!(tables.summaries.len(), 1);
    assert!(tables.summary("trips.txt").is_none());
}

#[test]
fn tables_inside_a_folder_are_found_test() {
    let feed = zip_feed(&[("feed/stops.txt", STOPS), ("feed/agency.txt", AGENCY)]);
    let tables = GtfsParser::default()
        .parse(Cursor::new(feed), &mut NoProgress)
        .unwrap();
    assert_eq!(tables.stops.len(), 4);
    assert_eq!(tables.agencies.len(), 1);
}

#[test]
fn corrupt_archive_is_fatal_test() {
    let result = GtfsParser::default().parse(Cursor::new(b"not a zip file".to_vec()), &mut NoProgress);
    assert!(matches!(result, Err(gtfs::Error::Zip(_))));

    let mut sink = RecordingSink::default();
    let result = GtfsParser::default().parse_streaming(
        Cursor::new(Vec::new()),
        &mut sink,
        &mut NoProgress,
    );
    assert!(matches!(result, Err(gtfs::Error::Zip(_))));
    assert!(sink.calls.is_empty());
}

#[test]
fn streaming_batch_count_test() {
    let parser = GtfsParser::new(GtfsConfig::default().with_batch_size(5_000));
    let mut sink = RecordingSink::default();
    let tables = parser
        .parse_streaming(Cursor::new(large_feed(12_345)), &mut sink, &mut NoProgress)
        .unwrap();

    assert_eq!(sink.stop_time_batches, [5_000, 5_000, 2_345]);
    assert_eq!(sink.trip_batches, [1]);
    assert!(tables.stop_times.is_empty());
    assert_eq!(tables.summary("stop_times.txt").unwrap().rows, 12_345);
}

#[test]
fn streaming_reads_parents_first_test() {
    let parser = GtfsParser::new(GtfsConfig::default().with_batch_size(2));
    let mut sink = RecordingSink::default();
    let mut messages = Vec::new();
    let mut listener = |_: usize, _: usize, message: &str| messages.push(message.to_string());
    let tables = parser
        .parse_streaming(Cursor::new(sample_feed()), &mut sink, &mut listener)
        .unwrap();

    assert_eq!(
        sink.calls,
        ["reference", "trips", "trips", "stop_times", "stop_times", "stop_times", "stop_times"]
    );
    assert_eq!(sink.trip_batches, [2, 1]);
    assert_eq!(sink.stop_time_batches, [2, 2, 2, 1]);
    assert_eq!(
        messages,
        [
            "Parsing agencies...",
            "Parsing stops...",
            "Parsing routes...",
            "Parsing calendar...",
            "Parsing trips...",
            "Parsing stop times...",
        ]
    );
    assert_eq!(tables.stops.len(), 4);
    assert_eq!(tables.calendars.len(), 2);
    assert!(tables.trips.is_empty());
}

#[test]
fn streaming_stops_when_sink_fails_test() {
    struct Closed;
    impl BatchSink for Closed {
        fn trips(&mut self, _: Vec<Trip>) -> Result<(), gtfs::Error> {
            Err(gtfs::Error::SinkClosed)
        }
        fn stop_times(&mut self, _: Vec<StopTime>) -> Result<(), gtfs::Error> {
            panic!("stop times must not be read after the sink closed");
        }
    }

    let result = GtfsParser::default().parse_streaming(
        Cursor::new(sample_feed()),
        &mut Closed,
        &mut NoProgress,
    );
    assert!(matches!(result, Err(gtfs::Error::SinkClosed)));
}
