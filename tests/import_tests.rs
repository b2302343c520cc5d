mod common;

use std::{io::Cursor, time::Duration};

use common::*;
use transito::{import, prelude::*};

#[tokio::test]
async fn import_sample_feed_test() {
    let store = memory_store().await;
    let importer = Importer::new(store.clone(), GtfsConfig::default());
    let report = importer.run(Cursor::new(sample_feed()), |_| {}).await.unwrap();

    assert_eq!(report.stats.stops, 4);
    assert_eq!(report.stats.stop_times, 7);
    for table in &report.tables {
        assert!(table.present, "{} missing", table.file_name);
        assert_eq!(table.skipped, 0);
        assert_eq!(table.parsed as u64, table.stored, "{}", table.file_name);
    }
    assert_eq!(report.table(Table::Trips).unwrap().stored, 3);
    assert_eq!(store.count(Table::Calendars).await.unwrap(), 2);
}

#[tokio::test]
async fn row_count_conservation_test() {
    let stops = "\
stop_id,stop_name,stop_lat,stop_lon
S1,Valid,48.1,2.1
S2,Missing,,2.2
S3,Valid,48.3,2.3
S4,Garbage,x,y
S5,Valid,48.5,2.5
";
    let store = memory_store().await;
    let report = Importer::new(store.clone(), GtfsConfig::default())
        .run(Cursor::new(zip_feed(&[("stops.txt", stops)])), |_| {})
        .await
        .unwrap();

    assert_eq!(store.count(Table::Stops).await.unwrap(), 3);
    let stops = report.table(Table::Stops).unwrap();
    assert_eq!((stops.parsed, stops.skipped, stops.stored), (3, 2, 3));
    let trips = report.table(Table::Trips).unwrap();
    assert!(!trips.present);
    assert_eq!(trips.stored, 0);
}

#[tokio::test]
async fn orphans_are_reported_not_fatal_test() {
    let stop_times = "\
trip_id,arrival_time,stop_id,stop_sequence
T1,08:00:00,S1,1
T1,08:05:00,S404,2
T404,08:10:00,S1,1
";
    let feed = zip_feed(&[
        ("stops.txt", "stop_id,stop_name,stop_lat,stop_lon\nS1,One,1,1\n"),
        ("routes.txt", "route_id,route_short_name\nR1,1\n"),
        ("trips.txt", "route_id,service_id,trip_id\nR1,WEEK,T1\n"),
        ("stop_times.txt", stop_times),
    ]);
    let store = memory_store().await;
    let report = Importer::new(store, GtfsConfig::default())
        .run(Cursor::new(feed), |_| {})
        .await
        .unwrap();

    let stop_times = report.table(Table::StopTimes).unwrap();
    assert_eq!(stop_times.parsed, 3);
    assert_eq!(stop_times.stored, 1);
    assert_eq!(report.stats.stop_times, 1);
    assert_eq!(stop_times.orphaned(), 2);
}

#[tokio::test]
async fn unknown_agency_drops_its_network_test() {
    let feed = zip_feed(&[
        ("agency.txt", "agency_name\nMetro\n"),
        ("routes.txt", "route_id,agency_id,route_short_name\nR1,METRO,42\n"),
        ("trips.txt", "route_id,service_id,trip_id\nR1,WK,T1\n"),
    ]);
    let store = memory_store().await;
    let report = Importer::new(store, GtfsConfig::default())
        .run(Cursor::new(feed), |_| {})
        .await
        .unwrap();

    let agencies = report.table(Table::Agencies).unwrap();
    assert_eq!((agencies.parsed, agencies.stored), (1, 1));
    let routes = report.table(Table::Routes).unwrap();
    assert_eq!((routes.parsed, routes.stored, routes.orphaned()), (1, 0, 1));
    let trips = report.table(Table::Trips).unwrap();
    assert_eq!((trips.parsed, trips.stored, trips.orphaned()), (1, 0, 1));
    assert_eq!(report.stats.routes, 0);
    assert_eq!(report.stats.trips, 0);
    assert_eq!(report.table(Table::Stops).unwrap().orphaned(), 0);
}

#[tokio::test]
async fn streaming_import_count_test() {
    let store = memory_store().await;
    let importer = Importer::new(store.clone(), GtfsConfig::default().with_batch_size(5_000));
    let mut messages = Vec::new();
    importer
        .run(Cursor::new(large_feed(12_345)), |progress| {
            messages.push(progress.message)
        })
        .await
        .unwrap();

    assert_eq!(store.count(Table::StopTimes).await.unwrap(), 12_345);
    let inserts: Vec<_> = messages
        .iter()
        .filter(|message| message.ends_with("stop times..."))
        .filter(|message| message.starts_with("Inserted"))
        .collect();
    assert_eq!(
        inserts,
        [
            "Inserted 5000 stop times...",
            "Inserted 10000 stop times...",
            "Inserted 12345 stop times...",
        ]
    );
}

#[tokio::test]
async fn progress_bands_test() {
    let store = memory_store().await;
    let mut events = Vec::new();
    Importer::new(store, GtfsConfig::default())
        .run(Cursor::new(sample_feed()), |progress| events.push(progress))
        .await
        .unwrap();

    let percents: Vec<_> = events.iter().map(|event| event.percent).collect();
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]), "{percents:?}");
    assert_eq!(percents.first(), Some(&0));
    assert_eq!(percents.last(), Some(&100));
    for checkpoint in [5, 50, 52, 55, 58, 60, 70] {
        assert!(percents.contains(&checkpoint), "missing {checkpoint} in {percents:?}");
    }
    assert!(percents.iter().all(|percent| *percent <= 100));
    assert_eq!(events[0].message, "Clearing existing data...");
    assert_eq!(events[events.len() - 1].message, "Import complete");
}

#[tokio::test]
async fn reimport_replaces_previous_feed_test() {
    let store = imported_store().await;
    let second = zip_feed(&[(
        "stops.txt",
        "stop_id,stop_name,stop_lat,stop_lon\nN1,New stop,10,10\n",
    )]);
    let report = Importer::new(store.clone(), GtfsConfig::default())
        .run(Cursor::new(second), |_| {})
        .await
        .unwrap();

    assert_eq!(
        report.stats,
        FeedStats {
            stops: 1,
            ..Default::default()
        }
    );
    let repository = Repository::new(store);
    assert!(repository.stop("S1").await.unwrap().is_none());
    assert!(repository.stop("N1").await.unwrap().is_some());
}

#[tokio::test]
async fn corrupt_archive_fails_import_test() {
    let store = imported_store().await;
    let result = Importer::new(store.clone(), GtfsConfig::default())
        .run(Cursor::new(b"PK\x03\x04 definitely not a zip".to_vec()), |_| {})
        .await;

    assert!(matches!(result, Err(import::Error::Gtfs(_))));
    assert_eq!(store.count(Table::Stops).await.unwrap(), 0);
}

#[tokio::test]
async fn manager_reports_completion_test() {
    let store = memory_store().await;
    let manager = ImportManager::new(Importer::new(store, GtfsConfig::default()));
    assert_eq!(manager.status(), ImportStatus::Idle);
    assert_eq!(manager.store_state().await.unwrap(), StoreState::Empty);

    let started = manager.start(Cursor::new(sample_feed())).await;
    assert_eq!(started.superseded, None);
    let status = tokio::time::timeout(Duration::from_secs(10), manager.wait())
        .await
        .unwrap();

    match status {
        ImportStatus::Completed { id: finished, report } => {
            assert_eq!(finished, started.id);
            assert_eq!(report.stats.routes, 2);
        }
        other => panic!("unexpected status {other:?}"),
    }
    assert_eq!(manager.store_state().await.unwrap(), StoreState::Populated);
}

#[tokio::test]
async fn manager_reports_failure_test() {
    let store = memory_store().await;
    let manager = ImportManager::new(Importer::new(store, GtfsConfig::default()));

    let id = manager.start(Cursor::new(Vec::new())).await.id;
    let status = tokio::time::timeout(Duration::from_secs(10), manager.wait())
        .await
        .unwrap();
    match status {
        ImportStatus::Failed { id: failed, message } => {
            assert_eq!(failed, id);
            assert!(!message.is_empty());
        }
        other => panic!("unexpected status {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn import_supersession_test() {
    let store = memory_store().await;
    let manager = ImportManager::new(Importer::new(
        store.clone(),
        GtfsConfig::default().with_batch_size(1_000),
    ));

    let first = manager.start(Cursor::new(large_feed(200_000))).await;
    let second = manager.start(Cursor::new(sample_feed())).await;
    assert_ne!(first.id, second.id);
    assert_eq!(second.superseded, Some(first.id));

    let status = tokio::time::timeout(Duration::from_secs(30), manager.wait())
        .await
        .unwrap();
    assert!(matches!(status, ImportStatus::Completed { id, .. } if id == second.id));

    // Only the second feed's rows remain.
    let stats = Repository::new(store).statistics().await.unwrap();
    assert_eq!(stats.stops, 4);
    assert_eq!(stats.stop_times, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_running_import_test() {
    let store = memory_store().await;
    let manager = ImportManager::new(Importer::new(
        store,
        GtfsConfig::default().with_batch_size(1_000),
    ));

    let started = manager.start(Cursor::new(large_feed(200_000))).await;
    assert_eq!(manager.cancel().await, Some(started.id));
    assert_eq!(manager.status(), ImportStatus::Cancelled { id: started.id });
    assert_eq!(manager.cancel().await, None);

    // A later import runs normally after a cancel.
    let next = manager.start(Cursor::new(sample_feed())).await;
    assert_eq!(next.superseded, None);
    let status = tokio::time::timeout(Duration::from_secs(30), manager.wait())
        .await
        .unwrap();
    assert!(matches!(status, ImportStatus::Completed { id, .. } if id == next.id));
}

#[tokio::test]
async fn cancel_without_import_test() {
    let store = memory_store().await;
    let manager = ImportManager::new(Importer::new(store, GtfsConfig::default()));
    assert_eq!(manager.cancel().await, None);
}
