use criterion::{Criterion, criterion_group, criterion_main};
use std::{env, fs, hint::black_box, io::Cursor, path::Path, time::Duration};
use tokio::runtime::Runtime;
use transito::{gtfs::NoProgress, prelude::*};

fn parse_feed(feed: &[u8]) {
    let _ = black_box(GtfsParser::default().parse(Cursor::new(feed), &mut NoProgress));
}

fn nearest(runtime: &Runtime, repository: &Repository) {
    let coordinate = Coordinate::from((59.370_136, 18.001_749));
    let _ = black_box(runtime.block_on(repository.nearest_stops(&coordinate, 10)));
}

fn departures(runtime: &Runtime, repository: &Repository, stop_id: &str) {
    let _ = black_box(runtime.block_on(repository.next_departures_with_route_info(
        stop_id,
        "08:00:00",
        10,
    )));
}

fn criterion_benchmark(c: &mut Criterion) {
    let gtfs_data_path = match env::var("GTFS_DATA_PATH") {
        Ok(path_str) => Path::new(&path_str).to_owned(),
        Err(err) => {
            println!("Missing GTFS_DATA_PATH environment variable: {err}");
            return;
        }
    };

    let feed = fs::read(&gtfs_data_path).expect("Failed to read GTFS zip");
    let runtime = Runtime::new().expect("Failed to start runtime");
    let store = runtime
        .block_on(Store::open_in_memory())
        .expect("Failed to open store");
    runtime
        .block_on(
            Importer::new(store.clone(), GtfsConfig::default())
                .run(Cursor::new(feed.clone()), |_| {}),
        )
        .expect("Failed to import GTFS zip");
    let repository = Repository::new(store);
    let stop_id = runtime
        .block_on(repository.all::<Stop>())
        .expect("Failed to list stops")
        .first()
        .map(|stop| stop.stop_id.clone())
        .unwrap_or_default();

    let mut group = c.benchmark_group("Feed");

    group.warm_up_time(Duration::from_secs(5));

    group.measurement_time(Duration::from_secs(20));

    group.bench_function("Parse whole feed", |b| b.iter(|| parse_feed(&feed)));

    group.bench_function("Nearest 10 stops", |b| {
        b.iter(|| nearest(&runtime, &repository))
    });

    group.bench_function("Next departures", |b| {
        b.iter(|| departures(&runtime, &repository, &stop_id))
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
