#![allow(dead_code)]

use std::io::{Cursor, Write};

use transito::prelude::*;
use zip::{ZipWriter, write::SimpleFileOptions};

pub const AGENCY: &str = "\
agency_id,agency_name,agency_url,agency_timezone
A1,Metro,https://metro.example,Europe/Paris
";

pub const STOPS: &str = "\
stop_id,stop_name,stop_lat,stop_lon
S1,Gare Centrale,48.8400,2.3200
S2,Place de l'École,48.8500,2.3500
S3,Hôtel de Ville,48.8566,2.3522
S4,Parc,48.8700,2.3000
";

pub const ROUTES: &str = "\
route_id,agency_id,route_short_name,route_long_name,route_type,route_color
R1,A1,42,Gare Centrale - Parc,3,FF0000
R2,A1,T3,Tramway Sud,0,00FF00
";

pub const TRIPS: &str = "\
route_id,service_id,trip_id,trip_headsign
R1,WEEK,T1,Parc
R1,WEEK,T2,Parc
R2,WEEKEND,T3,Sud
";

pub const STOP_TIMES: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence
T1,08:00:00,08:00:30,S1,1
T1,08:10:00,08:10:30,S2,2
T1,08:20:00,08:20:30,S4,3
T2,09:00:00,09:00:30,S1,1
T2,09:10:00,09:10:30,S2,2
T3,07:30:00,07:30:30,S2,1
T3,25:10:00,25:10:30,S3,2
";

pub const CALENDAR: &str = "\
service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date
WEEK,1,1,1,1,1,0,0,20240101,20241231
WEEKEND,0,0,0,0,0,1,1,20240601,20240831
";

/// Zips `files` in the given order.
pub fn zip_feed(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// The six tables above, children first so the archive is not in dependency order.
pub fn sample_feed() -> Vec<u8> {
    zip_feed(&[
        ("stop_times.txt", STOP_TIMES),
        ("trips.txt", TRIPS),
        ("calendar.txt", CALENDAR),
        ("routes.txt", ROUTES),
        ("stops.txt", STOPS),
        ("agency.txt", AGENCY),
        ("shapes.txt", "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\n"),
    ])
}

/// One trip calling `count` times at a single stop.
pub fn large_feed(count: usize) -> Vec<u8> {
    let mut stop_times = String::from("trip_id,arrival_time,stop_id,stop_sequence\n");
    for i in 1..=count {
        let time = Time::from_seconds(i as u32);
        stop_times.push_str(&format!("T1,{},S1,{i}\n", time.to_hms_string()));
    }
    zip_feed(&[
        ("agency.txt", AGENCY),
        ("stops.txt", "stop_id,stop_name,stop_lat,stop_lon\nS1,Only,1.0,1.0\n"),
        ("routes.txt", "route_id,agency_id,route_short_name\nR1,A1,1\n"),
        ("trips.txt", "route_id,service_id,trip_id\nR1,WEEK,T1\n"),
        ("stop_times.txt", &stop_times),
    ])
}

pub async fn memory_store() -> Store {
    Store::open_in_memory().await.unwrap()
}

pub async fn imported_store() -> Store {
    let store = memory_store().await;
    Importer::new(store.clone(), GtfsConfig::default())
        .run(Cursor::new(sample_feed()), |_| {})
        .await
        .unwrap();
    store
}
