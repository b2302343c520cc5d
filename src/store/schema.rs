//! Table definitions. Column names follow the GTFS field names so rows decode
//! straight into the record types.

pub(crate) const PRAGMAS: &[&str] = &["PRAGMA foreign_keys = ON"];

pub(crate) const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS agencies (
        agency_id       TEXT PRIMARY KEY NOT NULL,
        agency_name     TEXT NOT NULL,
        agency_url      TEXT,
        agency_timezone TEXT,
        agency_lang     TEXT,
        agency_phone    TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stops (
        stop_id             TEXT PRIMARY KEY NOT NULL,
        stop_name           TEXT NOT NULL,
        stop_lat            REAL NOT NULL,
        stop_lon            REAL NOT NULL,
        stop_code           TEXT,
        stop_desc           TEXT,
        zone_id             TEXT,
        stop_url            TEXT,
        location_type       INTEGER,
        parent_station      TEXT,
        wheelchair_boarding INTEGER,
        search_name         TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_stops_coordinate ON stops (stop_lat, stop_lon)",
    "CREATE INDEX IF NOT EXISTS idx_stops_name ON stops (stop_name)",
    "CREATE INDEX IF NOT EXISTS idx_stops_search_name ON stops (search_name)",
    r#"
    CREATE TABLE IF NOT EXISTS routes (
        route_id          TEXT PRIMARY KEY NOT NULL,
        agency_id         TEXT REFERENCES agencies (agency_id) ON DELETE CASCADE,
        route_short_name  TEXT,
        route_long_name   TEXT,
        route_desc        TEXT,
        route_type        INTEGER NOT NULL DEFAULT 3,
        route_color       TEXT,
        route_text_color  TEXT,
        route_url         TEXT,
        route_sort_order  INTEGER,
        search_short_name TEXT,
        search_long_name  TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_routes_agency ON routes (agency_id)",
    r#"
    CREATE TABLE IF NOT EXISTS trips (
        trip_id               TEXT PRIMARY KEY NOT NULL,
        route_id              TEXT NOT NULL REFERENCES routes (route_id) ON DELETE CASCADE,
        service_id            TEXT NOT NULL,
        trip_headsign         TEXT,
        trip_short_name       TEXT,
        direction_id          INTEGER,
        block_id              TEXT,
        shape_id              TEXT,
        wheelchair_accessible INTEGER,
        bikes_allowed         INTEGER
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_trips_route ON trips (route_id)",
    "CREATE INDEX IF NOT EXISTS idx_trips_service ON trips (service_id)",
    r#"
    CREATE TABLE IF NOT EXISTS stop_times (
        trip_id             TEXT NOT NULL REFERENCES trips (trip_id) ON DELETE CASCADE,
        arrival_time        TEXT NOT NULL,
        departure_time      TEXT,
        stop_id             TEXT NOT NULL REFERENCES stops (stop_id) ON DELETE CASCADE,
        stop_sequence       INTEGER NOT NULL,
        stop_headsign       TEXT,
        pickup_type         INTEGER,
        drop_off_type       INTEGER,
        shape_dist_traveled REAL,
        timepoint           INTEGER,
        PRIMARY KEY (trip_id, stop_sequence)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_stop_times_stop ON stop_times (stop_id)",
    "CREATE INDEX IF NOT EXISTS idx_stop_times_trip ON stop_times (trip_id)",
    "CREATE INDEX IF NOT EXISTS idx_stop_times_arrival ON stop_times (arrival_time)",
    "CREATE INDEX IF NOT EXISTS idx_stop_times_stop_arrival ON stop_times (stop_id, arrival_time)",
    r#"
    CREATE TABLE IF NOT EXISTS calendar (
        service_id TEXT PRIMARY KEY NOT NULL,
        monday     INTEGER NOT NULL,
        tuesday    INTEGER NOT NULL,
        wednesday  INTEGER NOT NULL,
        thursday   INTEGER NOT NULL,
        friday     INTEGER NOT NULL,
        saturday   INTEGER NOT NULL,
        sunday     INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        end_date   TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_calendar_dates ON calendar (start_date, end_date)",
];
