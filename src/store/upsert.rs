//! Keyed upserts for each record type.
//!
//! Conflicts update the existing row in place (`ON CONFLICT .. DO UPDATE`).
//! `INSERT OR REPLACE` would delete the old row first and cascade that delete
//! to its children.
//!
//! Child rows whose parent is missing are not written: the `WHERE EXISTS`
//! guard turns them into zero-row inserts instead of foreign key failures.

use sqlx::{
    Sqlite,
    query::Query,
    sqlite::{SqliteArguments, SqliteRow},
};

use crate::{
    gtfs::models::{Agency, Calendar, Route, Stop, StopTime, Trip},
    shared::normalize,
    store::Table,
};

type Upsert<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// A record type with its own table.
pub trait Record: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Sync + Unpin {
    const TABLE: Table;

    fn upsert(&self) -> Upsert<'_>;
}

impl Record for Agency {
    const TABLE: Table = Table::Agencies;

    fn upsert(&self) -> Upsert<'_> {
        sqlx::query(
            r#"
            INSERT INTO agencies (
                agency_id, agency_name, agency_url, agency_timezone, agency_lang, agency_phone
            )
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (agency_id) DO UPDATE SET
                agency_name = excluded.agency_name,
                agency_url = excluded.agency_url,
                agency_timezone = excluded.agency_timezone,
                agency_lang = excluded.agency_lang,
                agency_phone = excluded.agency_phone
            "#,
        )
        .bind(self.agency_id.as_str())
        .bind(self.name.as_str())
        .bind(self.url.as_deref())
        .bind(self.timezone.as_deref())
        .bind(self.lang.as_deref())
        .bind(self.phone.as_deref())
    }
}

impl Record for Stop {
    const TABLE: Table = Table::Stops;

    fn upsert(&self) -> Upsert<'_> {
        sqlx::query(
            r#"
            INSERT INTO stops (
                stop_id, stop_name, stop_lat, stop_lon, stop_code, stop_desc, zone_id,
                stop_url, location_type, parent_station, wheelchair_boarding, search_name
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (stop_id) DO UPDATE SET
                stop_name = excluded.stop_name,
                stop_lat = excluded.stop_lat,
                stop_lon = excluded.stop_lon,
                stop_code = excluded.stop_code,
                stop_desc = excluded.stop_desc,
                zone_id = excluded.zone_id,
                stop_url = excluded.stop_url,
                location_type = excluded.location_type,
                parent_station = excluded.parent_station,
                wheelchair_boarding = excluded.wheelchair_boarding,
                search_name = excluded.search_name
            "#,
        )
        .bind(self.stop_id.as_str())
        .bind(self.name.as_str())
        .bind(self.lat)
        .bind(self.lon)
        .bind(self.code.as_deref())
        .bind(self.description.as_deref())
        .bind(self.zone_id.as_deref())
        .bind(self.url.as_deref())
        .bind(self.location_type)
        .bind(self.parent_station.as_deref())
        .bind(self.wheelchair_boarding)
        .bind(normalize(&self.name))
    }
}

impl Record for Route {
    const TABLE: Table = Table::Routes;

    fn upsert(&self) -> Upsert<'_> {
        sqlx::query(
            r#"
            INSERT INTO routes (
                route_id, agency_id, route_short_name, route_long_name, route_desc, route_type,
                route_color, route_text_color, route_url, route_sort_order,
                search_short_name, search_long_name
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12
            WHERE ?2 IS NULL OR EXISTS (SELECT 1 FROM agencies WHERE agency_id = ?2)
            ON CONFLICT (route_id) DO UPDATE SET
                agency_id = excluded.agency_id,
                route_short_name = excluded.route_short_name,
                route_long_name = excluded.route_long_name,
                route_desc = excluded.route_desc,
                route_type = excluded.route_type,
                route_color = excluded.route_color,
                route_text_color = excluded.route_text_color,
                route_url = excluded.route_url,
                route_sort_order = excluded.route_sort_order,
                search_short_name = excluded.search_short_name,
                search_long_name = excluded.search_long_name
            "#,
        )
        .bind(self.route_id.as_str())
        .bind(self.agency_id.as_deref())
        .bind(self.short_name.as_deref())
        .bind(self.long_name.as_deref())
        .bind(self.description.as_deref())
        .bind(self.route_type)
        .bind(self.color.as_deref())
        .bind(self.text_color.as_deref())
        .bind(self.url.as_deref())
        .bind(self.sort_order)
        .bind(self.short_name.as_deref().map(normalize))
        .bind(self.long_name.as_deref().map(normalize))
    }
}

impl Record for Trip {
    const TABLE: Table = Table::Trips;

    fn upsert(&self) -> Upsert<'_> {
        sqlx::query(
            r#"
            INSERT INTO trips (
                trip_id, route_id, service_id, trip_headsign, trip_short_name, direction_id,
                block_id, shape_id, wheelchair_accessible, bikes_allowed
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10
            WHERE EXISTS (SELECT 1 FROM routes WHERE route_id = ?2)
            ON CONFLICT (trip_id) DO UPDATE SET
                route_id = excluded.route_id,
                service_id = excluded.service_id,
                trip_headsign = excluded.trip_headsign,
                trip_short_name = excluded.trip_short_name,
                direction_id = excluded.direction_id,
                block_id = excluded.block_id,
                shape_id = excluded.shape_id,
                wheelchair_accessible = excluded.wheelchair_accessible,
                bikes_allowed = excluded.bikes_allowed
            "#,
        )
        .bind(self.trip_id.as_str())
        .bind(self.route_id.as_str())
        .bind(self.service_id.as_str())
        .bind(self.headsign.as_deref())
        .bind(self.short_name.as_deref())
        .bind(self.direction_id)
        .bind(self.block_id.as_deref())
        .bind(self.shape_id.as_deref())
        .bind(self.wheelchair_accessible)
        .bind(self.bikes_allowed)
    }
}

impl Record for StopTime {
    const TABLE: Table = Table::StopTimes;

    fn upsert(&self) -> Upsert<'_> {
        sqlx::query(
            r#"
            INSERT INTO stop_times (
                trip_id, arrival_time, departure_time, stop_id, stop_sequence, stop_headsign,
                pickup_type, drop_off_type, shape_dist_traveled, timepoint
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10
            WHERE EXISTS (SELECT 1 FROM trips WHERE trip_id = ?1)
              AND EXISTS (SELECT 1 FROM stops WHERE stop_id = ?4)
            ON CONFLICT (trip_id, stop_sequence) DO UPDATE SET
                arrival_time = excluded.arrival_time,
                departure_time = excluded.departure_time,
                stop_id = excluded.stop_id,
                stop_headsign = excluded.stop_headsign,
                pickup_type = excluded.pickup_type,
                drop_off_type = excluded.drop_off_type,
                shape_dist_traveled = excluded.shape_dist_traveled,
                timepoint = excluded.timepoint
            "#,
        )
        .bind(self.trip_id.as_str())
        .bind(self.arrival_time.as_str())
        .bind(self.departure_time.as_deref())
        .bind(self.stop_id.as_str())
        .bind(self.stop_sequence)
        .bind(self.stop_headsign.as_deref())
        .bind(self.pickup_type)
        .bind(self.drop_off_type)
        .bind(self.shape_dist_traveled)
        .bind(self.timepoint)
    }
}

impl Record for Calendar {
    const TABLE: Table = Table::Calendars;

    fn upsert(&self) -> Upsert<'_> {
        sqlx::query(
            r#"
            INSERT INTO calendar (
                service_id, monday, tuesday, wednesday, thursday, friday, saturday, sunday,
                start_date, end_date
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (service_id) DO UPDATE SET
                monday = excluded.monday,
                tuesday = excluded.tuesday,
                wednesday = excluded.wednesday,
                thursday = excluded.thursday,
                friday = excluded.friday,
                saturday = excluded.saturday,
                sunday = excluded.sunday,
                start_date = excluded.start_date,
                end_date = excluded.end_date
            "#,
        )
        .bind(self.service_id.as_str())
        .bind(self.monday)
        .bind(self.tuesday)
        .bind(self.wednesday)
        .bind(self.thursday)
        .bind(self.friday)
        .bind(self.saturday)
        .bind(self.sunday)
        .bind(self.start_date.as_str())
        .bind(self.end_date.as_str())
    }
}
