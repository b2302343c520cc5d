//! Row to record conversion for the six known tables.
//!
//! A builder returns `None` when the row cannot produce a usable record: the
//! primary key is blank, or a stop lacks a numeric coordinate.

use crate::gtfs::{
    models::{Agency, Calendar, DEFAULT_AGENCY_ID, DEFAULT_ROUTE_TYPE, Route, Stop, StopTime, Trip},
    table::Row,
};

impl Agency {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            agency_id: row
                .string("agency_id")
                .unwrap_or_else(|| DEFAULT_AGENCY_ID.to_string()),
            name: row.string("agency_name").unwrap_or_default(),
            url: row.string("agency_url"),
            timezone: row.string("agency_timezone"),
            lang: row.string("agency_lang"),
            phone: row.string("agency_phone"),
        })
    }
}

impl Stop {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        let lat = row.float("stop_lat")?;
        let lon = row.float("stop_lon")?;
        Some(Self {
            stop_id: row.string("stop_id")?,
            name: row.string("stop_name").unwrap_or_default(),
            lat,
            lon,
            code: row.string("stop_code"),
            description: row.string("stop_desc"),
            zone_id: row.string("zone_id"),
            url: row.string("stop_url"),
            location_type: row.int("location_type"),
            parent_station: row.string("parent_station"),
            wheelchair_boarding: row.int("wheelchair_boarding"),
        })
    }
}

impl Route {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            route_id: row.string("route_id")?,
            agency_id: row.string("agency_id"),
            short_name: row.string("route_short_name"),
            long_name: row.string("route_long_name"),
            description: row.string("route_desc"),
            route_type: row.int("route_type").unwrap_or(DEFAULT_ROUTE_TYPE),
            color: row.string("route_color"),
            text_color: row.string("route_text_color"),
            url: row.string("route_url"),
            sort_order: row.int("route_sort_order"),
        })
    }
}

impl Trip {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            trip_id: row.string("trip_id")?,
            route_id: row.string("route_id")?,
            service_id: row.string("service_id")?,
            headsign: row.string("trip_headsign"),
            short_name: row.string("trip_short_name"),
            direction_id: row.int("direction_id"),
            block_id: row.string("block_id"),
            shape_id: row.string("shape_id"),
            wheelchair_accessible: row.int("wheelchair_accessible"),
            bikes_allowed: row.int("bikes_allowed"),
        })
    }
}

impl StopTime {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            trip_id: row.string("trip_id")?,
            // Blank for untimed stops; kept verbatim like every other time value.
            arrival_time: row.string("arrival_time").unwrap_or_default(),
            departure_time: row.string("departure_time"),
            stop_id: row.string("stop_id")?,
            stop_sequence: row.int("stop_sequence")?,
            stop_headsign: row.string("stop_headsign"),
            pickup_type: row.int("pickup_type"),
            drop_off_type: row.int("drop_off_type"),
            shape_dist_traveled: row.float("shape_dist_traveled"),
            timepoint: row.int("timepoint"),
        })
    }
}

impl Calendar {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            service_id: row.string("service_id")?,
            monday: row.flag("monday"),
            tuesday: row.flag("tuesday"),
            wednesday: row.flag("wednesday"),
            thursday: row.flag("thursday"),
            friday: row.flag("friday"),
            saturday: row.flag("saturday"),
            sunday: row.flag("sunday"),
            start_date: row.string("start_date").unwrap_or_default(),
            end_date: row.string("end_date").unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::gtfs::table::read_table;

    use super::*;

    fn parse<T>(input: &str, build: fn(&Row) -> Option<T>) -> Vec<T> {
        let mut out = Vec::new();
        read_table(input.as_bytes(), "test.txt", build, |value| {
            out.push(value);
            Ok(())
        })
        .unwrap();
        out
    }

    #[test]
    fn agency_id_defaults() {
        let agencies = parse("agency_name,agency_url\nMetro,https://metro.example\n", Agency::from_row);
        assert_eq!(agencies[0].agency_id, DEFAULT_AGENCY_ID);
        assert_eq!(agencies[0].name, "Metro");
        assert_eq!(agencies[0].timezone, None);
    }

    #[test]
    fn stop_without_coordinate_is_dropped() {
        let stops = parse(
            "stop_id,stop_name,stop_lat,stop_lon\nA,Alpha,48.1,2.3\nB,Beta,,2.3\nC,Gamma,north,2.3\n",
            Stop::from_row,
        );
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].stop_id, "A");
    }

    #[test]
    fn stop_optional_numbers_fall_back() {
        let stops = parse(
            "stop_id,stop_name,stop_lat,stop_lon,location_type,wheelchair_boarding\nA,Alpha,1,2,x,1\n",
            Stop::from_row,
        );
        assert_eq!(stops[0].location_type, None);
        assert_eq!(stops[0].wheelchair_boarding, Some(1));
    }

    #[test]
    fn route_type_defaults_to_bus() {
        let routes = parse("route_id,route_short_name,route_type\nR1,42,\nR2,7,1\n", Route::from_row);
        assert_eq!(routes[0].route_type, DEFAULT_ROUTE_TYPE);
        assert_eq!(routes[1].route_type, 1);
    }

    #[test]
    fn stop_time_keeps_time_verbatim() {
        let stop_times = parse(
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,25:10:00,25:11:00,S1,3\n",
            StopTime::from_row,
        );
        assert_eq!(stop_times[0].arrival_time, "25:10:00");
        assert_eq!(stop_times[0].departure_time.as_deref(), Some("25:11:00"));
        assert_eq!(stop_times[0].stop_sequence, 3);
    }

    #[test]
    fn stop_time_without_sequence_is_dropped() {
        let stop_times = parse(
            "trip_id,arrival_time,stop_id,stop_sequence\nT1,10:00:00,S1,\n",
            StopTime::from_row,
        );
        assert!(stop_times.is_empty());
    }

    #[test]
    fn calendar_flags() {
        let calendars = parse(
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nWK,1,1,1,1,1,0,,20240101,20240131\n",
            Calendar::from_row,
        );
        let calendar = &calendars[0];
        assert!(calendar.monday && calendar.friday);
        assert!(!calendar.saturday && !calendar.sunday);
        assert_eq!(calendar.start_date, "20240101");
    }
}
