use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::shared::Coordinate;

/// Agency id used when `agency.txt` omits the `agency_id` column.
pub const DEFAULT_AGENCY_ID: &str = "default";

/// Route type used when `route_type` is missing or not a number (3 = bus).
pub const DEFAULT_ROUTE_TYPE: i32 = 3;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Agency {
    pub agency_id: String,
    #[sqlx(rename = "agency_name")]
    pub name: String,
    #[sqlx(rename = "agency_url")]
    pub url: Option<String>,
    #[sqlx(rename = "agency_timezone")]
    pub timezone: Option<String>,
    #[sqlx(rename = "agency_lang")]
    pub lang: Option<String>,
    #[sqlx(rename = "agency_phone")]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop_id: String,
    #[sqlx(rename = "stop_name")]
    pub name: String,
    #[sqlx(rename = "stop_lat")]
    pub lat: f64,
    #[sqlx(rename = "stop_lon")]
    pub lon: f64,
    #[sqlx(rename = "stop_code")]
    pub code: Option<String>,
    #[sqlx(rename = "stop_desc")]
    pub description: Option<String>,
    pub zone_id: Option<String>,
    #[sqlx(rename = "stop_url")]
    pub url: Option<String>,
    pub location_type: Option<i32>,
    pub parent_station: Option<String>,
    pub wheelchair_boarding: Option<i32>,
}

impl Stop {
    pub fn new(stop_id: impl Into<String>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            stop_id: stop_id.into(),
            name: name.into(),
            lat,
            lon,
            code: None,
            description: None,
            zone_id: None,
            url: None,
            location_type: None,
            parent_station: None,
            wheelchair_boarding: None,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Route {
    pub route_id: String,
    pub agency_id: Option<String>,
    #[sqlx(rename = "route_short_name")]
    pub short_name: Option<String>,
    #[sqlx(rename = "route_long_name")]
    pub long_name: Option<String>,
    #[sqlx(rename = "route_desc")]
    pub description: Option<String>,
    /// Vehicle classification (0: tram, 1: subway, 2: rail, 3: bus, ...).
    pub route_type: i32,
    #[sqlx(rename = "route_color")]
    pub color: Option<String>,
    #[sqlx(rename = "route_text_color")]
    pub text_color: Option<String>,
    #[sqlx(rename = "route_url")]
    pub url: Option<String>,
    #[sqlx(rename = "route_sort_order")]
    pub sort_order: Option<i32>,
}

impl Route {
    pub fn new(route_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            agency_id: None,
            short_name: None,
            long_name: None,
            description: None,
            route_type: DEFAULT_ROUTE_TYPE,
            color: None,
            text_color: None,
            url: None,
            sort_order: None,
        }
    }
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    #[sqlx(rename = "trip_headsign")]
    pub headsign: Option<String>,
    #[sqlx(rename = "trip_short_name")]
    pub short_name: Option<String>,
    pub direction_id: Option<i32>,
    pub block_id: Option<String>,
    pub shape_id: Option<String>,
    pub wheelchair_accessible: Option<i32>,
    pub bikes_allowed: Option<i32>,
}

impl Trip {
    pub fn new(
        trip_id: impl Into<String>,
        route_id: impl Into<String>,
        service_id: impl Into<String>,
    ) -> Self {
        Self {
            trip_id: trip_id.into(),
            route_id: route_id.into(),
            service_id: service_id.into(),
            headsign: None,
            short_name: None,
            direction_id: None,
            block_id: None,
            shape_id: None,
            wheelchair_accessible: None,
            bikes_allowed: None,
        }
    }
}

/// A vehicle calling at a stop. Keyed by `(trip_id, stop_sequence)`.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct StopTime {
    pub trip_id: String,
    /// Verbatim "HH:MM:SS"; hours may exceed 24.
    pub arrival_time: String,
    pub departure_time: Option<String>,
    pub stop_id: String,
    pub stop_sequence: i32,
    pub stop_headsign: Option<String>,
    pub pickup_type: Option<i32>,
    pub drop_off_type: Option<i32>,
    pub shape_dist_traveled: Option<f64>,
    pub timepoint: Option<i32>,
}

impl StopTime {
    pub fn new(
        trip_id: impl Into<String>,
        stop_id: impl Into<String>,
        arrival_time: impl Into<String>,
        stop_sequence: i32,
    ) -> Self {
        Self {
            trip_id: trip_id.into(),
            arrival_time: arrival_time.into(),
            departure_time: None,
            stop_id: stop_id.into(),
            stop_sequence,
            stop_headsign: None,
            pickup_type: None,
            drop_off_type: None,
            shape_dist_traveled: None,
            timepoint: None,
        }
    }
}

/// Weekly service pattern bounded by an inclusive date range.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Calendar {
    pub service_id: String,
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
    /// "YYYYMMDD"
    pub start_date: String,
    /// "YYYYMMDD"
    pub end_date: String,
}

impl Calendar {
    pub fn new(
        service_id: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            monday: false,
            tuesday: false,
            wednesday: false,
            thursday: false,
            friday: false,
            saturday: false,
            sunday: false,
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }
}
