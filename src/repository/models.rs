use serde::Serialize;
use sqlx::FromRow;

/// A departure board row: one stop time joined with its trip and route.
#[derive(Serialize, FromRow, Debug, Clone, PartialEq)]
pub struct DepartureInfo {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: Option<String>,
    pub stop_id: String,
    pub stop_sequence: i32,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_color: Option<String>,
    pub trip_headsign: Option<String>,
}

/// Row counts across the six tables.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    pub agencies: i64,
    pub stops: i64,
    pub routes: i64,
    pub trips: i64,
    pub stop_times: i64,
    pub calendars: i64,
}

impl FeedStats {
    pub fn total(&self) -> i64 {
        self.agencies + self.stops + self.routes + self.trips + self.stop_times + self.calendars
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    Empty,
    Importing,
    Populated,
}
