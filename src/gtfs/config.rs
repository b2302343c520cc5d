pub const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub agency_file_name: String,
    pub stops_file_name: String,
    pub routes_file_name: String,
    pub trips_file_name: String,
    pub stop_times_file_name: String,
    pub calendar_file_name: String,
    /// Records per batch handed to a [`BatchSink`](super::BatchSink) when streaming
    /// trips and stop times.
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agency_file_name: "agency.txt".into(),
            stops_file_name: "stops.txt".into(),
            routes_file_name: "routes.txt".into(),
            trips_file_name: "trips.txt".into(),
            stop_times_file_name: "stop_times.txt".into(),
            calendar_file_name: "calendar.txt".into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Config {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}
