use tracing::debug;

mod live;
mod models;
pub use live::*;
pub use models::*;

use crate::{
    gtfs::models::{Agency, Calendar, Route, Stop, StopTime, Trip},
    shared::{BoundingBox, Coordinate, like_pattern},
    store::{self, Record, Store, Table},
};

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_NEAREST_LIMIT: u32 = 10;
pub const DEFAULT_DEPARTURES_LIMIT: u32 = 10;

type Result<T> = std::result::Result<T, store::Error>;

async fn all<T: Record>(store: &Store) -> Result<Vec<T>> {
    let statement = format!("SELECT * FROM {} ORDER BY rowid", T::TABLE.name());
    let rows = sqlx::query_as::<_, T>(&statement)
        .fetch_all(store.pool())
        .await?;
    Ok(rows)
}

/// Read side of the store: lookups, search, spatial and departure queries.
///
/// Absent records come back as `None` or an empty `Vec`.
#[derive(Debug, Clone)]
pub struct Repository {
    store: Store,
}

impl Repository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Snapshot of a whole table in storage order.
    pub async fn all<T: Record>(&self) -> Result<Vec<T>> {
        all::<T>(&self.store).await
    }

    /// Observable view of a whole table. See [`LiveQuery`].
    pub fn live<T: Record>(&self) -> LiveQuery<T> {
        LiveQuery::new(self.store.clone())
    }

    pub async fn agency(&self, agency_id: &str) -> Result<Option<Agency>> {
        self.by_key("SELECT * FROM agencies WHERE agency_id = ?", agency_id)
            .await
    }

    pub async fn stop(&self, stop_id: &str) -> Result<Option<Stop>> {
        self.by_key("SELECT * FROM stops WHERE stop_id = ?", stop_id)
            .await
    }

    pub async fn route(&self, route_id: &str) -> Result<Option<Route>> {
        self.by_key("SELECT * FROM routes WHERE route_id = ?", route_id)
            .await
    }

    pub async fn trip(&self, trip_id: &str) -> Result<Option<Trip>> {
        self.by_key("SELECT * FROM trips WHERE trip_id = ?", trip_id)
            .await
    }

    pub async fn calendar(&self, service_id: &str) -> Result<Option<Calendar>> {
        self.by_key("SELECT * FROM calendar WHERE service_id = ?", service_id)
            .await
    }

    async fn by_key<T: Record>(&self, statement: &str, key: &str) -> Result<Option<T>> {
        let row = sqlx::query_as::<_, T>(statement)
            .bind(key)
            .fetch_optional(self.store.pool())
            .await?;
        Ok(row)
    }

    /// Case-insensitive substring match on the stop name.
    ///
    /// The query is matched as given: surrounding spaces are part of the
    /// substring, and an empty query matches every stop up to `limit`.
    pub async fn search_stops(&self, query: &str, limit: u32) -> Result<Vec<Stop>> {
        let stops = sqlx::query_as::<_, Stop>(
            r"SELECT * FROM stops WHERE search_name LIKE ? ESCAPE '\' ORDER BY rowid LIMIT ?",
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(self.store.pool())
        .await?;
        debug!(query, found = stops.len(), "Searched stops");
        Ok(stops)
    }

    /// Case-insensitive substring match on either the short or the long route
    /// name. Same query rules as [`Repository::search_stops`].
    pub async fn search_routes(&self, query: &str, limit: u32) -> Result<Vec<Route>> {
        let routes = sqlx::query_as::<_, Route>(
            r"
            SELECT * FROM routes
            WHERE search_short_name LIKE ?1 ESCAPE '\'
               OR search_long_name LIKE ?1 ESCAPE '\'
            ORDER BY rowid
            LIMIT ?2
            ",
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(self.store.pool())
        .await?;
        debug!(query, found = routes.len(), "Searched routes");
        Ok(routes)
    }

    /// Stops inside the inclusive rectangle.
    pub async fn stops_in_bounds(&self, bounds: &BoundingBox) -> Result<Vec<Stop>> {
        let stops = sqlx::query_as::<_, Stop>(
            r#"
            SELECT * FROM stops
            WHERE stop_lat BETWEEN ? AND ?
              AND stop_lon BETWEEN ? AND ?
            "#,
        )
        .bind(bounds.min_lat)
        .bind(bounds.max_lat)
        .bind(bounds.min_lon)
        .bind(bounds.max_lon)
        .fetch_all(self.store.pool())
        .await?;
        Ok(stops)
    }

    /// The `limit` stops closest to `coordinate` by squared distance in raw
    /// degrees. Equal distances keep storage order.
    pub async fn nearest_stops(&self, coordinate: &Coordinate, limit: u32) -> Result<Vec<Stop>> {
        let stops = sqlx::query_as::<_, Stop>(
            r#"
            SELECT * FROM stops
            ORDER BY (?1 - stop_lat) * (?1 - stop_lat) + (?2 - stop_lon) * (?2 - stop_lon),
                     rowid
            LIMIT ?3
            "#,
        )
        .bind(coordinate.latitude)
        .bind(coordinate.longitude)
        .bind(limit)
        .fetch_all(self.store.pool())
        .await?;
        Ok(stops)
    }

    pub async fn trips_by_route(&self, route_id: &str) -> Result<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE route_id = ?")
            .bind(route_id)
            .fetch_all(self.store.pool())
            .await?;
        Ok(trips)
    }

    pub async fn trips_by_service(&self, service_id: &str) -> Result<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE service_id = ?")
            .bind(service_id)
            .fetch_all(self.store.pool())
            .await?;
        Ok(trips)
    }

    /// A trip's calls in `stop_sequence` order.
    pub async fn stop_times_by_trip(&self, trip_id: &str) -> Result<Vec<StopTime>> {
        let stop_times = sqlx::query_as::<_, StopTime>(
            "SELECT * FROM stop_times WHERE trip_id = ? ORDER BY stop_sequence",
        )
        .bind(trip_id)
        .fetch_all(self.store.pool())
        .await?;
        Ok(stop_times)
    }

    /// Every call at a stop in `arrival_time` order.
    pub async fn stop_times_by_stop(&self, stop_id: &str) -> Result<Vec<StopTime>> {
        let stop_times = sqlx::query_as::<_, StopTime>(
            "SELECT * FROM stop_times WHERE stop_id = ? ORDER BY arrival_time",
        )
        .bind(stop_id)
        .fetch_all(self.store.pool())
        .await?;
        Ok(stop_times)
    }

    /// Calls at `stop_id` arriving at or after `current_time` ("HH:MM:SS"),
    /// earliest first. Times compare as zero-padded strings.
    pub async fn next_departures(
        &self,
        stop_id: &str,
        current_time: &str,
        limit: u32,
    ) -> Result<Vec<StopTime>> {
        let stop_times = sqlx::query_as::<_, StopTime>(
            r#"
            SELECT * FROM stop_times
            WHERE stop_id = ? AND arrival_time >= ?
            ORDER BY arrival_time
            LIMIT ?
            "#,
        )
        .bind(stop_id)
        .bind(current_time)
        .bind(limit)
        .fetch_all(self.store.pool())
        .await?;
        Ok(stop_times)
    }

    /// Like [`next_departures`](Self::next_departures), with trip and route
    /// context. Calls whose trip or route is missing are left out.
    pub async fn next_departures_with_route_info(
        &self,
        stop_id: &str,
        current_time: &str,
        limit: u32,
    ) -> Result<Vec<DepartureInfo>> {
        let departures = sqlx::query_as::<_, DepartureInfo>(
            r#"
            SELECT st.trip_id, st.arrival_time, st.departure_time, st.stop_id, st.stop_sequence,
                   r.route_short_name, r.route_long_name, r.route_color, t.trip_headsign
            FROM stop_times st
            INNER JOIN trips t ON st.trip_id = t.trip_id
            INNER JOIN routes r ON t.route_id = r.route_id
            WHERE st.stop_id = ? AND st.arrival_time >= ?
            ORDER BY st.arrival_time
            LIMIT ?
            "#,
        )
        .bind(stop_id)
        .bind(current_time)
        .bind(limit)
        .fetch_all(self.store.pool())
        .await?;
        Ok(departures)
    }

    /// Calendars whose inclusive `[start_date, end_date]` contains `date`
    /// ("YYYYMMDD"). Weekday flags are not consulted.
    pub async fn active_calendars(&self, date: &str) -> Result<Vec<Calendar>> {
        let calendars = sqlx::query_as::<_, Calendar>(
            "SELECT * FROM calendar WHERE ? BETWEEN start_date AND end_date",
        )
        .bind(date)
        .fetch_all(self.store.pool())
        .await?;
        Ok(calendars)
    }

    pub async fn statistics(&self) -> Result<FeedStats> {
        Ok(FeedStats {
            agencies: self.store.count(Table::Agencies).await?,
            stops: self.store.count(Table::Stops).await?,
            routes: self.store.count(Table::Routes).await?,
            trips: self.store.count(Table::Trips).await?,
            stop_times: self.store.count(Table::StopTimes).await?,
            calendars: self.store.count(Table::Calendars).await?,
        })
    }

    /// `Empty` or `Populated` from row counts. `Importing` is only known to
    /// the [`ImportManager`](crate::import::ImportManager).
    pub async fn state(&self) -> Result<StoreState> {
        let stats = self.statistics().await?;
        Ok(if stats.is_empty() {
            StoreState::Empty
        } else {
            StoreState::Populated
        })
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.store.clear().await
    }
}
