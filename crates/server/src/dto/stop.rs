use serde::Serialize;
use transito::{gtfs::models::Stop, shared::Coordinate};

#[derive(Debug, Clone, Serialize)]
pub struct StopDto {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub coordinate: Coordinate,
    /// Meters from the query point, for nearest-stop results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl StopDto {
    pub fn with_distance(mut self, from: &Coordinate) -> Self {
        self.distance = Some(from.haversine_distance(&self.coordinate).as_meters());
        self
    }
}

impl From<&Stop> for StopDto {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.stop_id.clone(),
            name: stop.name.clone(),
            code: stop.code.clone(),
            coordinate: stop.coordinate(),
            distance: None,
        }
    }
}
