use serde::Serialize;
use transito::gtfs::models::Route;

#[derive(Debug, Clone, Serialize)]
pub struct RouteDto {
    pub id: String,
    pub agency_id: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub route_type: i32,
    pub color: Option<String>,
    pub text_color: Option<String>,
}

impl From<&Route> for RouteDto {
    fn from(route: &Route) -> Self {
        Self {
            id: route.route_id.clone(),
            agency_id: route.agency_id.clone(),
            short_name: route.short_name.clone(),
            long_name: route.long_name.clone(),
            route_type: route.route_type,
            color: route.color.clone(),
            text_color: route.text_color.clone(),
        }
    }
}
