use std::{collections::HashMap, sync::Arc};

use crate::{
    api::{internal, param, required},
    dto::StopDto,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use transito::{
    prelude::*,
    repository::{DEFAULT_DEPARTURES_LIMIT, DEFAULT_NEAREST_LIMIT},
};

pub async fn near(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let coordinate = Coordinate::new(required(&params, "lat")?, required(&params, "lon")?);
    if !coordinate.is_valid() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let count = param(&params, "count")?.unwrap_or(DEFAULT_NEAREST_LIMIT);
    let result: Vec<_> = state
        .repository
        .nearest_stops(&coordinate, count)
        .await
        .map_err(internal)?
        .iter()
        .map(|stop| StopDto::from(stop).with_distance(&coordinate))
        .collect();
    Ok(Json(result).into_response())
}

pub async fn bounds(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let bounds = BoundingBox::new(
        required(&params, "min_lat")?,
        required(&params, "max_lat")?,
        required(&params, "min_lon")?,
        required(&params, "max_lon")?,
    );
    let result: Vec<_> = state
        .repository
        .stops_in_bounds(&bounds)
        .await
        .map_err(internal)?
        .iter()
        .map(StopDto::from)
        .collect();
    Ok(Json(result).into_response())
}

pub async fn stop(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    match state.repository.stop(&id).await.map_err(internal)? {
        Some(stop) => Ok(Json(StopDto::from(&stop)).into_response()),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// `time` is "HH:MM:SS" and defaults to the local time of day.
pub async fn departures(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let time = match params.get("time") {
        Some(value) => Time::from_hms(value).ok_or(StatusCode::BAD_REQUEST)?,
        None => Time::now(),
    };
    let count = param(&params, "count")?.unwrap_or(DEFAULT_DEPARTURES_LIMIT);
    let result = state
        .repository
        .next_departures_with_route_info(&id, &time.to_hms_string(), count)
        .await
        .map_err(internal)?;
    Ok(Json(result).into_response())
}
