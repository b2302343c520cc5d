use std::{collections::HashMap, sync::Arc};

use crate::{
    api::{internal, param},
    dto::{RouteDto, StopDto},
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use transito::repository::DEFAULT_SEARCH_LIMIT;

pub async fn search_stops(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    if let Some(query) = params.get("q") {
        let count = param(&params, "count")?.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let result: Vec<_> = state
            .repository
            .search_stops(query, count)
            .await
            .map_err(internal)?
            .iter()
            .map(StopDto::from)
            .collect();
        Ok(Json(result).into_response())
    } else {
        Err(StatusCode::BAD_REQUEST)
    }
}

pub async fn search_routes(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    if let Some(query) = params.get("q") {
        let count = param(&params, "count")?.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let result: Vec<_> = state
            .repository
            .search_routes(query, count)
            .await
            .map_err(internal)?
            .iter()
            .map(RouteDto::from)
            .collect();
        Ok(Json(result).into_response())
    } else {
        Err(StatusCode::BAD_REQUEST)
    }
}
