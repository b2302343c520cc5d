mod feed;
mod search;
mod stops;

pub use feed::*;
pub use search::*;
pub use stops::*;

use axum::http::StatusCode;
use std::{collections::HashMap, str::FromStr};
use tracing::error;

/// Optional query parameter; present but unparsable is a bad request.
fn param<T: FromStr>(params: &HashMap<String, String>, key: &str) -> Result<Option<T>, StatusCode> {
    match params.get(key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| StatusCode::BAD_REQUEST),
        None => Ok(None),
    }
}

fn required<T: FromStr>(params: &HashMap<String, String>, key: &str) -> Result<T, StatusCode> {
    param(params, key)?.ok_or(StatusCode::BAD_REQUEST)
}

fn internal<E: std::fmt::Display>(err: E) -> StatusCode {
    error!("Query failed: {err}");
    StatusCode::INTERNAL_SERVER_ERROR
}
