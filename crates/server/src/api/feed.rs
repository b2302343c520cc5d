use crate::{
    api::internal,
    dto::{ImportStartedDto, StatsDto},
    state::AppState,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;
use reqwest::header::ACCEPT_ENCODING;
use std::{
    collections::HashMap,
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{error, info, warn};
use transito::prelude::*;

/// `date` is "YYYYMMDD" and defaults to today.
pub async fn active_calendars(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let date = match params.get("date") {
        Some(value) => ServiceDate::parse(value).ok_or(StatusCode::BAD_REQUEST)?,
        None => ServiceDate::today(),
    };
    let result = state
        .repository
        .active_calendars(&date.to_gtfs_string())
        .await
        .map_err(internal)?;
    Ok(Json(result).into_response())
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    let counts = state.repository.statistics().await.map_err(internal)?;
    let store = state.imports.store_state().await.map_err(internal)?;
    Ok(Json(StatsDto { store, counts }).into_response())
}

pub async fn import_status(State(state): State<Arc<AppState>>) -> Response {
    Json(state.imports.status()).into_response()
}

/// Imports the request body as a GTFS zip, superseding any running import.
pub async fn import_upload(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, StatusCode> {
    if body.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    info!(bytes = body.len(), "Received feed upload");
    let started = state.imports.start(Cursor::new(body)).await;
    Ok((StatusCode::ACCEPTED, Json(ImportStartedDto::from(started))).into_response())
}

/// Downloads the zip at `q`, then imports it like an upload.
pub async fn import_url(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let Some(q) = params.get("q") else {
        return Err(StatusCode::BAD_REQUEST);
    };
    let response = reqwest::Client::new()
        .get(q)
        .header(ACCEPT_ENCODING, "gzip, deflate")
        .send()
        .await
        .map_err(|err| {
            error!("Failed to fetch: {err}");
            StatusCode::BAD_REQUEST
        })?;

    if !response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        error!("Response is not success: {body}");
        return Err(StatusCode::BAD_REQUEST);
    }

    let path = state.downloads.next_path();
    if let Err(status) = download(response, &path).await {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(status);
    }

    let file = std::fs::File::open(&path).map_err(|err| {
        error!("Failed to reopen download: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let started = state.imports.start(std::io::BufReader::new(file)).await;
    remove_when_finished(state.imports.clone(), started.id, path);
    Ok((StatusCode::ACCEPTED, Json(ImportStartedDto::from(started))).into_response())
}

async fn download(response: reqwest::Response, path: &Path) -> Result<(), StatusCode> {
    let mut file = File::create(path).await.map_err(|err| {
        error!("Failed to create file: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let data = chunk.map_err(|err| {
            error!("Failed to fetch chunk: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        file.write_all(&data).await.map_err(|err| {
            error!("Failed to write to file: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    }

    file.flush().await.map_err(|err| {
        error!("Failed to flush file: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Deletes the downloaded feed once import `id` has stopped, either on its own
/// or because a later import superseded it.
fn remove_when_finished(imports: ImportManager, id: u64, path: PathBuf) {
    tokio::spawn(async move {
        let mut statuses = imports.subscribe();
        let _ = statuses
            .wait_for(|status| match status.id() {
                Some(current) if current == id => status.is_finished(),
                Some(current) => current > id,
                None => false,
            })
            .await;
        if let Err(err) = tokio::fs::remove_file(&path).await {
            warn!("Failed to remove {}: {err}", path.display());
        }
    });
}
