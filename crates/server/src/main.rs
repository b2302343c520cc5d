mod api;
mod dto;
mod state;

use crate::state::{AppState, Downloads};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{fs::File, io::BufReader, path::PathBuf, sync::Arc, time::Instant};
use tracing::{error, info};
use transito::prelude::*;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE: &str = "transito.db";
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    info!("Starting server...");
    let args: Vec<_> = std::env::args().collect();
    let database = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));
    let port = match std::env::var("PORT") {
        Ok(value) => match value.parse::<u16>() {
            Ok(port) => port,
            Err(err) => {
                error!("Invalid PORT {value}: {err}");
                std::process::exit(1);
            }
        },
        Err(_) => DEFAULT_PORT,
    };

    let now = Instant::now();
    let store = match Store::open(StoreConfig::file(&database)).await {
        Ok(store) => store,
        Err(err) => {
            error!("Failed to open {}: {err}", database.display());
            std::process::exit(1);
        }
    };
    info!("Opening store took {:?}", now.elapsed());

    let repository = Repository::new(store.clone());
    let imports = ImportManager::new(Importer::new(store, GtfsConfig::default()));

    if let Some(feed) = args.get(2) {
        match File::open(feed) {
            Ok(file) => {
                let started = imports.start(BufReader::new(file)).await;
                info!(id = started.id, "Importing {feed}");
            }
            Err(err) => {
                error!("Failed to open {feed}: {err}");
                std::process::exit(1);
            }
        }
    }

    let state = Arc::new(AppState {
        repository,
        imports,
        downloads: Downloads::new(&database),
    });

    let app = axum::Router::new()
        .route("/search", get(api::search_stops))
        .route("/routes/search", get(api::search_routes))
        .route("/near", get(api::near))
        .route("/bounds", get(api::bounds))
        .route("/stops/{id}", get(api::stop))
        .route("/stops/{id}/departures", get(api::departures))
        .route("/calendars/active", get(api::active_calendars))
        .route("/stats", get(api::stats))
        .route(
            "/import",
            post(api::import_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/import/url", post(api::import_url))
        .route("/import/status", get(api::import_status))
        .with_state(state);
    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind port {port}: {err}");
            std::process::exit(1);
        }
    };
    info!("Listening to port {port}");
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server stopped: {err}");
    }
}
