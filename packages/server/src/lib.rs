#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the civic map.
//!
//! Exposes the viewport engine's read endpoints under `/api/gis`. Every
//! endpoint takes the same viewport query parameters; the caller's role and
//! agency come from headers set by the authenticating gateway.

pub mod caller;
pub mod config;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use civic_map_database::queries::PostgisStore;
use civic_map_database::{GeometryStore, db};
use civic_map_server_models::ApiError;
use civic_map_spatial::{MemoryStore, StoreLoadError};
use civic_map_viewport::ViewportEngine;

use crate::config::{ServerConfig, StoreKind};

/// Errors that can occur while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Invalid configuration value.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// Could not connect to the database.
    #[error("Failed to connect to database: {message}")]
    Connect {
        /// Description of what went wrong.
        message: String,
    },

    /// Could not load the seed file into the memory store.
    #[error(transparent)]
    Seed(#[from] StoreLoadError),

    /// HTTP server I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Engine answering every viewport endpoint.
    pub engine: ViewportEngine,
}

/// Opens the store selected by `config`.
///
/// # Errors
///
/// * [`ServerError::Connect`] if the `PostGIS` connection fails
/// * [`ServerError::Seed`] if the seed file cannot be loaded
#[allow(clippy::future_not_send)]
pub async fn open_store(config: &ServerConfig) -> Result<Arc<dyn GeometryStore>, ServerError> {
    match config.store {
        StoreKind::Postgis => {
            log::info!("Connecting to database...");
            let db = db::connect_from_env(config.query_timeout)
                .await
                .map_err(|e| ServerError::Connect {
                    message: e.to_string(),
                })?;
            Ok(Arc::new(PostgisStore::new(Arc::from(db))))
        }
        StoreKind::Memory => {
            let store = match &config.seed {
                Some(path) => {
                    log::info!("Loading seed complaints from {}", path.display());
                    MemoryStore::from_geojson_file(path)?
                }
                None => {
                    log::warn!("Memory store started without a seed file; it is empty");
                    MemoryStore::empty()
                }
            };
            log::info!("Memory store holds {} complaints", store.len());
            Ok(Arc::new(store))
        }
    }
}

/// Rejects malformed query strings with an [`ApiError`] body.
fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError {
            error: format!("Invalid query: {err}"),
        });
        InternalError::from_response(err, response).into()
    })
}

/// Registers the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(query_config())
            .route("/health", web::get().to(handlers::health))
            .service(
                web::scope("/gis")
                    .route("/map-items", web::get().to(handlers::map_items))
                    .route("/hotspots", web::get().to(handlers::hotspots))
                    .route("/districts", web::get().to(handlers::districts))
                    .route("/complaints", web::get().to(handlers::complaints)),
            ),
    );
}

/// Starts the civic map API server.
///
/// Opens the configured store and serves until shut down. The caller is
/// responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the store cannot be opened or the HTTP server
/// fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let store = open_store(&config).await?;

    let state = web::Data::new(AppState {
        engine: ViewportEngine::new(store, config.query_timeout),
    });

    log::info!(
        "Starting server on {}:{} ({} store, {}ms query timeout)",
        config.bind_addr,
        config.port,
        config.store,
        config.query_timeout.as_millis()
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
