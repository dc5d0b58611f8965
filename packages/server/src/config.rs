//! Server configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr as _;
use std::time::Duration;

use civic_map_viewport::DEFAULT_QUERY_TIMEOUT;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::ServerError;

/// Which [`GeometryStore`](civic_map_database::GeometryStore) backs the
/// engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreKind {
    /// `PostGIS` via `DATABASE_URL`.
    #[default]
    Postgis,
    /// In-process R-tree, optionally seeded from a `GeoJSON` file.
    Memory,
}

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
    /// Store backend.
    pub store: StoreKind,
    /// `GeoJSON` file loaded into the memory store.
    pub seed: Option<PathBuf>,
    /// Upper bound on every store call.
    pub query_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            store: StoreKind::default(),
            seed: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `CIVIC_MAP_STORE`, `CIVIC_MAP_SEED` and
    /// `QUERY_TIMEOUT_MS`, falling back to defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| ServerError::config(format!("PORT={port}: {e}")))?,
            None => defaults.port,
        };

        let store = match lookup("CIVIC_MAP_STORE") {
            Some(store) => StoreKind::from_str(&store)
                .map_err(|e| ServerError::config(format!("CIVIC_MAP_STORE={store}: {e}")))?,
            None => defaults.store,
        };

        let query_timeout = match lookup("QUERY_TIMEOUT_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse()
                    .map_err(|e| ServerError::config(format!("QUERY_TIMEOUT_MS={ms}: {e}")))?,
            ),
            None => defaults.query_timeout,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port,
            store,
            seed: lookup("CIVIC_MAP_SEED").map(PathBuf::from),
            query_timeout,
        })
    }
}
