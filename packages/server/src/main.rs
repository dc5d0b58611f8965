#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Civic map API server binary.

use std::path::PathBuf;
use std::time::Duration;

use civic_map_server::config::{ServerConfig, StoreKind};
use clap::Parser;

/// Serves the civic map viewport endpoints.
///
/// Every option falls back to its environment variable, then to a default.
#[derive(Parser, Debug)]
#[command(name = "civic_map_server", version, about)]
struct Cli {
    /// Interface to bind (`BIND_ADDR`)
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (`PORT`)
    #[arg(long)]
    port: Option<u16>,

    /// Store backend: `postgis` or `memory` (`CIVIC_MAP_STORE`)
    #[arg(long)]
    store: Option<StoreKind>,

    /// `GeoJSON` file to load into the memory store (`CIVIC_MAP_SEED`)
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Per-query timeout in milliseconds (`QUERY_TIMEOUT_MS`)
    #[arg(long)]
    query_timeout_ms: Option<u64>,
}

impl Cli {
    fn apply(self, mut config: ServerConfig) -> ServerConfig {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(store) = self.store {
            config.store = store;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ms) = self.query_timeout_ms {
            config.query_timeout = Duration::from_millis(ms);
        }
        config
    }
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();
    let config = cli.apply(ServerConfig::from_env()?);

    civic_map_server::run_server(config).await?;

    Ok(())
}
