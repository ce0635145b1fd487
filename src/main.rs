// src/main.rs
mod api;
mod config;
mod error;
mod model;
mod normalizer;
mod optimizer;
mod registry;
mod shutdown;

use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use api::ApiState;
use config::AppConfig;
use registry::PackSizeRegistry;

const DEFAULT_LOG_FILTER: &str = "pack_planner=info,tower_http=info";

#[tokio::main]
async fn main() -> ExitCode {
    let env_result = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = env_result {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let planner_config = app_config.planner;

    let registry = match PackSizeRegistry::new(planner_config.default_pack_sizes()) {
        Ok(registry) => registry,
        Err(err) => {
            error!("❌ Invalid default pack sizes: {}", err);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "🚀 Pack planner v{} starting with pack sizes {:?}",
        env!("CARGO_PKG_VERSION"),
        registry.pack_sizes()
    );
    let state = ApiState::new(registry, planner_config.planning_config());

    match api::start_api_server(api_config, state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}
