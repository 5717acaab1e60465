pub mod api; // REST surface for the front desk SPA
pub mod appointment;
pub mod auth; // Staff accounts + bearer sessions
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod directory; // Specialties + doctors
pub mod intake; // Patient form normalization
pub mod models;
pub mod patient;
pub mod templates; // Consents, evolutions, prescriptions, custom forms

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::core_state::{CoreError, CoreState};

/// Process entry: logging, settings, schema, then serve until Ctrl-C.
pub async fn run() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = Settings::from_env()?;
    let bind_addr = settings.bind_addr;
    let core = Arc::new(CoreState::initialize(settings)?);

    let mut server = api::start_api_server_on(core, bind_addr)
        .await
        .map_err(CoreError::Server)?;
    tracing::info!(addr = %server.session.server_addr, "listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl-C: {e}");
    }
    server.shutdown();
    server.wait().await;

    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
