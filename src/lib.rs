pub mod ai;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;

use ai::{Advisor, GeminiClient};
use anyhow::{Context, Result};
use config::{Config, DatabaseLocation};
use db::Database;
use routes::AppState;
use std::sync::Arc;

/// Open the database named by the configuration, creating the schema if needed.
pub fn open_database(location: &DatabaseLocation) -> Result<Database> {
    let db = match location {
        DatabaseLocation::Memory => Database::open_in_memory(),
        DatabaseLocation::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            Database::open(path)
        }
    };
    db.with_context(|| format!("Failed to open database at {}", location))
}

/// Build the shared state: one database handle and one provider client for
/// the whole process.
pub fn build_state(config: &Config) -> Result<AppState> {
    let db = Arc::new(open_database(&config.database_url)?);
    let client = GeminiClient::new(config.gemini_settings())
        .context("Failed to create Gemini client")?;
    let advisor = Advisor::new(db.clone(), Arc::new(client), config.advisor_options());

    Ok(AppState {
        db,
        advisor: Arc::new(advisor),
    })
}

/// Serve the API until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let state = build_state(&config)?;
    log::info!("Database: {}", config.database_url);
    log::info!("Advice model: {} (temperature {})", config.model, config.temperature);

    log::info!("CORS origins: {}", config.cors_origins.join(", "));

    let app = routes::router(state, &config.cors_origins);
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    log::info!("Serving SmartFinance API on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
