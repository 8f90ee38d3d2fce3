//! Tablekeeper API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dev_seed;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use axum::Router;
use tablekeeper_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, CatalogBackend, init_tracing};
use crate::api_router::build_router;
use crate::api_services::{
    build_app_state, build_memory_session_layer, build_postgres_session_layer,
    connect_and_migrate, memory_ports, postgres_ports,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let app = match config.catalog_backend {
        CatalogBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                AppError::Validation("DATABASE_URL is required".to_owned())
            })?;
            let pool = connect_and_migrate(database_url).await?;

            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }

            let session_layer =
                build_postgres_session_layer(pool.clone(), config.cookie_secure).await?;
            let app_state = build_app_state(postgres_ports(pool, &config)?, &config);
            build_router(app_state, &config.frontend_url, session_layer)?
        }
        CatalogBackend::Memory => {
            info!("using in-memory catalog backend with seeded sample tables");
            let session_layer = build_memory_session_layer(config.cookie_secure);
            let app_state = build_app_state(memory_ports(&config.table_prefix), &config);
            build_router(app_state, &config.frontend_url, session_layer)?
        }
    };

    serve(app, &config).await
}

async fn serve(app: Router, config: &ApiConfig) -> Result<(), AppError> {
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "tablekeeper-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
