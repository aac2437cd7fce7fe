use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use drinks_service::config::load_service_config;
use drinks_service::identity::{build_token_validator, spawn_jwks_refresh};
use drinks_service::store::{InMemoryMenuStore, MenuStore, PgMenuStore};
use drinks_service::{build_router, AppState};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_service_config()?;

    let store: Arc<dyn MenuStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            let store = PgMenuStore::new(pool);
            // Ensure database schema is up to date before serving traffic
            store.migrate().await.context("failed to run migrations")?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory drinks store");
            Arc::new(InMemoryMenuStore::new())
        }
    };

    if config.reset_on_start {
        warn!("DRINKS_RESET_ON_START set; dropping all drinks and seeding the sample menu");
        store.reset().await.context("failed to reset drinks store")?;
    }

    let validator = build_token_validator(&config.auth).await?;
    spawn_jwks_refresh(validator.clone(), config.auth.jwks_refresh_seconds);

    let allowed_origins = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%origin, error = %err, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = build_router(AppState::new(store, validator)).layer(cors);

    let addr = config.bind_addr()?;
    info!(%addr, "starting drinks-service");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
