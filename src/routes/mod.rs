mod auth;
mod health;
mod middlewares;
mod record;
mod swagger;
mod user;
use crate::database;
use anyhow::{anyhow, Context};
use health::{health_checker_handler, root_handler};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{AppState, Config};

use axum::{routing::get, Router};
use std::sync::Arc;

/// Assembles every route around an already built state
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_checker_handler))
        .merge(auth::auth_routes())
        .merge(record::record_routes(state.clone()))
        .merge(user::user_routes(state.clone()))
        .merge(swagger::build_documentation())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Connects to the database, applies migrations, seeds the admin account and builds the router
pub async fn make_app(config: Config) -> anyhow::Result<Router> {
    info!("Connecting to PostgreSQL...");
    let sqlx_db_connection = database::connect_sqlx(&config.db_url)
        .await
        .context("Could not connect to the database")?;
    info!("Connected to PostgreSQL!");

    let db = database::PostgreDatabase::new(sqlx_db_connection);
    db.migrate()
        .await
        .context("Could not apply database migrations")?;
    info!("Database schema is up to date");

    let state = Arc::new(AppState::new(db, config));
    if let Some(seed) = &state.config.admin_seed {
        user::seed_admin(&state, seed)
            .await
            .map_err(|err| anyhow!("Could not create admin account: {}", err.message))?;
    }

    Ok(app_router(state))
}
