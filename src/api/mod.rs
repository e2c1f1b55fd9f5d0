//! API module
//!
//! HTTP API endpoints and middleware.

use axum::extract::FromRef;
use axum::{middleware as axum_middleware, routing::get, Router};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub mod middleware;
pub mod routes;

/// Shared application state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

/// Build the application router
///
/// Axum layers are applied in reverse order (last added = first executed),
/// so the request path is logging -> auth -> handler.
pub fn build_router(pool: SqlitePool, config: Config) -> Router {
    let state = AppState { pool, config };

    let protected = routes::protected_router().layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::auth_middleware,
    ));

    let api = routes::public_router()
        .merge(protected)
        .layer(axum_middleware::from_fn(middleware::logging_middleware));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
