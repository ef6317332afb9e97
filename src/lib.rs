//! boxd — Letterboxd favourites scraper and sync API.
//!
//! Renders a profile's favourites shelf with a headless browser, extracts
//! poster records, and reconciles them into SQLite behind a JWT-gated REST
//! surface.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod services;

use axum::{
    extract::State,
    http::{header, Method},
    middleware as axum_mw,
    routing::{delete, get, post, put},
    Json, Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use config::Config;
use services::{AuthService, ImageOptimizer, PageRenderer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<Mutex<Connection>>,
    pub auth: Arc<AuthService>,
    pub renderer: Arc<dyn PageRenderer>,
    pub images: ImageOptimizer,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub database: &'static str,
}

/// GET /health — liveness plus backing-store identity, no auth required.
pub async fn health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        database: "sqlite",
    })
}

/// Build the application router.
///
/// Every route group except the health check is layered with the bearer
/// token middleware.
pub fn router(state: AppState) -> Router {
    let scrape_routes = Router::new()
        .route("/favourites", get(api::scrape::scrape_favourites))
        .route("/favourites/save", post(api::scrape::save_favourites))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let movies_routes = Router::new()
        .route(
            "/",
            get(api::movies::list_movies).post(api::movies::save_movie),
        )
        .route("/favourites", get(api::movies::list_favourites))
        .route("/saved", get(api::movies::list_saved))
        .route("/{id}/status", put(api::movies::update_status))
        .route("/{id}", delete(api::movies::delete_movie))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_check))
        .nest("/scrape", scrape_routes)
        .nest("/movies", movies_routes)
        .layer(cors)
        .with_state(state)
}
