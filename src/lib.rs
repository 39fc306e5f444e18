pub mod calendar;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod tmdb;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{calendar::Calendar, config::Config, tmdb::TmdbClient};

pub struct AppState {
    pub config: Arc<Config>,
    pub calendar: Calendar,
    pub tmdb: TmdbClient,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/mystery_movie", get(routes::mystery_movie))
        .route("/api/mystery_movie", get(routes::api_mystery_movie))
        .route("/api/search", get(routes::search))
        .route("/api/movie/", get(routes::missing_movie_id))
        .route("/api/movie/{movie_id}", get(routes::movie))
        .with_state(state)
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// Builds the outbound HTTP client shared by every TMDB call.
pub fn http_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("mystery-movie/0.1")
        .timeout(config.tmdb_timeout)
        .build()
}
