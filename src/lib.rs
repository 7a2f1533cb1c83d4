pub mod appresult;
pub mod auth;
pub mod chat;
pub mod config;
pub mod connections;
pub mod db;
pub mod doctors;
pub mod media;
pub mod res;
pub mod reviews;
pub mod session;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::{extract::{DefaultBodyLimit, FromRef}, Router};
use sqlx::SqlitePool;
use tower_http::services::ServeDir;

pub use appresult::{AppError, AppResult};
use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
}

/// Every route of the site, with uploads served from the media root under `/media`.
pub fn router(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media_root);

    Router::new()
        .merge(doctors::router())
        .merge(auth::router())
        .merge(connections::router())
        .merge(chat::router())
        .nest_service("/media", media)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state)
}
