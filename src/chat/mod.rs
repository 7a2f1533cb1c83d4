mod msg;
mod page;
pub mod store;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use store::{Message, OutgoingMessage};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat/{doctor_id}/", get(page::chat).post(msg::send))
        .route("/chat/{doctor_id}/read/", post(page::read))
}
