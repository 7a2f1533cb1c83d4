mod requests;
pub mod store;

use axum::{routing::get, Router};

use crate::AppState;

pub use store::{Connection, ConnectionStatus, Relation};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connect/{doctor_id}/", get(requests::connect))
        .route("/accept/{conn_id}/", get(requests::accept))
}
