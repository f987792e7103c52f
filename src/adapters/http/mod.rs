pub mod routes;
pub mod state;
pub mod ws;

use axum::{routing::{get, post}, Router};
use crate::adapters::http::state::HttpState;
use crate::adapters::http::ws::ws_handler;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/state", get(routes::get_state))
        .route("/api/detection/toggle", post(routes::toggle_detection))
        .route("/api/blobs/:id", get(routes::get_blob))
        .route("/ws/stream", get(ws_handler))
        .with_state(state)
}
