use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::adapters::http::state::HttpState;
use crate::application::dto::ToggleResponse;

pub async fn get_state(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.detection.snapshot())
}

pub async fn toggle_detection(State(st): State<HttpState>) -> impl IntoResponse {
    let detecting = st.detection.toggle();
    Json(ToggleResponse { detecting })
}

pub async fn get_blob(State(st): State<HttpState>, Path(id): Path<String>) -> impl IntoResponse {
    match st.blobs.get(&id) {
        Some(blob) => (
            [(header::CONTENT_TYPE, blob.mime.clone())],
            blob.bytes.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "blob not found").into_response(),
    }
}
