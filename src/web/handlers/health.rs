//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::web::state::SharedState;

pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let storage = state.storage.lock().await;
    let profiles = storage.count_profiles().unwrap_or(0);
    let albums = storage.count_albums().unwrap_or(0);
    drop(storage);

    let body = serde_json::json!({
        "status": "ok",
        "profiles": profiles,
        "albums": albums,
    });
    (StatusCode::OK, axum::Json(body))
}
