//! Upload grant handler.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::ops;
use crate::web::state::SharedState;
use crate::web::utils::{resolve_principal, respond_op_error};

#[derive(Deserialize)]
pub struct UploadGrantRequest {
    pub file_name: String,
    pub content_type: String,
    pub album_id: String,
}

pub async fn upload_grant_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<UploadGrantRequest>,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::uploads::create_upload_grant(
        &state,
        principal.as_ref(),
        &req.file_name,
        &req.content_type,
        &req.album_id,
    )
    .await
    {
        Ok(grant) => (StatusCode::CREATED, axum::Json(grant)).into_response(),
        Err(e) => respond_op_error(e, "issue upload grant"),
    }
}
