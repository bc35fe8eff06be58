//! Image handlers.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::ops;
use crate::validate::ImageInput;
use crate::web::state::SharedState;
use crate::web::utils::{resolve_principal, respond_op_error};

/// Public listing of an album's images, ascending by display order.
pub async fn list_images_handler(
    State(state): State<SharedState>,
    Path(album_id): Path<String>,
) -> Response {
    match ops::images::get_images(&state, &album_id).await {
        Ok(images) => (StatusCode::OK, axum::Json(images)).into_response(),
        Err(e) => respond_op_error(e, "load images"),
    }
}

pub async fn create_image_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(album_id): Path<String>,
    axum::Json(input): axum::Json<ImageInput>,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::images::create_image(&state, principal.as_ref(), &album_id, input).await {
        Ok(row) => (StatusCode::CREATED, axum::Json(row)).into_response(),
        Err(e) => respond_op_error(e, "create image"),
    }
}

pub async fn update_image_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(image_id): Path<String>,
    axum::Json(input): axum::Json<ImageInput>,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::images::update_image(&state, principal.as_ref(), &image_id, input).await {
        Ok(row) => (StatusCode::OK, axum::Json(row)).into_response(),
        Err(e) => respond_op_error(e, "update image"),
    }
}

#[derive(Deserialize)]
pub struct DeleteImageRequest {
    pub image_url: String,
    pub album_id: String,
    /// When false, only the stored binary is removed and the row stays
    /// (used when replacing a photo in place).
    #[serde(default = "default_true")]
    pub also_delete_row: bool,
}

fn default_true() -> bool {
    true
}

pub async fn delete_image_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(req): axum::Json<DeleteImageRequest>,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::images::delete_image(
        &state,
        principal.as_ref(),
        &req.image_url,
        &req.album_id,
        req.also_delete_row,
    )
    .await
    {
        Ok(()) => {
            let body = serde_json::json!({ "status": "deleted" });
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(e) => respond_op_error(e, "delete image"),
    }
}
