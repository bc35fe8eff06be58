//! Album handlers.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::ErrorKind;
use crate::ops;
use crate::validate::AlbumInput;
use crate::web::state::SharedState;
use crate::web::utils::{api_error, resolve_principal, respond_op_error};

#[derive(Deserialize)]
pub struct ListAlbumsQuery {
    pub owner: String,
}

/// Public listing of one owner's albums.
pub async fn list_albums_handler(
    State(state): State<SharedState>,
    Query(query): Query<ListAlbumsQuery>,
) -> Response {
    match ops::albums::get_albums(&state, &query.owner).await {
        Ok(albums) => (StatusCode::OK, axum::Json(albums)).into_response(),
        Err(e) => respond_op_error(e, "load albums"),
    }
}

pub async fn create_album_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(input): axum::Json<AlbumInput>,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::albums::create_album(&state, principal.as_ref(), input).await {
        Ok(row) => (StatusCode::CREATED, axum::Json(row)).into_response(),
        Err(e) => respond_op_error(e, "create album"),
    }
}

pub async fn get_album_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    match ops::albums::get_album(&state, &id).await {
        Ok(Some(row)) => (StatusCode::OK, axum::Json(row)).into_response(),
        Ok(None) => api_error(
            StatusCode::NOT_FOUND,
            ErrorKind::NotFoundOrUnauthorized,
            "album not found",
        ),
        Err(e) => respond_op_error(e, "load album"),
    }
}

pub async fn update_album_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    axum::Json(input): axum::Json<AlbumInput>,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::albums::update_album(&state, principal.as_ref(), &id, input).await {
        Ok(row) => (StatusCode::OK, axum::Json(row)).into_response(),
        Err(e) => respond_op_error(e, "update album"),
    }
}

pub async fn delete_album_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::albums::delete_album(&state, principal.as_ref(), &id).await {
        Ok(()) => {
            let body = serde_json::json!({ "status": "deleted", "id": id });
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(e) => respond_op_error(e, "delete album"),
    }
}
