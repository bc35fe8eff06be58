//! Profile handlers.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::ErrorKind;
use crate::ops;
use crate::validate::ProfileInput;
use crate::web::state::SharedState;
use crate::web::utils::{api_error, resolve_principal, respond_op_error};

pub async fn create_profile_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(input): axum::Json<ProfileInput>,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::profiles::create_profile(&state, principal.as_ref(), input).await {
        Ok(row) => (StatusCode::CREATED, axum::Json(row)).into_response(),
        Err(e) => respond_op_error(e, "create profile"),
    }
}

pub async fn get_own_profile_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::profiles::get_own_profile(&state, principal.as_ref()).await {
        Ok(Some(row)) => (StatusCode::OK, axum::Json(row)).into_response(),
        Ok(None) => api_error(
            StatusCode::NOT_FOUND,
            ErrorKind::NotFoundOrUnauthorized,
            "no profile yet",
        ),
        Err(e) => respond_op_error(e, "load profile"),
    }
}

pub async fn update_profile_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    axum::Json(input): axum::Json<ProfileInput>,
) -> Response {
    let principal = resolve_principal(&state, &headers).await;
    match ops::profiles::update_profile(&state, principal.as_ref(), input).await {
        Ok(row) => (StatusCode::OK, axum::Json(row)).into_response(),
        Err(e) => respond_op_error(e, "update profile"),
    }
}

/// Public profile page data: the profile plus its albums, resolved by
/// username.
pub async fn get_public_profile_handler(
    State(state): State<SharedState>,
    Path(username): Path<String>,
) -> Response {
    let profile = match ops::profiles::get_profile_by_username(&state, &username).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            return api_error(
                StatusCode::NOT_FOUND,
                ErrorKind::NotFoundOrUnauthorized,
                "profile not found",
            )
        }
        Err(e) => return respond_op_error(e, "load profile"),
    };

    let albums = match ops::albums::get_albums(&state, &profile.owner_id).await {
        Ok(albums) => albums,
        Err(e) => return respond_op_error(e, "load albums"),
    };

    let body = serde_json::json!({
        "profile": profile,
        "albums": albums,
    });
    (StatusCode::OK, axum::Json(body)).into_response()
}
