//! Axum router construction.

use axum::routing::{get, post, put};
use axum::Router;

use crate::web::handlers;
use crate::web::state::SharedState;

/// Build the complete Axum router with all API routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(handlers::health::health_handler))
        // Profiles API
        .route(
            "/api/profile",
            get(handlers::profiles::get_own_profile_handler)
                .post(handlers::profiles::create_profile_handler)
                .put(handlers::profiles::update_profile_handler),
        )
        .route(
            "/api/profiles/:username",
            get(handlers::profiles::get_public_profile_handler),
        )
        // Albums API
        .route(
            "/api/albums",
            get(handlers::albums::list_albums_handler).post(handlers::albums::create_album_handler),
        )
        .route(
            "/api/albums/:id",
            get(handlers::albums::get_album_handler)
                .put(handlers::albums::update_album_handler)
                .delete(handlers::albums::delete_album_handler),
        )
        // Images API
        .route(
            "/api/albums/:id/images",
            get(handlers::images::list_images_handler)
                .post(handlers::images::create_image_handler),
        )
        .route(
            "/api/images/:id",
            put(handlers::images::update_image_handler),
        )
        .route(
            "/api/images",
            axum::routing::delete(handlers::images::delete_image_handler),
        )
        // Uploads API
        .route(
            "/api/uploads/grant",
            post(handlers::uploads::upload_grant_handler),
        )
        .with_state(state)
}
