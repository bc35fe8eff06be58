//! Integration tests for profile operations and upload grants.
//!
//! Tests cover:
//! - Profile create/read round trip, bio defaulting, avatar fallback
//! - Username normalization and uniqueness at the persistence boundary
//! - Public resolution by username vs. private resolution by principal
//! - Upload grant key format: `{album_id}-` prefix and sanitized file name

use std::sync::Arc;

use tokio::sync::Mutex;

use aperture::auth::Principal;
use aperture::error::OpError;
use aperture::invalidate::ViewInvalidator;
use aperture::object_store::MemoryObjectStore;
use aperture::ops;
use aperture::storage::Storage;
use aperture::validate::ProfileInput;
use aperture::web::state::AppState;

fn principal(id: &str, avatar: Option<&str>) -> Principal {
    Principal {
        id: id.to_string(),
        avatar_url: avatar.map(str::to_string),
    }
}

fn make_state() -> (AppState, Arc<MemoryObjectStore>) {
    let objects = Arc::new(MemoryObjectStore::new("portfolio", "us-east-1"));
    let state = AppState {
        storage: Mutex::new(Storage::open_in_memory().expect("in-memory db")),
        objects: objects.clone(),
        oracle: Arc::new(aperture::auth::StaticOracle::new(Vec::new())),
        invalidator: ViewInvalidator::new(64),
    };
    (state, objects)
}

fn profile_input(display_name: &str, username: &str) -> ProfileInput {
    ProfileInput {
        display_name: display_name.to_string(),
        username: username.to_string(),
        bio: None,
        image_url: None,
    }
}

#[tokio::test]
async fn profile_create_defaults_bio_and_avatar() {
    let (state, _) = make_state();
    let u1 = principal("user-1", Some("https://avatars/u1.png"));

    let created = ops::profiles::create_profile(&state, Some(&u1), profile_input("Alice", "Alice"))
        .await
        .unwrap();
    assert_eq!(created.owner_id, "user-1");
    assert_eq!(created.username, "alice"); // lower-cased routing key
    assert_eq!(created.bio, "Welcome to my profile!");
    assert_eq!(created.image_url.as_deref(), Some("https://avatars/u1.png"));

    let own = ops::profiles::get_own_profile(&state, Some(&u1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(own.id, created.id);

    let public = ops::profiles::get_profile_by_username(&state, "alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(public.id, created.id);
}

#[tokio::test]
async fn duplicate_username_fails_at_the_persistence_boundary() {
    let (state, _) = make_state();
    let u1 = principal("user-1", None);
    let u2 = principal("user-2", None);

    ops::profiles::create_profile(&state, Some(&u1), profile_input("Alice", "alice"))
        .await
        .unwrap();

    // Normalization makes " ALICE " collide with "alice".
    let result =
        ops::profiles::create_profile(&state, Some(&u2), profile_input("Other Alice", " ALICE "))
            .await;
    assert!(matches!(result, Err(OpError::Database(_))));
}

#[tokio::test]
async fn own_profile_requires_a_principal() {
    let (state, _) = make_state();
    let result = ops::profiles::get_own_profile(&state, None).await;
    assert!(matches!(result, Err(OpError::Unauthenticated)));
}

#[tokio::test]
async fn profile_update_is_owner_scoped() {
    let (state, _) = make_state();
    let u1 = principal("user-1", None);
    let ghost = principal("never-created", None);

    ops::profiles::create_profile(&state, Some(&u1), profile_input("Alice", "alice"))
        .await
        .unwrap();

    // A principal without a profile matches zero rows.
    let result =
        ops::profiles::update_profile(&state, Some(&ghost), profile_input("Ghost", "ghost")).await;
    assert!(matches!(result, Err(OpError::NotFoundOrUnauthorized)));

    let updated = ops::profiles::update_profile(
        &state,
        Some(&u1),
        ProfileInput {
            display_name: "Alice B".to_string(),
            username: "alice".to_string(),
            bio: Some("Shooting film since 2019".to_string()),
            image_url: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.display_name, "Alice B");
    assert_eq!(updated.bio, "Shooting film since 2019");
}

#[tokio::test]
async fn validation_failure_carries_field_reasons_internally() {
    let (state, _) = make_state();
    let u1 = principal("user-1", None);

    let result =
        ops::profiles::create_profile(&state, Some(&u1), profile_input("A", "alice")).await;
    match result {
        Err(OpError::Validation(fields)) => {
            assert_eq!(fields[0].field, "display_name");
        }
        other => panic!("expected validation failure, got {other:?}"),
    }

    // At the API boundary it renders the same generic message as a missing
    // principal.
    let validation_msg = ops::profiles::create_profile(&state, Some(&u1), profile_input("A", "alice"))
        .await
        .unwrap_err()
        .into_api("create profile")
        .message;
    let unauth_msg = ops::profiles::create_profile(&state, None, profile_input("Alice", "alice"))
        .await
        .unwrap_err()
        .into_api("create profile")
        .message;
    assert_eq!(validation_msg, unauth_msg);
}

#[tokio::test]
async fn upload_grant_uses_album_prefix_and_sanitized_name() {
    let (state, objects) = make_state();
    let u1 = principal("user-1", None);

    let grant = ops::uploads::create_upload_grant(
        &state,
        Some(&u1),
        "My Photo.png",
        "image/png",
        "A123",
    )
    .await
    .unwrap();

    assert!(grant.object_key.starts_with("A123-"));
    assert!(grant.object_key.ends_with("-My_Photo.png"));
    assert!(grant.public_url.contains("A123-"));
    assert!(grant.public_url.contains("My_Photo.png"));
    assert!(!grant.public_url.contains(' '));
    assert_eq!(grant.expires_in_secs, 60);
    assert_eq!(
        grant.public_url,
        format!("https://portfolio.s3.us-east-1.amazonaws.com/{}", grant.object_key)
    );

    // The store saw a presign request for exactly this key.
    assert_eq!(objects.presigned_keys(), vec![grant.object_key.clone()]);
}

#[tokio::test]
async fn upload_grant_requires_a_principal() {
    let (state, _) = make_state();
    let result =
        ops::uploads::create_upload_grant(&state, None, "a.png", "image/png", "A123").await;
    assert!(matches!(result, Err(OpError::Unauthenticated)));
}
