//! Input validation for profile, album, and image payloads.
//!
//! Pure transformation: each input type normalizes itself (trimming,
//! username lower-casing) and then checks its field constraints, producing
//! either the normalized record or an [`OpError::Validation`] carrying
//! field-level reasons.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::error::{FieldError, OpError};

/// Payload for creating or updating a profile.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileInput {
    #[validate(length(min = 2, max = 50, message = "must be 2-50 characters"))]
    pub display_name: String,
    #[validate(length(min = 2, max = 50, message = "must be 2-50 characters"))]
    pub username: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
}

impl ProfileInput {
    /// Normalize and validate.  The username is trimmed and lower-cased
    /// before constraint checking so `" Alice "` and `"alice"` resolve to
    /// the same routing key.
    pub fn normalized(mut self) -> Result<Self, OpError> {
        self.display_name = self.display_name.trim().to_string();
        self.username = self.username.trim().to_lowercase();
        self.validate().map_err(field_errors)?;
        Ok(self)
    }
}

/// Payload for creating or updating an album.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AlbumInput {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub album_order: Option<i64>,
}

impl AlbumInput {
    pub fn normalized(mut self) -> Result<Self, OpError> {
        self.title = self.title.trim().to_string();
        self.validate().map_err(field_errors)?;
        Ok(self)
    }
}

/// Payload for creating or updating an image.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImageInput {
    #[validate(length(min = 2, max = 2000, message = "must be 2-2000 characters"))]
    pub image_url: String,
    #[validate(length(min = 2, max = 50, message = "must be 2-50 characters"))]
    pub alt_text: String,
    #[validate(length(min = 2, max = 150, message = "must be 2-150 characters"))]
    pub caption: String,
    pub image_order: i64,
}

impl ImageInput {
    pub fn normalized(self) -> Result<Self, OpError> {
        self.validate().map_err(field_errors)?;
        Ok(self)
    }
}

fn field_errors(errors: ValidationErrors) -> OpError {
    let mut fields = Vec::new();
    for (field, errs) in errors.field_errors() {
        for err in errs {
            let reason = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string());
            fields.push(FieldError {
                field: field.to_string(),
                reason,
            });
        }
    }
    OpError::Validation(fields)
}
