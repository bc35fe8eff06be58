//! Route handler modules for the aperture REST API.

pub mod albums;
pub mod health;
pub mod images;
pub mod profiles;
pub mod uploads;
