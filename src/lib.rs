pub mod auth;
pub mod error;
pub mod invalidate;
pub mod logging;
pub mod object_store;
pub mod ops;
pub mod storage;
pub mod validate;
pub mod web;
