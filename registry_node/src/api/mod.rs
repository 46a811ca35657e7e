//! HTTP API surface

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod server;
pub mod validation;

pub use errors::ApiError;
pub use server::{build_router, serve, AppState};
