//! Bearer-token extraction
//!
//! Token validity (signature and expiry) is checked here, at the request
//! boundary; handlers and the workflow engine only ever see an already
//! authenticated user id.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::errors::ApiError;
use super::server::AppState;

/// The authenticated caller, extracted from the `Authorization` header
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no token provided"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Not authorized, no token provided"))?;

        let user_id = state.identity.verify_token(token)?;
        Ok(AuthUser { user_id })
    }
}
