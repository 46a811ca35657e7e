//! Authentication handlers: register, login, current user, mock OTP

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::auth::AuthUser;
use crate::api::errors::ApiError;
use crate::api::server::AppState;
use crate::api::validation::{require_field, validate_aadhaar, validate_mobile};
use crate::identity::{NewUser, UserProfile};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    #[allow(dead_code)]
    pub mobile: Option<String>,
    pub otp: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    require_field("name", &body.name)?;
    validate_mobile(&body.mobile)?;
    validate_aadhaar(&body.aadhaar_no)?;

    let (token, user) = state.identity.register(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user: UserProfile::from(&user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (token, user) = state.identity.login(&body.mobile, &body.password).await?;
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: UserProfile::from(&user),
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state
        .identity
        .find(&caller.user_id)
        .await?
        .ok_or(ApiError::not_found("user not found"))?;
    let transactions = state.engine.list(&caller.user_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "mobile": user.mobile,
            "address": user.address,
            "transactions": transactions,
        }
    })))
}

/// POST /api/auth/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<OtpRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.identity.verify_otp(&body.otp) {
        Ok(Json(serde_json::json!({
            "success": true,
            "message": "OTP verified successfully"
        })))
    } else {
        Err(ApiError::bad_request("Invalid OTP"))
    }
}
