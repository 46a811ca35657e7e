//! API error envelope and the mapping from domain errors to HTTP codes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::artifacts::ArtifactError;
use crate::identity::IdentityError;
use crate::workflow::WorkflowError;

/// Structured API error returned for every failure path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub timestamp: u64,
}

impl ApiError {
    pub fn new(code: u16, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            timestamp: chrono::Utc::now().timestamp() as u64,
        }
    }

    pub fn with_details(code: u16, message: String, details: serde_json::Value) -> Self {
        Self {
            code,
            message,
            details: Some(details),
            timestamp: chrono::Utc::now().timestamp() as u64,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(400, message.to_string())
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(401, message.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(404, message.to_string())
    }

    pub fn conflict(message: &str) -> Self {
        Self::new(409, message.to_string())
    }

    pub fn internal_server_error(message: &str) -> Self {
        Self::new(500, message.to_string())
    }

    pub fn bad_gateway(message: &str) -> Self {
        Self::new(502, message.to_string())
    }

    /// The one response every transaction-id route returns when the record
    /// is absent or belongs to someone else. Keeping a single constructor
    /// keeps the two cases byte-identical.
    pub fn transaction_unauthorized() -> Self {
        Self::new(401, "Not authorized to access this transaction".to_string())
    }

    pub fn invalid_state(operation: &str, status: &str) -> Self {
        Self::with_details(
            409,
            "Invalid transaction state for this operation".to_string(),
            serde_json::json!({
                "operation": operation,
                "status": status,
            }),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(msg) => Self::bad_request(&msg),
            WorkflowError::Unauthorized => Self::transaction_unauthorized(),
            WorkflowError::InvalidState { operation, actual } => {
                Self::invalid_state(operation, actual.as_str())
            }
            WorkflowError::Conflict => {
                Self::conflict("Transaction was modified concurrently, retry the operation")
            }
            WorkflowError::ConsentRejected {
                confidence,
                match_score,
            } => Self::with_details(
                400,
                "Consent statement did not match the recording".to_string(),
                serde_json::json!({
                    "verified": false,
                    "confidence": confidence,
                    "matchScore": match_score,
                }),
            ),
            WorkflowError::Adapter(msg) => Self::bad_gateway(&msg),
            WorkflowError::Storage(msg) => Self::internal_server_error(&msg),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match &err {
            IdentityError::Duplicate(_) | IdentityError::Validation(_) => {
                Self::bad_request(&err.to_string())
            }
            IdentityError::InvalidCredentials | IdentityError::InvalidToken => {
                Self::unauthorized(&err.to_string())
            }
            IdentityError::NotFound => Self::not_found(&err.to_string()),
            IdentityError::Hashing(_) | IdentityError::Storage(_) => {
                Self::internal_server_error(&err.to_string())
            }
        }
    }
}

impl From<ArtifactError> for ApiError {
    fn from(err: ArtifactError) -> Self {
        match &err {
            ArtifactError::Rejected(msg) => Self::bad_request(msg),
            ArtifactError::Io(_) => Self::internal_server_error(&err.to_string()),
        }
    }
}
