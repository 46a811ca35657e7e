//! Request-payload validation helpers for the auth surface

use super::errors::ApiError;

/// Reject blank required fields with a field-specific message
pub fn require_field(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::with_details(
            400,
            format!("Please add {}", field),
            serde_json::json!({ "field": field }),
        ));
    }
    Ok(())
}

/// Mobile numbers are ten digits
pub fn validate_mobile(mobile: &str) -> Result<(), ApiError> {
    if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::with_details(
            400,
            "Mobile number must be 10 digits".to_string(),
            serde_json::json!({ "field": "mobile" }),
        ));
    }
    Ok(())
}

/// Aadhaar numbers are twelve digits
pub fn validate_aadhaar(aadhaar: &str) -> Result<(), ApiError> {
    if aadhaar.len() != 12 || !aadhaar.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::with_details(
            400,
            "Aadhaar number must be 12 digits".to_string(),
            serde_json::json!({ "field": "aadhaarNo" }),
        ));
    }
    Ok(())
}
