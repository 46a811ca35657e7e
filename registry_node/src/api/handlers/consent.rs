//! Consent-video upload and verification handler

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use crate::api::auth::AuthUser;
use crate::api::errors::ApiError;
use crate::api::server::AppState;
use crate::artifacts::{ArtifactKind, TempArtifact};
use crate::ledger::TransactionStatus;

#[derive(Debug, Serialize)]
pub struct ConsentResponse {
    pub success: bool,
    pub verified: bool,
    pub transaction: ConsentTransactionView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentTransactionView {
    pub id: String,
    pub status: TransactionStatus,
    pub consent_verified: bool,
}

/// Pull one named file field out of a multipart body
pub(super) async fn read_upload(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<(String, String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(&format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(&format!("upload read error: {}", e)))?;
        return Ok((file_name, content_type, data.to_vec()));
    }
    Err(ApiError::bad_request(&format!(
        "Please upload a {} file",
        field_name
    )))
}

/// PUT /api/transactions/:id/consent
///
/// The spooled video is owned by a [`TempArtifact`] guard: any error from
/// here on (bad lookup, wrong state, verifier failure, non-match) drops
/// the guard and with it the temp file. Only a verified consent keeps the
/// video, archived for the audit record.
pub async fn verify_consent(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ConsentResponse>, ApiError> {
    let (file_name, content_type, data) = read_upload(&mut multipart, "video").await?;
    let artifact: TempArtifact = state
        .artifacts
        .spool(ArtifactKind::ConsentVideo, &file_name, &content_type, &data)
        .await?;

    let (tx, outcome) = state
        .engine
        .record_consent(&caller.user_id, &id, artifact.path(), artifact.file_name())
        .await?;

    artifact.keep(state.artifacts.archive_dir()).await?;

    Ok(Json(ConsentResponse {
        success: true,
        verified: outcome.verified,
        transaction: ConsentTransactionView {
            id: tx.id,
            status: tx.status,
            consent_verified: tx.consent_verified,
        },
    }))
}
