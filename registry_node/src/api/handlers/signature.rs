//! Signature-image upload handler

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use super::consent::read_upload;
use crate::api::auth::AuthUser;
use crate::api::errors::ApiError;
use crate::api::server::AppState;
use crate::artifacts::ArtifactKind;
use crate::ledger::TransactionStatus;

#[derive(Debug, Serialize)]
pub struct SignatureResponse {
    pub success: bool,
    pub message: String,
    pub transaction: SignatureTransactionView,
}

#[derive(Debug, Serialize)]
pub struct SignatureTransactionView {
    pub id: String,
    pub status: TransactionStatus,
}

/// PUT /api/transactions/:id/sign
///
/// Same guard discipline as the consent upload: the image survives only
/// if the transition commits.
pub async fn upload_signature(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<SignatureResponse>, ApiError> {
    let (file_name, content_type, data) = read_upload(&mut multipart, "signature").await?;
    let artifact = state
        .artifacts
        .spool(ArtifactKind::SignatureImage, &file_name, &content_type, &data)
        .await?;

    let tx = state
        .engine
        .record_signature(&caller.user_id, &id, artifact.file_name())
        .await?;

    artifact.keep(state.artifacts.archive_dir()).await?;

    Ok(Json(SignatureResponse {
        success: true,
        message: "Signature uploaded successfully".to_string(),
        transaction: SignatureTransactionView {
            id: tx.id,
            status: tx.status,
        },
    }))
}
