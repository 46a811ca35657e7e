//! Transaction CRUD and the bare (non-upload) workflow transitions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::auth::AuthUser;
use crate::api::errors::ApiError;
use crate::api::server::AppState;
use crate::ledger::SaleTransaction;
use crate::workflow::TransactionUpdate;

/// Standard success envelope around a transaction record
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub success: bool,
    pub data: SaleTransaction,
}

impl TransactionResponse {
    fn new(data: SaleTransaction) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<SaleTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    #[serde(default)]
    pub ipfs_cid: String,
    #[serde(default)]
    pub transaction_hash: String,
}

/// POST /api/transactions
pub async fn create(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let new = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(&format!("invalid transaction payload: {}", e)))?;
    let tx = state.engine.create(&caller.user_id, new).await?;
    Ok((StatusCode::CREATED, Json(TransactionResponse::new(tx))))
}

/// GET /api/transactions
pub async fn list(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let txs = state.engine.list(&caller.user_id).await?;
    Ok(Json(TransactionListResponse {
        success: true,
        count: txs.len(),
        data: txs,
    }))
}

/// GET /api/transactions/:id
pub async fn get(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let tx = state.engine.get(&caller.user_id, &id).await?;
    Ok(Json(TransactionResponse::new(tx)))
}

/// PUT /api/transactions/:id
///
/// Open to non-status fields only; payloads naming status, progress flags
/// or finalization data fail deserialization and come back as 400.
pub async fn update(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let update: TransactionUpdate = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(&format!("invalid update payload: {}", e)))?;
    let tx = state.engine.update(&caller.user_id, &id, update).await?;
    Ok(Json(TransactionResponse::new(tx)))
}

/// PUT /api/transactions/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let tx = state.engine.record_approval(&caller.user_id, &id).await?;
    Ok(Json(TransactionResponse::new(tx)))
}

/// PUT /api/transactions/:id/confirm-payment
pub async fn confirm_payment(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let tx = state.engine.confirm_payment(&caller.user_id, &id).await?;
    Ok(Json(TransactionResponse::new(tx)))
}

/// PUT /api/transactions/:id/finalize
pub async fn finalize(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<FinalizeRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let tx = state
        .engine
        .finalize(&caller.user_id, &id, &body.ipfs_cid, &body.transaction_hash)
        .await?;
    Ok(Json(TransactionResponse::new(tx)))
}

/// DELETE /api/transactions/:id
pub async fn delete(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.engine.delete(&caller.user_id, &id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": {} })))
}
