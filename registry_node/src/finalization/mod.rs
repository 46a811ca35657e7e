//! Finalization ledger capability
//!
//! Records a content identifier and a chain transaction hash as proof that
//! a sale completed. Real IPFS pinning and chain submission live behind
//! [`FinalizationLedger`]; the mock acknowledges any well-formed pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Acknowledgment returned once the proof pair has been recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizationAck {
    pub ipfs_cid: String,
    pub transaction_hash: String,
    /// Digest binding the pair together, usable as a receipt reference
    pub receipt: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
#[error("finalization ledger error: {0}")]
pub struct LedgerError(pub String);

#[async_trait]
pub trait FinalizationLedger: Send + Sync {
    /// Record a non-empty (cid, tx_hash) pair; callers validate
    /// non-emptiness before invoking
    async fn record(&self, cid: &str, tx_hash: &str) -> Result<FinalizationAck, LedgerError>;
}

/// Mock ledger: accepts everything and derives the receipt locally
pub struct MockFinalizationLedger;

#[async_trait]
impl FinalizationLedger for MockFinalizationLedger {
    async fn record(&self, cid: &str, tx_hash: &str) -> Result<FinalizationAck, LedgerError> {
        let mut hasher = Sha256::new();
        hasher.update(cid.as_bytes());
        hasher.update(b"/");
        hasher.update(tx_hash.as_bytes());
        Ok(FinalizationAck {
            ipfs_cid: cid.to_string(),
            transaction_hash: tx_hash.to_string(),
            receipt: hex::encode(hasher.finalize()),
            recorded_at: Utc::now(),
        })
    }
}

/// Test double that refuses every record call
pub struct FailingFinalizationLedger;

#[async_trait]
impl FinalizationLedger for FailingFinalizationLedger {
    async fn record(&self, _cid: &str, _tx_hash: &str) -> Result<FinalizationAck, LedgerError> {
        Err(LedgerError("chain endpoint unreachable".into()))
    }
}
