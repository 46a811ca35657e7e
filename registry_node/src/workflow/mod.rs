//! Transaction workflow engine
//!
//! Owns the status field and every rule about which transition is legal
//! from which state. Each operation loads the record, checks the current
//! status against the requested transition, invokes the relevant external
//! capability, flips the matching progress flag, and persists through a
//! compare-and-swap so racing writers cannot both apply the same
//! transition.
//!
//! The linear order of gates:
//!
//!   draft -> consent-pending -> signature-pending -> approval-pending
//!         -> payment-pending -> processing -> completed
//!
//! with `failed` reachable from any non-terminal state.

pub mod statement;

pub use statement::consent_statement;

use crate::consent::{ConsentOutcome, ConsentVerifier};
use crate::finalization::FinalizationLedger;
use crate::ledger::store::{StoreError, TransactionStore};
use crate::ledger::{
    ConsentRecord, NewTransaction, PaymentMode, PropertyType, SaleTransaction, SignatureRecord,
    TransactionStatus,
};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Everything a workflow operation can fail with
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    /// Covers both "not your transaction" and "no such transaction";
    /// callers must not be able to tell the two apart
    #[error("not authorized to access this transaction")]
    Unauthorized,
    #[error("cannot {operation} while transaction is {actual}")]
    InvalidState {
        operation: &'static str,
        actual: TransactionStatus,
    },
    #[error("transaction was modified concurrently, retry the operation")]
    Conflict,
    #[error("consent statement did not match the recording (confidence {confidence:.2})")]
    ConsentRejected { confidence: f64, match_score: f64 },
    #[error("external service failure: {0}")]
    Adapter(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => WorkflowError::Conflict,
            other => WorkflowError::Storage(other.to_string()),
        }
    }
}

/// Owner-editable fields for the generic update operation. Status, the
/// progress flags, finalization data and the owner reference are absent
/// on purpose: the transition table is the only path that moves those.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionUpdate {
    pub seller_name: Option<String>,
    pub seller_id: Option<String>,
    pub buyer_name: Option<String>,
    pub buyer_id: Option<String>,
    pub property_type: Option<PropertyType>,
    pub property_description: Option<String>,
    pub property_address: Option<String>,
    pub sale_price: Option<u64>,
    pub advance_paid: Option<u64>,
    pub payment_mode: Option<PaymentMode>,
    pub agreement_date: Option<DateTime<Utc>>,
}

/// The workflow engine. One instance serves all transactions; per-record
/// serialization comes from the store's conditional writes, so no
/// cross-transaction locking is needed.
pub struct WorkflowEngine {
    store: TransactionStore,
    consent: Arc<dyn ConsentVerifier>,
    finalizer: Arc<dyn FinalizationLedger>,
}

impl WorkflowEngine {
    pub fn new(
        store: TransactionStore,
        consent: Arc<dyn ConsentVerifier>,
        finalizer: Arc<dyn FinalizationLedger>,
    ) -> Self {
        Self {
            store,
            consent,
            finalizer,
        }
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    /// Load a record for `caller`, resolving absent and not-owned to the
    /// same error
    async fn load_owned(&self, caller: &str, id: &str) -> Result<(SaleTransaction, Vec<u8>)> {
        match self.store.get_versioned(id).await? {
            Some((tx, version)) if tx.owner == caller => Ok((tx, version)),
            Some(_) => {
                warn!("user {} denied access to transaction {}", caller, id);
                Err(WorkflowError::Unauthorized)
            }
            None => Err(WorkflowError::Unauthorized),
        }
    }

    fn ensure_status(
        tx: &SaleTransaction,
        operation: &'static str,
        expected: TransactionStatus,
    ) -> Result<()> {
        if tx.status != expected {
            return Err(WorkflowError::InvalidState {
                operation,
                actual: tx.status,
            });
        }
        Ok(())
    }

    fn validate_financials(sale_price: u64, advance_paid: u64) -> Result<()> {
        if sale_price == 0 {
            return Err(WorkflowError::Validation(
                "sale price must be greater than zero".into(),
            ));
        }
        if advance_paid > sale_price {
            return Err(WorkflowError::Validation(
                "advance paid cannot exceed the sale price".into(),
            ));
        }
        Ok(())
    }

    /// create: validate declarations and financials, persist the new
    /// record already advanced from draft to consent-pending
    pub async fn create(&self, owner: &str, new: NewTransaction) -> Result<SaleTransaction> {
        if !(new.ownership_confirmed && new.no_legal_disputes && new.no_encumbrances) {
            return Err(WorkflowError::Validation(
                "all three declarations must be confirmed".into(),
            ));
        }
        Self::validate_financials(new.sale_price, new.advance_paid)?;

        let mut tx = SaleTransaction::from_new(owner, new);
        tx.status = TransactionStatus::ConsentPending;
        self.store.insert(&tx).await?;
        info!("transaction {} created by {} ({})", tx.id, owner, tx.status);
        Ok(tx)
    }

    pub async fn get(&self, caller: &str, id: &str) -> Result<SaleTransaction> {
        Ok(self.load_owned(caller, id).await?.0)
    }

    pub async fn list(&self, caller: &str) -> Result<Vec<SaleTransaction>> {
        Ok(self.store.list_by_owner(caller).await?)
    }

    /// consent-pending -> signature-pending, gated on the verifier
    /// judging the recorded statement a match
    pub async fn record_consent(
        &self,
        caller: &str,
        id: &str,
        video: &Path,
        stored_name: &str,
    ) -> Result<(SaleTransaction, ConsentOutcome)> {
        let (mut tx, version) = self.load_owned(caller, id).await?;
        Self::ensure_status(&tx, "record consent", TransactionStatus::ConsentPending)?;

        let statement = consent_statement(&tx);
        let outcome = self
            .consent
            .verify(video, &statement)
            .await
            .map_err(|e| WorkflowError::Adapter(e.to_string()))?;

        if !outcome.verified {
            return Err(WorkflowError::ConsentRejected {
                confidence: outcome.confidence,
                match_score: outcome.match_score,
            });
        }

        tx.consent_verified = true;
        tx.consent_details = Some(ConsentRecord {
            verified: true,
            confidence: outcome.confidence,
            match_score: outcome.match_score,
            verified_at: Utc::now(),
            video_file: stored_name.to_string(),
        });
        tx.status = TransactionStatus::SignaturePending;
        self.store.update_expected(&tx, &version).await?;
        info!(
            "transaction {}: consent verified (confidence {:.2})",
            tx.id, outcome.confidence
        );
        Ok((tx, outcome))
    }

    /// signature-pending -> approval-pending, gated on a signature image
    /// having been captured and archived
    pub async fn record_signature(
        &self,
        caller: &str,
        id: &str,
        stored_name: &str,
    ) -> Result<SaleTransaction> {
        let (mut tx, version) = self.load_owned(caller, id).await?;
        Self::ensure_status(&tx, "record signature", TransactionStatus::SignaturePending)?;

        tx.document_signed = true;
        tx.signature_details = Some(SignatureRecord {
            signed_at: Utc::now(),
            signature_file: stored_name.to_string(),
        });
        tx.status = TransactionStatus::ApprovalPending;
        self.store.update_expected(&tx, &version).await?;
        info!("transaction {}: document signed", tx.id);
        Ok(tx)
    }

    /// approval-pending -> payment-pending
    pub async fn record_approval(&self, caller: &str, id: &str) -> Result<SaleTransaction> {
        let (mut tx, version) = self.load_owned(caller, id).await?;
        Self::ensure_status(&tx, "record approval", TransactionStatus::ApprovalPending)?;

        tx.admin_approved = true;
        tx.status = TransactionStatus::PaymentPending;
        self.store.update_expected(&tx, &version).await?;
        info!("transaction {}: approved", tx.id);
        Ok(tx)
    }

    /// payment-pending -> processing
    pub async fn confirm_payment(&self, caller: &str, id: &str) -> Result<SaleTransaction> {
        let (mut tx, version) = self.load_owned(caller, id).await?;
        Self::ensure_status(&tx, "confirm payment", TransactionStatus::PaymentPending)?;

        tx.payment_confirmed = true;
        tx.status = TransactionStatus::Processing;
        self.store.update_expected(&tx, &version).await?;
        info!("transaction {}: payment confirmed", tx.id);
        Ok(tx)
    }

    /// processing -> completed, once both proof fields are present and the
    /// finalization ledger acknowledges them
    pub async fn finalize(
        &self,
        caller: &str,
        id: &str,
        ipfs_cid: &str,
        transaction_hash: &str,
    ) -> Result<SaleTransaction> {
        let (mut tx, version) = self.load_owned(caller, id).await?;
        Self::ensure_status(&tx, "finalize", TransactionStatus::Processing)?;

        let cid = ipfs_cid.trim();
        let hash = transaction_hash.trim();
        if cid.is_empty() || hash.is_empty() {
            return Err(WorkflowError::Validation(
                "both ipfsCid and transactionHash are required".into(),
            ));
        }

        let ack = self
            .finalizer
            .record(cid, hash)
            .await
            .map_err(|e| WorkflowError::Adapter(e.to_string()))?;

        tx.ipfs_cid = Some(cid.to_string());
        tx.transaction_hash = Some(hash.to_string());
        tx.completed_at = Some(ack.recorded_at);
        tx.status = TransactionStatus::Completed;
        self.store.update_expected(&tx, &version).await?;
        info!(
            "transaction {}: finalized (cid {}, receipt {})",
            tx.id, cid, ack.receipt
        );
        Ok(tx)
    }

    /// Any non-terminal state -> failed, recording why
    pub async fn mark_failed(
        &self,
        caller: &str,
        id: &str,
        reason: &str,
    ) -> Result<SaleTransaction> {
        let (mut tx, version) = self.load_owned(caller, id).await?;
        if tx.status.is_terminal() {
            return Err(WorkflowError::InvalidState {
                operation: "mark failed",
                actual: tx.status,
            });
        }
        tx.failure_reason = Some(reason.to_string());
        tx.status = TransactionStatus::Failed;
        self.store.update_expected(&tx, &version).await?;
        warn!("transaction {} failed: {}", tx.id, reason);
        Ok(tx)
    }

    /// Generic owner update of non-status fields
    pub async fn update(
        &self,
        caller: &str,
        id: &str,
        update: TransactionUpdate,
    ) -> Result<SaleTransaction> {
        let (mut tx, version) = self.load_owned(caller, id).await?;

        if let Some(v) = update.seller_name {
            tx.seller_name = v;
        }
        if let Some(v) = update.seller_id {
            tx.seller_id = v;
        }
        if let Some(v) = update.buyer_name {
            tx.buyer_name = v;
        }
        if let Some(v) = update.buyer_id {
            tx.buyer_id = v;
        }
        if let Some(v) = update.property_type {
            tx.property_type = v;
        }
        if let Some(v) = update.property_description {
            tx.property_description = v;
        }
        if let Some(v) = update.property_address {
            tx.property_address = v;
        }
        if let Some(v) = update.sale_price {
            tx.sale_price = v;
        }
        if let Some(v) = update.advance_paid {
            tx.advance_paid = v;
        }
        if let Some(v) = update.payment_mode {
            tx.payment_mode = v;
        }
        if let Some(v) = update.agreement_date {
            tx.agreement_date = v;
        }
        Self::validate_financials(tx.sale_price, tx.advance_paid)?;

        self.store.update_expected(&tx, &version).await?;
        Ok(tx)
    }

    /// Owner-initiated deletion; unconditional on status by policy
    pub async fn delete(&self, caller: &str, id: &str) -> Result<()> {
        let (tx, _) = self.load_owned(caller, id).await?;
        if tx.status == TransactionStatus::Completed {
            warn!(
                "transaction {}: deleting a completed record, audit reference {} is lost",
                tx.id,
                tx.transaction_hash.as_deref().unwrap_or("-")
            );
        }
        self.store.remove(&tx).await?;
        info!("transaction {} deleted by {}", id, caller);
        Ok(())
    }
}
