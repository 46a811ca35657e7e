//! Sale transaction record and its enumerations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of the property being sold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    Apartment,
    Shop,
    Land,
    Office,
    House,
    Other,
}

/// How the buyer pays
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMode {
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "UPI")]
    Upi,
    Cheque,
    Cash,
    Other,
}

/// Workflow status of a sale transaction.
///
/// Statuses form a strict linear order; every move between them goes
/// through the workflow engine's transition table. `Completed` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionStatus {
    Draft,
    ConsentPending,
    SignaturePending,
    ApprovalPending,
    PaymentPending,
    Processing,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }

    /// Kebab-case wire string, as stored and returned by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Draft => "draft",
            TransactionStatus::ConsentPending => "consent-pending",
            TransactionStatus::SignaturePending => "signature-pending",
            TransactionStatus::ApprovalPending => "approval-pending",
            TransactionStatus::PaymentPending => "payment-pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a consent-video verification, kept on the record once the
/// consent gate has passed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    pub verified: bool,
    pub confidence: f64,
    pub match_score: f64,
    pub verified_at: DateTime<Utc>,
    /// Filename of the archived consent video, not the full path
    pub video_file: String,
}

/// Signature-capture details kept on the record once the signing gate
/// has passed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub signed_at: DateTime<Utc>,
    /// Filename of the archived signature image, not the full path
    pub signature_file: String,
}

/// A property-sale transaction record.
///
/// `status` is the single source of truth for which workflow operation is
/// currently legal. The four progress booleans are one-way: each flips
/// false -> true exactly once, when its gate passes, and is never reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleTransaction {
    /// Unique transaction id
    pub id: String,
    /// User id of the creator; immutable after creation
    pub owner: String,

    // Parties
    pub seller_name: String,
    pub seller_id: String,
    pub buyer_name: String,
    pub buyer_id: String,

    // Property
    pub property_type: PropertyType,
    pub property_description: String,
    pub property_address: String,

    // Financials
    pub sale_price: u64,
    pub advance_paid: u64,
    pub payment_mode: PaymentMode,

    pub agreement_date: DateTime<Utc>,

    // Declarations, all required true at creation
    pub ownership_confirmed: bool,
    pub no_legal_disputes: bool,
    pub no_encumbrances: bool,

    // Progress flags, monotonically false -> true
    pub consent_verified: bool,
    pub document_signed: bool,
    pub admin_approved: bool,
    pub payment_confirmed: bool,

    // Gate details
    pub consent_details: Option<ConsentRecord>,
    pub signature_details: Option<SignatureRecord>,

    // Finalization data, set together or not at all
    pub ipfs_cid: Option<String>,
    pub transaction_hash: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,

    pub failure_reason: Option<String>,

    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the client when creating a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub seller_name: String,
    pub seller_id: String,
    pub buyer_name: String,
    pub buyer_id: String,
    pub property_type: PropertyType,
    pub property_description: String,
    pub property_address: String,
    pub sale_price: u64,
    #[serde(default)]
    pub advance_paid: u64,
    pub payment_mode: PaymentMode,
    pub agreement_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ownership_confirmed: bool,
    #[serde(default)]
    pub no_legal_disputes: bool,
    #[serde(default)]
    pub no_encumbrances: bool,
}

impl SaleTransaction {
    /// Build a fresh record in `Draft` from validated creation fields
    pub fn from_new(owner: &str, new: NewTransaction) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            seller_name: new.seller_name,
            seller_id: new.seller_id,
            buyer_name: new.buyer_name,
            buyer_id: new.buyer_id,
            property_type: new.property_type,
            property_description: new.property_description,
            property_address: new.property_address,
            sale_price: new.sale_price,
            advance_paid: new.advance_paid,
            payment_mode: new.payment_mode,
            agreement_date: new.agreement_date.unwrap_or(now),
            ownership_confirmed: new.ownership_confirmed,
            no_legal_disputes: new.no_legal_disputes,
            no_encumbrances: new.no_encumbrances,
            consent_verified: false,
            document_signed: false,
            admin_approved: false,
            payment_confirmed: false,
            consent_details: None,
            signature_details: None,
            ipfs_cid: None,
            transaction_hash: None,
            completed_at: None,
            failure_reason: None,
            status: TransactionStatus::Draft,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&TransactionStatus::ConsentPending).unwrap();
        assert_eq!(json, "\"consent-pending\"");
        let back: TransactionStatus = serde_json::from_str("\"payment-pending\"").unwrap();
        assert_eq!(back, TransactionStatus::PaymentPending);
    }

    #[test]
    fn status_order_follows_workflow() {
        assert!(TransactionStatus::ConsentPending < TransactionStatus::SignaturePending);
        assert!(TransactionStatus::Processing < TransactionStatus::Completed);
    }

    #[test]
    fn payment_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMode::BankTransfer).unwrap(),
            "\"Bank Transfer\""
        );
        assert_eq!(serde_json::to_string(&PaymentMode::Upi).unwrap(), "\"UPI\"");
    }
}
