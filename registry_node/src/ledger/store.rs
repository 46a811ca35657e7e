//! Typed transaction store over the key-value storage backend
//!
//! Key layout:
//!   `tx/{id}`            -> serialized [`SaleTransaction`]
//!   `owner/{uid}/{id}`   -> empty marker, the per-owner index

use super::transaction::SaleTransaction;
use crate::storage::{Storage, StorageError};
use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction {0} not found")]
    NotFound(String),
    #[error("transaction {0} was modified concurrently")]
    Conflict(String),
    #[error("corrupt record for {0}: {1}")]
    Corrupt(String, serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Persistence layer for sale transactions.
///
/// All status-bearing updates go through [`TransactionStore::update_expected`],
/// which applies a compare-and-swap against the record bytes read by the
/// caller. Two racing writers can both read the same prior state, but only
/// one CAS lands; the loser gets [`StoreError::Conflict`].
pub struct TransactionStore {
    storage: Arc<dyn Storage>,
}

fn tx_key(id: &str) -> Vec<u8> {
    format!("tx/{}", id).into_bytes()
}

fn owner_key(owner: &str, id: &str) -> Vec<u8> {
    format!("owner/{}/{}", owner, id).into_bytes()
}

impl TransactionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn encode(tx: &SaleTransaction) -> Result<Vec<u8>> {
        serde_json::to_vec(tx).map_err(|e| StoreError::Corrupt(tx.id.clone(), e))
    }

    fn decode(id: &str, bytes: &[u8]) -> Result<SaleTransaction> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt(id.to_string(), e))
    }

    /// Persist a brand-new record and attach it to the owner index
    pub async fn insert(&self, tx: &SaleTransaction) -> Result<()> {
        let bytes = Self::encode(tx)?;
        let created = self
            .storage
            .compare_and_swap(&tx_key(&tx.id), None, &bytes)
            .await?;
        if !created {
            return Err(StoreError::Conflict(tx.id.clone()));
        }
        self.storage.put(&owner_key(&tx.owner, &tx.id), b"").await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<SaleTransaction>> {
        match self.storage.get(&tx_key(id)).await? {
            Some(bytes) => Ok(Some(Self::decode(id, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Load the record along with the exact bytes it was read from, for a
    /// later conditional write
    pub async fn get_versioned(&self, id: &str) -> Result<Option<(SaleTransaction, Vec<u8>)>> {
        match self.storage.get(&tx_key(id)).await? {
            Some(bytes) => {
                let tx = Self::decode(id, &bytes)?;
                Ok(Some((tx, bytes)))
            }
            None => Ok(None),
        }
    }

    /// Conditionally replace a record: applies only if the stored bytes
    /// still equal `expected`, otherwise fails with `Conflict`
    pub async fn update_expected(
        &self,
        updated: &SaleTransaction,
        expected: &[u8],
    ) -> Result<()> {
        let bytes = Self::encode(updated)?;
        let applied = self
            .storage
            .compare_and_swap(&tx_key(&updated.id), Some(expected), &bytes)
            .await?;
        if !applied {
            return Err(StoreError::Conflict(updated.id.clone()));
        }
        Ok(())
    }

    /// All transactions created by `owner`, oldest first
    pub async fn list_by_owner(&self, owner: &str) -> Result<Vec<SaleTransaction>> {
        let prefix = format!("owner/{}/", owner).into_bytes();
        let mut txs = Vec::new();
        for key in self.storage.list_keys(&prefix).await? {
            let id = String::from_utf8_lossy(&key[prefix.len()..]).to_string();
            if let Some(tx) = self.get(&id).await? {
                txs.push(tx);
            }
        }
        txs.sort_by_key(|t| t.created_at);
        Ok(txs)
    }

    /// Remove a record and its owner-index entry
    pub async fn remove(&self, tx: &SaleTransaction) -> Result<()> {
        self.storage.delete(&tx_key(&tx.id)).await?;
        self.storage.delete(&owner_key(&tx.owner, &tx.id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transaction::{NewTransaction, PaymentMode, PropertyType};
    use crate::storage::MemoryStorage;

    fn sample(owner: &str) -> SaleTransaction {
        SaleTransaction::from_new(
            owner,
            NewTransaction {
                seller_name: "Asha Rao".into(),
                seller_id: "430156789012".into(),
                buyer_name: "Vikram Shah".into(),
                buyer_id: "981234567890".into(),
                property_type: PropertyType::Apartment,
                property_description: "2BHK, 4th floor".into(),
                property_address: "12 MG Road, Pune".into(),
                sale_price: 500_000,
                advance_paid: 50_000,
                payment_mode: PaymentMode::BankTransfer,
                agreement_date: None,
                ownership_confirmed: true,
                no_legal_disputes: true,
                no_encumbrances: true,
            },
        )
    }

    #[tokio::test]
    async fn insert_get_roundtrip() {
        let store = TransactionStore::new(Arc::new(MemoryStorage::new()));
        let tx = sample("u1");
        store.insert(&tx).await.unwrap();
        let loaded = store.get(&tx.id).await.unwrap().unwrap();
        assert_eq!(loaded, tx);
    }

    #[tokio::test]
    async fn stale_update_conflicts() {
        let store = TransactionStore::new(Arc::new(MemoryStorage::new()));
        let tx = sample("u1");
        store.insert(&tx).await.unwrap();

        let (mut a, version_a) = store.get_versioned(&tx.id).await.unwrap().unwrap();
        let (mut b, version_b) = store.get_versioned(&tx.id).await.unwrap().unwrap();

        a.admin_approved = true;
        store.update_expected(&a, &version_a).await.unwrap();

        b.payment_confirmed = true;
        let err = store.update_expected(&b, &version_b).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn owner_index_lists_only_own() {
        let store = TransactionStore::new(Arc::new(MemoryStorage::new()));
        let t1 = sample("u1");
        let t2 = sample("u2");
        store.insert(&t1).await.unwrap();
        store.insert(&t2).await.unwrap();

        let mine = store.list_by_owner("u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, t1.id);

        store.remove(&t1).await.unwrap();
        assert!(store.list_by_owner("u1").await.unwrap().is_empty());
    }
}
