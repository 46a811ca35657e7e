use super::{Result, Storage, StorageError};
use async_trait::async_trait;
use rocksdb::{IteratorMode, Options, DB};
use std::path::Path;
use std::sync::Mutex;

/// RocksDB-backed storage for production deployments.
///
/// RocksDB has no native compare-and-swap, so conditional writes are
/// serialized through a process-local mutex; plain reads and writes go
/// straight to the database.
pub struct RocksDbStorage {
    db: DB,
    cas_lock: Mutex<()>,
}

impl RocksDbStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)
            .map_err(|e| StorageError::Other(format!("failed to open rocksdb: {}", e)))?;
        Ok(Self {
            db,
            cas_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl Storage for RocksDbStorage {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| StorageError::ReadError(e.to_string()))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .put(key, value)
            .map_err(|e| StorageError::WriteError(e.to_string()))
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        self.db
            .delete(key)
            .map_err(|e| StorageError::WriteError(e.to_string()))
    }

    async fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn list_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut keys = Vec::new();
        let iter = self.db.iterator(IteratorMode::From(
            prefix,
            rocksdb::Direction::Forward,
        ));
        for item in iter {
            let (key, _) = item.map_err(|e| StorageError::ReadError(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_vec());
        }
        Ok(keys)
    }

    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> Result<bool> {
        let _guard = self.cas_lock.lock().unwrap();
        let current = self
            .db
            .get(key)
            .map_err(|e| StorageError::ReadError(e.to_string()))?;
        if current.as_deref() != expected {
            return Ok(false);
        }
        self.db
            .put(key, value)
            .map_err(|e| StorageError::WriteError(e.to_string()))?;
        Ok(true)
    }

    async fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| StorageError::WriteError(e.to_string()))
    }
}
