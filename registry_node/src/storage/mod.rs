//! Key-value storage abstraction for the registry

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod rocksdb;

pub use memory::MemoryStorage;
pub use rocksdb::RocksDbStorage;

/// Storage-specific Result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("write error: {0}")]
    WriteError(String),
    #[error("read error: {0}")]
    ReadError(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("storage error: {0}")]
    Other(String),
}

/// Core storage trait shared by the in-memory and RocksDB backends.
///
/// `compare_and_swap` is the single concurrency primitive the workflow
/// engine relies on: a conditional write that only applies when the stored
/// value still equals `expected`. Backends must make the compare and the
/// write atomic with respect to each other.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;
    async fn delete(&self, key: &[u8]) -> Result<()>;
    async fn exists(&self, key: &[u8]) -> Result<bool>;
    async fn list_keys(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>>;

    /// Write `value` only if the current value equals `expected`
    /// (`None` = the key must not exist yet). Returns whether the write
    /// was applied.
    async fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> Result<bool>;

    async fn flush(&self) -> Result<()>;
}
