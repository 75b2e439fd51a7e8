use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{LedgerError, Result, RichQuery};

/// A key and the value stored under it, as returned by rich queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// The world-state key.
    pub key: String,

    /// The stored bytes (a JSON document).
    pub value: Vec<u8>,
}

impl LedgerRecord {
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Parses the stored value as a JSON document.
    pub fn document(&self) -> Result<serde_json::Value> {
        serde_json::from_slice(&self.value).map_err(|e| LedgerError::CorruptRecord {
            key: self.key.clone(),
            reason: e.to_string(),
        })
    }

    /// Deserializes the stored value into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.value)?)
    }
}

/// Core trait for world-state ledgers.
///
/// A ledger is a key-value store with last-writer-wins semantics per key.
/// It keeps no versions of its own: serializing concurrent writers to the same
/// key is the responsibility of the consensus layer behind the implementation.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns None if the key has never been written.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// The write is atomic: readers observe either the old or the new value.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Returns the records whose documents match the query's selector.
    ///
    /// Records are returned in key order, after applying `skip` and `limit`.
    async fn query(&self, query: &RichQuery) -> Result<Vec<LedgerRecord>>;

    /// Checks whether a value is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Extension trait providing JSON convenience methods for ledgers.
#[async_trait]
pub trait LedgerExt: Ledger {
    /// Reads and deserializes the document stored under `key`.
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Serializes `document` and writes it under `key`.
    async fn put_json<T: Serialize + Sync>(&self, key: &str, document: &T) -> Result<()> {
        let bytes = serde_json::to_vec(document)?;
        self.put(key, bytes).await
    }
}

// Blanket implementation for all Ledger implementations
impl<T: Ledger + ?Sized> LedgerExt for T {}

/// Validates a record before it is written.
///
/// Keys must be non-empty and values must be JSON objects so that the
/// query engine can index them.
pub fn validate_record(key: &str, value: &[u8]) -> Result<serde_json::Value> {
    if key.is_empty() {
        return Err(LedgerError::InvalidRecord(
            "key must not be empty".to_string(),
        ));
    }

    let document: serde_json::Value = serde_json::from_slice(value)
        .map_err(|e| LedgerError::InvalidRecord(format!("value for {key} is not JSON: {e}")))?;

    if !document.is_object() {
        return Err(LedgerError::InvalidRecord(format!(
            "value for {key} must be a JSON object"
        )));
    }

    Ok(document)
}
