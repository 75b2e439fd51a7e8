use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    LedgerRecord, Result, RichQuery,
    store::{Ledger, validate_record},
};

/// In-memory ledger implementation for testing and local runs.
///
/// Values are kept as the exact bytes that were written, so callers can
/// compare stored records byte for byte.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys stored.
    pub async fn len(&self) -> usize {
        self.state.read().await.len()
    }

    /// Returns true if nothing has been written yet.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.is_empty()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.state.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        validate_record(key, &value)?;
        self.state.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn query(&self, query: &RichQuery) -> Result<Vec<LedgerRecord>> {
        let state = self.state.read().await;

        let mut matched = Vec::new();
        for (key, value) in state.iter() {
            let record = LedgerRecord::new(key.clone(), value.clone());
            if query.matches(&record.document()?)? {
                matched.push(record);
            }
        }

        Ok(query.paginate(matched))
    }
}
