//! services/api/src/adapters/memory_store.rs
//!
//! A `RecordStore` kept in process memory, used when no data directory is
//! wanted and by the tests.

use async_trait::async_trait;
use discipline_core::keys::StoreKey;
use discipline_core::ports::{PortError, PortResult, RecordStore};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> PortError {
    PortError::Storage("memory store lock poisoned".to_string())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: StoreKey) -> PortResult<Option<String>> {
        let values = self.values.lock().map_err(|_| poisoned())?;
        Ok(values.get(&key).cloned())
    }

    async fn set(&self, key: StoreKey, value: String) -> PortResult<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> PortResult<()> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.remove(&key);
        Ok(())
    }
}
