//! Shared fixtures for the scenario tests.

#![allow(dead_code)]

use async_trait::async_trait;
use discipline_core::{PortError, PortResult, RecordStore, StoreKey};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A store that keeps values in memory and counts writes.
#[derive(Default)]
pub struct TestStore {
    values: Mutex<HashMap<StoreKey, String>>,
    writes: Mutex<usize>,
}

impl TestStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put(&self, key: StoreKey, value: &str) {
        self.values.lock().unwrap().insert(key, value.to_string());
    }

    pub fn peek(&self, key: StoreKey) -> Option<String> {
        self.values.lock().unwrap().get(&key).cloned()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl RecordStore for TestStore {
    async fn get(&self, key: StoreKey) -> PortResult<Option<String>> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: StoreKey, value: String) -> PortResult<()> {
        self.values.lock().unwrap().insert(key, value);
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> PortResult<()> {
        self.values.lock().unwrap().remove(&key);
        Ok(())
    }
}

/// Wraps a `TestStore` and fails the first `n` removals of the inbox key.
pub struct FlakyStore {
    pub inner: Arc<TestStore>,
    inbox_failures: Mutex<usize>,
}

impl FlakyStore {
    pub fn failing_inbox_removals(n: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: TestStore::shared(),
            inbox_failures: Mutex::new(n),
        })
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn get(&self, key: StoreKey) -> PortResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: StoreKey, value: String) -> PortResult<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: StoreKey) -> PortResult<()> {
        if key == StoreKey::Inbox {
            let mut left = self.inbox_failures.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(PortError::Storage("disk unavailable".to_string()));
            }
        }
        self.inner.remove(key).await
    }
}
