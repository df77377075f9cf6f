//! services/api/src/adapters/notifier.rs
//!
//! Change notifications between tab sessions, carried over a tokio broadcast
//! channel, plus the store wrapper that announces every write on it.

use async_trait::async_trait;
use discipline_core::keys::StoreKey;
use discipline_core::ports::{ChangeNotifier, ChangeStream, PortResult, RecordStore};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 256;

//=========================================================================================
// BroadcastNotifier
//=========================================================================================

#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<StoreKey>,
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn publish(&self, key: StoreKey) {
        // No subscribers is not an error: nobody needs to hear about it.
        let receivers = self.sender.send(key).unwrap_or(0);
        debug!(key = %key, receivers, "Published store change");
    }

    fn subscribe(&self, keys: &[StoreKey]) -> ChangeStream {
        let keys = keys.to_vec();
        let stream = BroadcastStream::new(self.sender.subscribe()).filter_map(move |item| {
            let wanted = match item {
                Ok(key) if keys.contains(&key) => Some(key),
                Ok(_) => None,
                Err(e) => {
                    // A lagging listener is caught up by its next poll.
                    warn!("Change listener lagged: {}", e);
                    None
                }
            };
            futures::future::ready(wanted)
        });
        Box::pin(stream)
    }
}

//=========================================================================================
// NotifyingStore
//=========================================================================================

/// Wraps a store so every successful write or removal is announced.
pub struct NotifyingStore {
    inner: Arc<dyn RecordStore>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl NotifyingStore {
    pub fn new(inner: Arc<dyn RecordStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self { inner, notifier }
    }
}

#[async_trait]
impl RecordStore for NotifyingStore {
    async fn get(&self, key: StoreKey) -> PortResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: StoreKey, value: String) -> PortResult<()> {
        self.inner.set(key, value).await?;
        self.notifier.publish(key);
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> PortResult<()> {
        self.inner.remove(key).await?;
        self.notifier.publish(key);
        Ok(())
    }
}
