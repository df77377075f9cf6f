//! services/api/src/adapters/file_store.rs
//!
//! A `RecordStore` that keeps one file per key inside a data directory.
//! Writes go to a temporary file that is then renamed over the old value, so a
//! reader sees either the previous value or the new one, never a mix.

use async_trait::async_trait;
use discipline_core::keys::StoreKey;
use discipline_core::ports::{PortError, PortResult, RecordStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct JsonFileStore {
    dir: PathBuf,
    /// Serializes writers. Readers rely on the atomic rename.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (and creates, if needed) the data directory.
    pub async fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

fn storage_error(action: &str, key: StoreKey, e: std::io::Error) -> PortError {
    PortError::Storage(format!("failed to {} '{}': {}", action, key, e))
}

//=========================================================================================
// `RecordStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get(&self, key: StoreKey) -> PortResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", key, e)),
        }
    }

    async fn set(&self, key: StoreKey, value: String) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::write(&tmp, value.as_bytes())
            .await
            .map_err(|e| storage_error("write", key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_error("replace", key, e))?;
        debug!(key = %key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_round_trip_and_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("store")).await.unwrap();

        assert_eq!(store.get(StoreKey::Theme).await.unwrap(), None);
        store.set(StoreKey::Theme, "dark".into()).await.unwrap();
        store.set(StoreKey::Inbox, "[1]".into()).await.unwrap();
        store.set(StoreKey::Inbox, "[1,2]".into()).await.unwrap();

        let reopened = JsonFileStore::open(store.dir()).await.unwrap();
        assert_eq!(reopened.get(StoreKey::Theme).await.unwrap().as_deref(), Some("dark"));
        assert_eq!(reopened.get(StoreKey::Inbox).await.unwrap().as_deref(), Some("[1,2]"));
        assert!(!dir.path().join("store").join("newComplaintsForStudent.json.tmp").exists());
    }

    #[tokio::test]
    async fn removing_missing_keys_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        store.remove(StoreKey::Activities).await.unwrap();
        store.set(StoreKey::Activities, "[]".into()).await.unwrap();
        store.remove(StoreKey::Activities).await.unwrap();
        assert_eq!(store.get(StoreKey::Activities).await.unwrap(), None);
    }
}
