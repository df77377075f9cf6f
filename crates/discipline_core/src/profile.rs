//! crates/discipline_core/src/profile.rs
//!
//! Student profile, recent activity and theme preference, each kept under its
//! own key next to the complaint list.

use crate::domain::{ActivityEntry, StudentProfile, Theme};
use crate::keys::StoreKey;
use crate::ports::{PortError, PortResult, RecordStore};
use crate::repository::parse_array;
use std::sync::Arc;
use tracing::warn;

/// How many activities the dashboard lists.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

pub struct ProfileBook {
    store: Arc<dyn RecordStore>,
}

impl ProfileBook {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The saved profile, or `None` when nothing usable is stored.
    pub async fn profile(&self) -> PortResult<Option<StudentProfile>> {
        let Some(raw) = self.store.get(StoreKey::StudentProfile).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!("Failed to parse stored profile: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn save_profile(&self, profile: &StudentProfile) -> PortResult<()> {
        let raw = serde_json::to_string(profile).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(StoreKey::StudentProfile, raw).await
    }

    pub async fn reset_profile(&self) -> PortResult<()> {
        self.store.remove(StoreKey::StudentProfile).await
    }

    /// The first few stored activities, newest first as the server sent them.
    pub async fn recent_activities(&self) -> PortResult<Vec<ActivityEntry>> {
        let raw = self.store.get(StoreKey::Activities).await?;
        Ok(parse_array(StoreKey::Activities, raw.as_deref())
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .take(RECENT_ACTIVITY_LIMIT)
            .collect())
    }

    pub async fn save_activities(&self, activities: &[ActivityEntry]) -> PortResult<()> {
        let raw = serde_json::to_string(activities).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(StoreKey::Activities, raw).await
    }

    /// The theme is stored as a bare word, not JSON. Unknown words read as light.
    pub async fn theme(&self) -> PortResult<Theme> {
        let raw = self.store.get(StoreKey::Theme).await?;
        Ok(raw.as_deref().and_then(Theme::parse).unwrap_or_default())
    }

    pub async fn save_theme(&self, theme: Theme) -> PortResult<()> {
        self.store.set(StoreKey::Theme, theme.as_str().to_string()).await
    }
}
