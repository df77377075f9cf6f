//! crates/discipline_core/src/reconcile.rs
//!
//! One pass of cross-session reconciliation: drain the inbox key into the
//! session's repository without duplicating known ids.
//!
//! The pass is idempotent. If a consumer stops before the inbox is cleared, the
//! next pass sees the same batch and skips every id it already merged.

use crate::domain::{CaseId, CaseRecord, RecordOrigin};
use crate::keys::StoreKey;
use crate::ports::{PortResult, RecordStore};
use crate::repository::CaseRepository;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Why a pass was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The fixed-interval poll fired.
    Poll,
    /// Another session wrote a watched key.
    Changed(StoreKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Idle,
    Reconciling,
}

/// What a pass did to the repository.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Records merged from the inbox, one notification each.
    pub added: Vec<CaseRecord>,
    /// The complaint list was re-read from the store.
    pub reloaded: bool,
}

impl ReconcileOutcome {
    /// Whether the session's view needs to be rebuilt.
    pub fn changed(&self) -> bool {
        self.reloaded || !self.added.is_empty()
    }
}

pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    state: ListenerState,
}

impl Reconciler {
    /// Keys whose change notifications start a pass.
    pub const WATCHED: [StoreKey; 2] = [StoreKey::Inbox, StoreKey::StudentComplaints];

    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            state: ListenerState::Idle,
        }
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Runs one pass. The listener is back in `Idle` afterwards, even on failure.
    pub async fn run_once(&mut self, repo: &mut CaseRepository, trigger: Trigger) -> PortResult<ReconcileOutcome> {
        self.state = ListenerState::Reconciling;
        let result = self.reconcile(repo, trigger).await;
        self.state = ListenerState::Idle;
        result
    }

    async fn reconcile(&self, repo: &mut CaseRepository, trigger: Trigger) -> PortResult<ReconcileOutcome> {
        let mut outcome = ReconcileOutcome::default();

        if trigger == Trigger::Changed(StoreKey::StudentComplaints) {
            outcome.reloaded = repo.reload_local().await?;
            debug!(reloaded = outcome.reloaded, "Complaint list changed in another session");
        }

        let Some(raw) = self.store.get(StoreKey::Inbox).await? else {
            return Ok(outcome);
        };

        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!("Inbox does not hold an array, leaving it in place");
                return Ok(outcome);
            }
            Err(e) => {
                warn!("Error parsing new complaints: {}", e);
                return Ok(outcome);
            }
        };
        if items.is_empty() {
            return Ok(outcome);
        }

        let incoming = inbox_records(&items);
        outcome.added = repo.upsert_from_external(incoming).await?;
        self.store.remove(StoreKey::Inbox).await?;

        info!(
            ?trigger,
            received = items.len(),
            added = outcome.added.len(),
            "Consumed inbox batch"
        );
        Ok(outcome)
    }
}

/// Normalizes an inbox batch.
///
/// An item without an id is keyed by its content, so a re-delivered item maps
/// to the same id in every session and on every pass.
fn inbox_records(items: &[Value]) -> Vec<CaseRecord> {
    items
        .iter()
        .filter_map(|raw| CaseRecord::normalize(raw, RecordOrigin::Inbox, content_id(raw)))
        .collect()
}

fn content_id(raw: &Value) -> CaseId {
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.to_string().as_bytes());
    CaseId::Text(format!("inbox-{}", digest.simple()))
}
