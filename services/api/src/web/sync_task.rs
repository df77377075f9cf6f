//! services/api/src/web/sync_task.rs
//!
//! The per-tab reconciliation listener. It wakes on store-change notifications
//! and on a fixed poll, and runs one reconciliation pass for each wake-up.

use crate::web::state::TabSession;
use discipline_core::{ChangeNotifier, Reconciler, Trigger};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Long-running listener for one tab. Ends when `cancellation_token` fires.
///
/// A poll that is missed is not made up for: the next tick replaces it.
pub async fn sync_process(
    session: Arc<TabSession>,
    notifier: Arc<dyn ChangeNotifier>,
    poll_interval: Duration,
    cancellation_token: CancellationToken,
) {
    info!(session_id = %session.id, ?poll_interval, "Reconciliation listener started.");

    let mut changes = notifier.subscribe(&Reconciler::WATCHED);
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let trigger = tokio::select! {
            _ = cancellation_token.cancelled() => break,
            _ = ticker.tick() => Trigger::Poll,
            Some(key) = changes.next() => Trigger::Changed(key),
        };
        debug!(session_id = %session.id, ?trigger, "Reconciling");
        session.reconcile(trigger).await;
    }

    info!(session_id = %session.id, "Reconciliation listener stopped.");
}
