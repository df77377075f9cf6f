//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-tab session state.

use crate::config::Config;
use crate::web::protocol::ServerMessage;
use crate::web::sync_task::sync_process;
use discipline_core::{
    CaseFilter, CaseRepository, ChangeNotifier, DashboardView, PortResult, Reconciler, RecordStore, Trigger,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

/// Which dashboard a tab shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TabRole {
    /// Clears the previous session on open and reconciles its inbox.
    Student,
    /// Reads what is stored and never consumes the student inbox.
    Teacher,
}

//=========================================================================================
// AppState (Shared Across All Tab Sessions)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    /// The origin-wide store. Every write is announced on `notifier`.
    pub store: Arc<dyn RecordStore>,
    pub notifier: Arc<dyn ChangeNotifier>,
    pub config: Arc<Config>,
    sessions: RwLock<HashMap<Uuid, Arc<TabSession>>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<dyn RecordStore>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self {
            store,
            notifier,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Bootstraps a student tab: clears the previous session's data, loads the
    /// records and starts the tab's reconciliation task.
    pub async fn open_session(&self, snapshot: Option<Vec<Value>>) -> PortResult<Arc<TabSession>> {
        let mut repository = match snapshot {
            Some(snapshot) => CaseRepository::with_snapshot(self.store.clone(), snapshot),
            None => CaseRepository::new(self.store.clone()),
        };
        repository.clear_all().await?;
        repository.load_records().await?;

        let session = self.register(TabRole::Student, repository).await;

        let task_session = session.clone();
        let notifier = self.notifier.clone();
        let poll_interval = self.config.poll_interval;
        let token = session.cancellation_token.clone();
        tokio::spawn(async move {
            sync_process(task_session, notifier, poll_interval, token).await;
        });

        info!(session_id = %session.id, "Opened student tab");
        Ok(session)
    }

    /// Opens a teacher tab over whatever is stored. No listener runs for it.
    pub async fn open_teacher_session(&self) -> PortResult<Arc<TabSession>> {
        let mut repository = CaseRepository::new(self.store.clone());
        repository.load_records().await?;
        let session = self.register(TabRole::Teacher, repository).await;
        info!(session_id = %session.id, "Opened teacher tab");
        Ok(session)
    }

    async fn register(&self, role: TabRole, repository: CaseRepository) -> Arc<TabSession> {
        let session = Arc::new(TabSession::new(role, repository, Reconciler::new(self.store.clone())));
        self.sessions.write().await.insert(session.id, session.clone());
        session
    }

    pub async fn session(&self, id: Uuid) -> Option<Arc<TabSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Closes a tab and stops its listener. Returns false for unknown ids.
    pub async fn close_session(&self, id: Uuid) -> bool {
        match self.sessions.write().await.remove(&id) {
            Some(session) => {
                session.cancellation_token.cancel();
                info!(session_id = %id, "Closed tab session");
                true
            }
            None => false,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Closes every tab that has had no socket and no request for the idle
    /// timeout. Returns how many were closed.
    pub async fn evict_idle(&self) -> usize {
        let timeout = self.config.session_idle_timeout;
        let idle: Vec<Uuid> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.is_idle(timeout))
            .map(|s| s.id)
            .collect();

        let mut closed = 0;
        for id in idle {
            if self.close_session(id).await {
                closed += 1;
            }
        }
        if closed > 0 {
            info!(closed, "Evicted idle tab sessions");
        }
        closed
    }

    /// Starts the background sweep that evicts idle tabs. It stops once the
    /// state itself is dropped.
    pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::downgrade(self);
        let period = (self.config.session_idle_timeout / 2).max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else { break };
                state.evict_idle().await;
            }
        })
    }
}

//=========================================================================================
// TabSession (Specific to One Open Dashboard)
//=========================================================================================

/// The mutable part of a tab, guarded by one lock so requests and the
/// reconciliation task never interleave.
pub struct TabState {
    pub repository: CaseRepository,
    pub filter: CaseFilter,
    pub reconciler: Reconciler,
}

impl TabState {
    /// Teacher tabs have no listener, so they re-read the stored list whenever
    /// they are looked at.
    pub async fn refresh(&mut self, role: TabRole) -> PortResult<()> {
        if role == TabRole::Teacher {
            self.repository.reload_local().await?;
        }
        Ok(())
    }
}

pub struct TabSession {
    pub id: Uuid,
    pub role: TabRole,
    pub state: Mutex<TabState>,
    /// Render sink. Messages sent while no socket is attached are dropped.
    pub events: broadcast::Sender<ServerMessage>,
    /// Stops the reconciliation task when the tab closes.
    pub cancellation_token: CancellationToken,
    opened_at: Instant,
    /// Milliseconds after `opened_at` of the last request or socket change.
    last_active_ms: AtomicU64,
    sockets: AtomicUsize,
}

impl TabSession {
    pub fn new(role: TabRole, repository: CaseRepository, reconciler: Reconciler) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            role,
            state: Mutex::new(TabState {
                repository,
                filter: CaseFilter::default(),
                reconciler,
            }),
            events,
            cancellation_token: CancellationToken::new(),
            opened_at: Instant::now(),
            last_active_ms: AtomicU64::new(0),
            sockets: AtomicUsize::new(0),
        }
    }

    /// Marks the tab as in use.
    pub fn touch(&self) {
        let now = self.opened_at.elapsed().as_millis() as u64;
        self.last_active_ms.store(now, Ordering::Relaxed);
    }

    pub fn attach_socket(&self) {
        self.sockets.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub fn detach_socket(&self) {
        self.sockets.fetch_sub(1, Ordering::Relaxed);
        self.touch();
    }

    /// True when no socket is attached and nothing touched the tab for `timeout`.
    pub fn is_idle(&self, timeout: Duration) -> bool {
        if self.sockets.load(Ordering::Relaxed) > 0 {
            return false;
        }
        let last = Duration::from_millis(self.last_active_ms.load(Ordering::Relaxed));
        self.opened_at.elapsed().saturating_sub(last) >= timeout
    }

    /// Builds the current view with the tab's active filter.
    pub async fn view(&self) -> DashboardView {
        let mut state = self.state.lock().await;
        if let Err(e) = state.refresh(self.role).await {
            warn!(session_id = %self.id, "Showing the last loaded list: {:?}", e);
        }
        DashboardView::build(state.repository.records(), &state.filter)
    }

    /// Pushes a message to the attached socket, if any.
    pub fn emit(&self, message: ServerMessage) {
        // Err only means nobody is listening.
        let _ = self.events.send(message);
    }

    /// Re-renders the dashboard on the attached socket.
    pub async fn render(&self) {
        let view = self.view().await;
        self.emit(ServerMessage::DashboardUpdated { view });
    }

    /// Runs one reconciliation pass and renders its result.
    pub async fn reconcile(&self, trigger: Trigger) {
        let (added, view) = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            match state.reconciler.run_once(&mut state.repository, trigger).await {
                Ok(outcome) if outcome.changed() => {
                    let view = DashboardView::build(state.repository.records(), &state.filter);
                    (outcome.added, view)
                }
                Ok(_) => return,
                Err(e) => {
                    error!(session_id = %self.id, "Reconciliation failed: {:?}", e);
                    return;
                }
            }
        };

        self.emit(ServerMessage::DashboardUpdated { view });
        for record in added {
            self.emit(ServerMessage::RecordReceived {
                id: record.id,
                title: record.title,
            });
        }
    }
}
