pub mod dashboard;
pub mod domain;
pub mod export;
pub mod filter;
pub mod keys;
pub mod ports;
pub mod profile;
pub mod reconcile;
pub mod repository;
pub mod stats;
pub mod teacher;

pub use dashboard::DashboardView;
pub use domain::{
    ActivityEntry, CaseId, CasePriority, CaseRecord, CaseSource, CaseStatus, NewComplaint, RecordOrigin,
    StudentProfile, TeacherCase, Theme,
};
pub use filter::{filter, CaseFilter};
pub use keys::StoreKey;
pub use ports::{ChangeNotifier, ChangeStream, PortError, PortResult, RecordStore};
pub use reconcile::{ListenerState, ReconcileOutcome, Reconciler, Trigger};
pub use repository::CaseRepository;
pub use stats::{aggregate, CaseStats};
pub use teacher::{PushedCase, TeacherCaseBook, TeacherCaseEdit};
