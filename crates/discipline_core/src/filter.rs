//! crates/discipline_core/src/filter.rs
//!
//! Search and filter over a record list, shared by every dashboard.

use crate::domain::CaseRecord;
use serde::{Deserialize, Serialize};

/// The wildcard value of the status and priority selectors.
pub const ALL: &str = "all";

/// The dashboard's search box and the two selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseFilter {
    pub q: String,
    pub status: String,
    pub priority: String,
}

impl Default for CaseFilter {
    fn default() -> Self {
        Self {
            q: String::new(),
            status: ALL.to_string(),
            priority: ALL.to_string(),
        }
    }
}

impl CaseFilter {
    pub fn new(q: impl Into<String>, status: impl Into<String>, priority: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            status: status.into(),
            priority: priority.into(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.q.trim().is_empty() && self.status == ALL && self.priority == ALL
    }

    pub fn matches(&self, record: &CaseRecord) -> bool {
        let query = self.q.trim().to_lowercase();
        let text_ok = query.is_empty()
            || record.title.to_lowercase().contains(&query)
            || record.description.to_lowercase().contains(&query);
        let status_ok = self.status == ALL || record.status.as_str() == self.status;
        let priority_ok = self.priority == ALL || record.priority.as_str() == self.priority;
        text_ok && status_ok && priority_ok
    }

    pub fn apply(&self, records: &[CaseRecord]) -> Vec<CaseRecord> {
        filter(records, &self.q, &self.status, &self.priority)
    }
}

/// Returns the records matching all three predicates, in input order.
///
/// `query` matches case-insensitively against title and description. A selector
/// equal to `"all"` matches everything; any other value must equal the record's
/// status or priority exactly.
pub fn filter(records: &[CaseRecord], query: &str, status: &str, priority: &str) -> Vec<CaseRecord> {
    let query = query.trim().to_lowercase();
    records
        .iter()
        .filter(|r| {
            query.is_empty()
                || r.title.to_lowercase().contains(&query)
                || r.description.to_lowercase().contains(&query)
        })
        .filter(|r| status == ALL || r.status.as_str() == status)
        .filter(|r| priority == ALL || r.priority.as_str() == priority)
        .cloned()
        .collect()
}
