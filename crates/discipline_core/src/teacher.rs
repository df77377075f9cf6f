//! crates/discipline_core/src/teacher.rs
//!
//! The teacher's side of the store: the case activity table and the inbox
//! used to hand cases to a student's session.

use crate::domain::{CaseId, CasePriority, CaseStatus, TeacherCase};
use crate::keys::StoreKey;
use crate::ports::{PortError, PortResult, RecordStore};
use crate::repository::parse_array;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A case a teacher sends to a student. Unset fields take the record defaults
/// when the student's session merges it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushedCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CaseId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<CasePriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub student: String,
}

/// Update of one activity-table row. `None` keeps the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeacherCaseEdit {
    pub student: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
}

pub struct TeacherCaseBook {
    store: Arc<dyn RecordStore>,
}

impl TeacherCaseBook {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Reads the activity table. Malformed rows are skipped.
    pub async fn load(&self) -> PortResult<Vec<TeacherCase>> {
        let raw = self.store.get(StoreKey::TeacherCases).await?;
        let rows = parse_array(StoreKey::TeacherCases, raw.as_deref())
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<TeacherCase>(row) {
                Ok(case) => Some(case),
                Err(e) => {
                    warn!("Skipping malformed teacher case: {}", e);
                    None
                }
            })
            .collect();
        Ok(rows)
    }

    async fn save(&self, cases: &[TeacherCase]) -> PortResult<()> {
        let raw = serde_json::to_string(cases).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(StoreKey::TeacherCases, raw).await
    }

    pub async fn add(&self, case: TeacherCase) -> PortResult<Vec<TeacherCase>> {
        if case.student.trim().is_empty() || case.category.trim().is_empty() {
            return Err(PortError::InvalidInput("a case needs a student and a category".to_string()));
        }
        let mut cases = self.load().await?;
        cases.push(case);
        self.save(&cases).await?;
        info!(total = cases.len(), "Teacher added a case");
        Ok(cases)
    }

    pub async fn edit(&self, index: usize, edit: TeacherCaseEdit) -> PortResult<TeacherCase> {
        let mut cases = self.load().await?;
        let current = cases
            .get_mut(index)
            .ok_or_else(|| PortError::NotFound("Case not found".to_string()))?;
        if let Some(student) = edit.student {
            current.student = student.trim().to_string();
        }
        if let Some(category) = edit.category {
            current.category = category.trim().to_string();
        }
        if let Some(date) = edit.date {
            current.date = date.trim().to_string();
        }
        let updated = current.clone();
        self.save(&cases).await?;
        Ok(updated)
    }

    pub async fn delete(&self, index: usize) -> PortResult<TeacherCase> {
        let mut cases = self.load().await?;
        if index >= cases.len() {
            return Err(PortError::NotFound("Case not found".to_string()));
        }
        let removed = cases.remove(index);
        self.save(&cases).await?;
        info!(student = %removed.student, category = %removed.category, "Teacher deleted a case");
        Ok(removed)
    }

    /// Appends a case to the student inbox. A malformed inbox is replaced.
    ///
    /// Returns the number of records now waiting in the inbox.
    pub async fn push_to_student(&self, mut case: PushedCase) -> PortResult<usize> {
        if case.title.trim().is_empty() {
            return Err(PortError::InvalidInput("a pushed case needs a title".to_string()));
        }
        // The id is fixed here so every reader merges the same record.
        if case.id.is_none() {
            case.id = Some(CaseId::Text(format!("teacher-{}", Uuid::new_v4())));
        }
        let mut raw = serde_json::to_value(&case).map_err(|e| PortError::Unexpected(e.to_string()))?;
        if let Value::Object(obj) = &mut raw {
            obj.insert("source".into(), Value::String("teacher".into()));
        }

        let existing = self.store.get(StoreKey::Inbox).await?;
        let mut inbox = parse_array(StoreKey::Inbox, existing.as_deref());
        inbox.push(raw);
        let waiting = inbox.len();

        let text = serde_json::to_string(&inbox).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(StoreKey::Inbox, text).await?;
        info!(waiting, "Teacher pushed a case to the student inbox");
        Ok(waiting)
    }
}
