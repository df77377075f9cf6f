//! crates/discipline_core/src/repository.rs
//!
//! The case repository owns one session's canonical list of records and is the
//! only component that reads or writes the complaint list in the store.

use crate::domain::{CaseId, CaseRecord, CaseSource, NewComplaint, RecordOrigin};
use crate::keys::StoreKey;
use crate::ports::{PortError, PortResult, RecordStore};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Parses a persisted JSON array. Anything else is logged and read as empty.
pub(crate) fn parse_array(key: StoreKey, raw: Option<&str>) -> Vec<Value> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Null) => Vec::new(),
        Ok(other) => {
            warn!(key = %key, "Persisted value is not an array ({}), reading as empty", kind_of(&other));
            Vec::new()
        }
        Err(e) => {
            warn!(key = %key, "Failed to parse persisted value, reading as empty: {}", e);
            Vec::new()
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Normalizes a persisted array of raw records, skipping non-object entries.
pub(crate) fn normalize_all(items: &[Value], origin: impl Fn(usize) -> RecordOrigin) -> Vec<CaseRecord> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let record = CaseRecord::normalize(raw, origin(index), CaseId::Text(format!("local-{}", index)));
            if record.is_none() {
                debug!("Skipping non-object record at index {}", index);
            }
            record
        })
        .collect()
}

/// The per-session record collection and its persistence rules.
pub struct CaseRepository {
    store: Arc<dyn RecordStore>,
    snapshot: Option<Vec<Value>>,
    records: Vec<CaseRecord>,
}

impl CaseRepository {
    /// A repository that reads the student's persisted list.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            snapshot: None,
            records: Vec::new(),
        }
    }

    /// A repository whose reads are answered by a server-delivered snapshot.
    pub fn with_snapshot(store: Arc<dyn RecordStore>, snapshot: Vec<Value>) -> Self {
        Self {
            store,
            snapshot: Some(snapshot),
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Resolves the session's records and makes them the current collection.
    ///
    /// A server snapshot, when present, is used verbatim and the local store is
    /// not consulted at all.
    pub async fn load_records(&mut self) -> PortResult<Vec<CaseRecord>> {
        let records = match &self.snapshot {
            Some(snapshot) => {
                normalize_all(snapshot, |index| RecordOrigin::ServerSnapshot { index })
            }
            None => self.read_local().await?.unwrap_or_default(),
        };
        info!(count = records.len(), from_snapshot = self.snapshot.is_some(), "Loaded case records");
        self.records = records.clone();
        Ok(records)
    }

    /// Re-reads the persisted list after another session wrote it.
    ///
    /// Keeps the current collection when the key does not exist. Returns whether
    /// the collection was replaced.
    pub async fn reload_local(&mut self) -> PortResult<bool> {
        match self.read_local().await? {
            Some(records) => {
                self.records = records;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn read_local(&self) -> PortResult<Option<Vec<CaseRecord>>> {
        let Some(raw) = self.store.get(StoreKey::StudentComplaints).await? else {
            return Ok(None);
        };
        let items = parse_array(StoreKey::StudentComplaints, Some(&raw));
        Ok(Some(normalize_all(&items, |_| RecordOrigin::LocalStore)))
    }

    /// Replaces the persisted list with `records` (last writer wins).
    pub async fn save_records(&mut self, records: Vec<CaseRecord>) -> PortResult<()> {
        self.records = records;
        self.persist().await
    }

    async fn persist(&self) -> PortResult<()> {
        let items: Vec<Value> = self.records.iter().map(CaseRecord::to_persisted).collect();
        let raw = serde_json::to_string(&items).map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(StoreKey::StudentComplaints, raw).await
    }

    /// Erases every session-scoped key so no data survives into the next login.
    pub async fn clear_all(&mut self) -> PortResult<()> {
        for key in StoreKey::SESSION_SCOPED {
            self.store.remove(key).await?;
        }
        self.records.clear();
        info!("Cleared session-scoped store keys");
        Ok(())
    }

    /// Appends every incoming record whose id is not known yet.
    ///
    /// Returns the records that were added, one per "new record" notification.
    /// Nothing is written when every record was already known.
    pub async fn upsert_from_external(&mut self, incoming: Vec<CaseRecord>) -> PortResult<Vec<CaseRecord>> {
        let mut added = Vec::new();
        for record in incoming {
            if self.contains(&record.id) {
                debug!(id = %record.id, "Skipping already known record");
                continue;
            }
            self.records.push(record.clone());
            added.push(record);
        }
        if !added.is_empty() {
            self.persist().await?;
            info!(added = added.len(), "Merged externally pushed records");
        }
        Ok(added)
    }

    pub fn contains(&self, id: &CaseId) -> bool {
        self.records.iter().any(|r| &r.id == id)
    }

    pub fn get(&self, id: &CaseId) -> Option<&CaseRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Looks up an id by its textual form, as it appears in a URL path.
    pub fn find_id(&self, text: &str) -> Option<CaseId> {
        self.records
            .iter()
            .find(|r| r.id.to_string() == text)
            .map(|r| r.id.clone())
    }

    /// The next free numeric id: one past the largest numeric id, starting at 1.
    pub fn next_numeric_id(&self) -> PortResult<i64> {
        match self.records.iter().filter_map(|r| r.id.as_number()).max() {
            None => Ok(1),
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| PortError::InvalidInput(format!("no numeric id left after {}", max))),
        }
    }

    /// Records a complaint submitted by the student.
    pub async fn submit(&mut self, complaint: NewComplaint) -> PortResult<CaseRecord> {
        let title = complaint.title.trim();
        if title.is_empty() {
            return Err(PortError::InvalidInput("a complaint needs a title".to_string()));
        }

        let mut record = CaseRecord::new(CaseId::Number(self.next_numeric_id()?), title, CaseSource::Student);
        record.description = complaint.description;
        record.category = complaint
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "General".to_string());
        record.priority = complaint.priority.unwrap_or_default();
        record.course = complaint.course;
        if let Some(date) = complaint.date.filter(|d| !d.is_empty()) {
            record.date = date;
        }

        self.records.push(record.clone());
        self.persist().await?;
        info!(id = %record.id, "Student submitted a complaint");
        Ok(record)
    }

    /// Marks a student-authored record as resolved.
    pub async fn resolve(&mut self, id: &CaseId) -> PortResult<CaseRecord> {
        let index = self.editable_index(id)?;
        self.records[index].status = crate::domain::CaseStatus::Resolved;
        self.persist().await?;
        Ok(self.records[index].clone())
    }

    /// Deletes a student-authored record.
    pub async fn delete(&mut self, id: &CaseId) -> PortResult<CaseRecord> {
        let index = self.editable_index(id)?;
        let removed = self.records.remove(index);
        self.persist().await?;
        info!(id = %removed.id, "Student deleted a complaint");
        Ok(removed)
    }

    fn editable_index(&self, id: &CaseId) -> PortResult<usize> {
        let index = self
            .records
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Case {}", id)))?;
        let record = &self.records[index];
        if !record.is_student_editable() {
            return Err(PortError::PermissionDenied(format!(
                "case {} was submitted by {} and is read only",
                id, record.source
            )));
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_arrays_read_as_empty() {
        assert!(parse_array(StoreKey::StudentComplaints, Some("{not json")).is_empty());
        assert!(parse_array(StoreKey::StudentComplaints, Some("{\"a\":1}")).is_empty());
        assert!(parse_array(StoreKey::StudentComplaints, Some("null")).is_empty());
        assert!(parse_array(StoreKey::StudentComplaints, None).is_empty());
        assert_eq!(parse_array(StoreKey::StudentComplaints, Some("[1,2]")).len(), 2);
    }

    #[test]
    fn normalize_all_skips_non_objects() {
        let items = vec![serde_json::json!({"id": 1, "title": "a"}), serde_json::json!("junk")];
        let records = normalize_all(&items, |_| RecordOrigin::LocalStore);
        assert_eq!(records.len(), 1);
    }
}
