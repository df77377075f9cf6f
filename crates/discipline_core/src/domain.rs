//! crates/discipline_core/src/domain.rs
//!
//! Defines the core data structures for disciplinary cases and the student
//! data that lives next to them in the persisted store.
//!
//! Records arrive in three raw shapes (server snapshot, local store, inbox).
//! `CaseRecord::normalize` is the single place where those shapes are mapped
//! into the canonical record and where missing or unknown values are coerced.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

//=========================================================================================
// Identifiers and Enumerations
//=========================================================================================

/// The de-duplication key of a case. Persisted data carries either numbers or strings.
///
/// Equality is strict: `1` and `"1"` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaseId {
    Number(i64),
    Text(String),
}

impl CaseId {
    /// Reads an id from a raw JSON value. Floats and other shapes are not ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(CaseId::Number),
            Value::String(s) if !s.is_empty() => Some(CaseId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            CaseId::Number(n) => Some(*n),
            CaseId::Text(_) => None,
        }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseId::Number(n) => write!(f, "{}", n),
            CaseId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CaseId {
    fn from(n: i64) -> Self {
        CaseId::Number(n)
    }
}

impl From<&str> for CaseId {
    fn from(s: &str) -> Self {
        CaseId::Text(s.to_string())
    }
}

/// Workflow state of a case.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum CaseStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Rejected,
}

impl CaseStatus {
    /// All statuses in chart order.
    pub const ALL: [CaseStatus; 4] = [
        CaseStatus::Pending,
        CaseStatus::InProgress,
        CaseStatus::Resolved,
        CaseStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::InProgress => "in-progress",
            CaseStatus::Resolved => "resolved",
            CaseStatus::Rejected => "rejected",
        }
    }

    /// Human-readable chart label.
    pub fn label(self) -> &'static str {
        match self {
            CaseStatus::Pending => "Pending",
            CaseStatus::InProgress => "In Progress",
            CaseStatus::Resolved => "Resolved",
            CaseStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Open cases count towards the notification badge.
    pub fn is_open(self) -> bool {
        matches!(self, CaseStatus::Pending | CaseStatus::InProgress)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of a case.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CasePriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl CasePriority {
    /// All priorities in chart order.
    pub const ALL: [CasePriority; 4] = [
        CasePriority::Low,
        CasePriority::Medium,
        CasePriority::High,
        CasePriority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CasePriority::Low => "low",
            CasePriority::Medium => "medium",
            CasePriority::High => "high",
            CasePriority::Urgent => "urgent",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CasePriority::Low => "Low",
            CasePriority::Medium => "Medium",
            CasePriority::High => "High",
            CasePriority::Urgent => "Urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == value)
    }
}

impl fmt::Display for CasePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who authored a case. Only student-authored cases are editable from the student side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSource {
    Student,
    Teacher,
    Server,
}

impl CaseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseSource::Student => "student",
            CaseSource::Teacher => "teacher",
            CaseSource::Server => "server",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(CaseSource::Student),
            "teacher" => Some(CaseSource::Teacher),
            "server" => Some(CaseSource::Server),
            _ => None,
        }
    }

    pub fn is_student_editable(self) -> bool {
        self == CaseSource::Student
    }
}

impl fmt::Display for CaseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// CaseRecord
//=========================================================================================

/// Where a raw record was read from. Drives the id and source defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOrigin {
    /// Page-load snapshot delivered by the server. Ids are positional.
    ServerSnapshot { index: usize },
    /// The student's own persisted complaint list.
    LocalStore,
    /// Records pushed into the inbox key by another session.
    Inbox,
}

/// One disciplinary entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub id: CaseId,
    pub title: String,
    pub description: String,
    pub date: String,
    pub status: CaseStatus,
    pub priority: CasePriority,
    pub source: CaseSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub category: String,
    pub course: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub student: String,
    /// The object this record was read from. Persisting starts from it.
    #[serde(skip)]
    raw: Map<String, Value>,
}

impl CaseRecord {
    /// Maps any of the raw record shapes into a canonical `CaseRecord`.
    ///
    /// `fallback_id` is used when the raw object has no usable id. Returns `None`
    /// for values that are not JSON objects.
    pub fn normalize(raw: &Value, origin: RecordOrigin, fallback_id: CaseId) -> Option<Self> {
        let obj = raw.as_object()?;

        let id = match origin {
            RecordOrigin::ServerSnapshot { index } => CaseId::Text(format!("server-{}", index)),
            _ => obj.get("id").and_then(CaseId::from_value).unwrap_or(fallback_id),
        };
        let source = match origin {
            RecordOrigin::ServerSnapshot { .. } => CaseSource::Server,
            RecordOrigin::LocalStore => read_source(obj).unwrap_or(CaseSource::Student),
            RecordOrigin::Inbox => read_source(obj).unwrap_or(CaseSource::Teacher),
        };

        Some(Self {
            id,
            title: read_title(obj),
            description: read_description(obj),
            date: text(obj, "date").unwrap_or_else(now_timestamp),
            status: read_status(obj),
            priority: read_priority(obj),
            source,
            response: text(obj, "response"),
            category: read_category(obj),
            course: text(obj, "course").unwrap_or_default(),
            student: text(obj, "student").unwrap_or_default(),
            raw: obj.clone(),
        })
    }

    /// Creates a brand-new record. Every field is persisted on the first save.
    pub fn new(id: CaseId, title: impl Into<String>, source: CaseSource) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            date: now_timestamp(),
            status: CaseStatus::default(),
            priority: CasePriority::default(),
            source,
            response: None,
            category: String::new(),
            course: String::new(),
            student: String::new(),
            raw: Map::new(),
        }
    }

    /// Builds the JSON object written back to the store.
    ///
    /// Starts from the raw object the record was read from. `id`, `source` and
    /// `date` are always written. Every other field is only written when its value
    /// differs from what the raw object reads as, so unknown persisted values stay
    /// untouched until explicitly edited.
    pub fn to_persisted(&self) -> Value {
        let raw = &self.raw;
        let mut out = raw.clone();

        out.insert("id".into(), serde_json::to_value(&self.id).unwrap_or(Value::Null));
        out.insert("source".into(), Value::String(self.source.as_str().into()));
        out.insert("date".into(), Value::String(self.date.clone()));

        if raw.is_empty() || self.title != read_title(raw) {
            out.insert("title".into(), Value::String(self.title.clone()));
        }
        if raw.is_empty() || self.description != read_description(raw) {
            out.remove("desc");
            out.insert("description".into(), Value::String(self.description.clone()));
        }
        if raw.is_empty() || self.status != read_status(raw) {
            out.insert("status".into(), Value::String(self.status.as_str().into()));
        }
        if raw.is_empty() || self.priority != read_priority(raw) {
            out.insert("priority".into(), Value::String(self.priority.as_str().into()));
        }
        if self.response != text(raw, "response") {
            match &self.response {
                Some(r) => out.insert("response".into(), Value::String(r.clone())),
                None => out.insert("response".into(), Value::Null),
            };
        }
        if raw.is_empty() || self.category != read_category(raw) {
            out.insert("category".into(), Value::String(self.category.clone()));
        }
        if raw.is_empty() || self.course != text(raw, "course").unwrap_or_default() {
            out.insert("course".into(), Value::String(self.course.clone()));
        }
        if !self.student.is_empty() && self.student != text(raw, "student").unwrap_or_default() {
            out.insert("student".into(), Value::String(self.student.clone()));
        }

        Value::Object(out)
    }

    pub fn is_student_editable(&self) -> bool {
        self.source.is_student_editable()
    }
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn read_title(obj: &Map<String, Value>) -> String {
    text(obj, "title")
        .or_else(|| text(obj, "category"))
        .or_else(|| text(obj, "case_type"))
        .unwrap_or_default()
}

fn read_description(obj: &Map<String, Value>) -> String {
    text(obj, "description")
        .or_else(|| text(obj, "desc"))
        .unwrap_or_default()
}

fn read_category(obj: &Map<String, Value>) -> String {
    text(obj, "category")
        .or_else(|| text(obj, "case_type"))
        .unwrap_or_default()
}

fn read_status(obj: &Map<String, Value>) -> CaseStatus {
    obj.get("status")
        .and_then(Value::as_str)
        .and_then(CaseStatus::parse)
        .unwrap_or_default()
}

fn read_priority(obj: &Map<String, Value>) -> CasePriority {
    obj.get("priority")
        .and_then(Value::as_str)
        .and_then(CasePriority::parse)
        .unwrap_or_default()
}

fn read_source(obj: &Map<String, Value>) -> Option<CaseSource> {
    obj.get("source").and_then(Value::as_str).and_then(CaseSource::parse)
}

/// Current time as an RFC 3339 timestamp, the default `date` of a record.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

//=========================================================================================
// Submissions
//=========================================================================================

/// A complaint submitted by a student from the dashboard form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComplaint {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<CasePriority>,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub date: Option<String>,
}

//=========================================================================================
// Student Data
//=========================================================================================

/// The student profile as persisted under the profile key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentProfile {
    pub full_name: String,
    pub student_id: String,
    pub email: String,
    pub phone: String,
    pub course: String,
    pub address: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub year: String,
    pub image: String,
}

impl StudentProfile {
    /// Name shown in the dashboard header.
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            "Student User"
        } else {
            &self.full_name
        }
    }
}

/// One entry of the recent-activity list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub action: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Dashboard colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

//=========================================================================================
// Teacher Data
//=========================================================================================

/// A row of the teacher's case activity table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherCase {
    #[serde(default)]
    pub student: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Fields written by other tools are kept through edits.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_snapshot_rows_get_positional_ids_and_defaults() {
        let raw = json!({ "case_type": "Late Arrival", "date": "2024-03-01", "description": "" });
        let record =
            CaseRecord::normalize(&raw, RecordOrigin::ServerSnapshot { index: 3 }, CaseId::Number(0))
                .unwrap();

        assert_eq!(record.id, CaseId::Text("server-3".into()));
        assert_eq!(record.title, "Late Arrival");
        assert_eq!(record.category, "Late Arrival");
        assert_eq!(record.status, CaseStatus::Pending);
        assert_eq!(record.priority, CasePriority::Medium);
        assert_eq!(record.source, CaseSource::Server);
    }

    #[test]
    fn local_rows_default_to_student_source() {
        let raw = json!({ "id": 7, "title": "Late to class", "desc": "30 mins", "status": "resolved" });
        let record = CaseRecord::normalize(&raw, RecordOrigin::LocalStore, CaseId::Number(0)).unwrap();

        assert_eq!(record.id, CaseId::Number(7));
        assert_eq!(record.description, "30 mins");
        assert_eq!(record.status, CaseStatus::Resolved);
        assert_eq!(record.source, CaseSource::Student);
    }

    #[test]
    fn inbox_rows_default_to_teacher_source() {
        let raw = json!({ "title": "Uniform" });
        let record = CaseRecord::normalize(&raw, RecordOrigin::Inbox, CaseId::Number(4)).unwrap();

        assert_eq!(record.id, CaseId::Number(4));
        assert_eq!(record.source, CaseSource::Teacher);
        assert!(!record.date.is_empty());
    }

    #[test]
    fn non_objects_are_not_records() {
        assert!(CaseRecord::normalize(&json!(42), RecordOrigin::LocalStore, CaseId::Number(1)).is_none());
    }

    #[test]
    fn unknown_values_survive_persisting_until_edited() {
        let raw = json!({ "id": 1, "title": "X", "status": "escalated", "priority": "p0", "source": "student" });
        let mut record = CaseRecord::normalize(&raw, RecordOrigin::LocalStore, CaseId::Number(0)).unwrap();
        assert_eq!(record.status, CaseStatus::Pending);

        let persisted = record.to_persisted();
        assert_eq!(persisted["status"], "escalated");
        assert_eq!(persisted["priority"], "p0");

        record.status = CaseStatus::Resolved;
        let persisted = record.to_persisted();
        assert_eq!(persisted["status"], "resolved");
        assert_eq!(persisted["priority"], "p0");
    }

    #[test]
    fn new_records_persist_every_field() {
        let record = CaseRecord::new(CaseId::Number(3), "Noise", CaseSource::Student);
        let persisted = record.to_persisted();

        assert_eq!(persisted["id"], 3);
        assert_eq!(persisted["status"], "pending");
        assert_eq!(persisted["priority"], "medium");
        assert_eq!(persisted["source"], "student");
    }

    #[test]
    fn ids_compare_strictly() {
        assert_ne!(CaseId::Number(1), CaseId::Text("1".into()));
        assert_eq!(CaseId::from_value(&json!("abc")), Some(CaseId::Text("abc".into())));
        assert_eq!(CaseId::from_value(&json!(1.5)), None);
    }

    #[test]
    fn teacher_rows_keep_unknown_fields() {
        let row: TeacherCase =
            serde_json::from_value(json!({ "student": "Ann", "category": "Other", "date": "2024-01-01", "room": "B2" }))
                .unwrap();
        assert_eq!(row.extra["room"], "B2");
        let back = serde_json::to_value(&row).unwrap();
        assert_eq!(back["room"], "B2");
    }
}
