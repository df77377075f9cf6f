//! crates/discipline_core/src/export.rs
//!
//! Download formats for the currently filtered record set.

use crate::domain::CaseRecord;
use chrono::NaiveDate;
use serde::Deserialize;

pub const CSV_HEADER: &str = "ID,Title,Status,Priority,Date,Category,Description";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    /// Name of the downloaded file. CSV exports carry the export date.
    pub fn file_name(self, today: NaiveDate) -> String {
        match self {
            ExportFormat::Csv => format!("complaints_export_{}.csv", today.format("%Y-%m-%d")),
            ExportFormat::Json => "complaints.json".to_string(),
        }
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Renders records as CSV. Every free-text column is quoted.
pub fn to_csv(records: &[CaseRecord]) -> String {
    let mut csv = String::with_capacity(64 * (records.len() + 1));
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for r in records {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            r.id,
            quoted(&r.title),
            r.status,
            r.priority,
            quoted(&r.date),
            quoted(&r.category),
            quoted(&r.description),
        ));
    }
    csv
}

/// Renders records as a pretty-printed JSON array.
pub fn to_json(records: &[CaseRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

pub fn render(records: &[CaseRecord], format: ExportFormat) -> Result<String, serde_json::Error> {
    match format {
        ExportFormat::Csv => Ok(to_csv(records)),
        ExportFormat::Json => to_json(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseId, CasePriority, CaseSource, CaseStatus};

    fn two_records() -> Vec<CaseRecord> {
        let mut a = CaseRecord::new(CaseId::Number(1), "Late to class", CaseSource::Student);
        a.description = "Said \"sorry\" twice".to_string();
        a.date = "2024-03-01".to_string();
        a.category = "Late Arrival".to_string();
        a.priority = CasePriority::Low;

        let mut b = CaseRecord::new(CaseId::Number(2), "Uniform \"shoes\"", CaseSource::Teacher);
        b.date = "2024-03-02".to_string();
        b.category = "Uniform Violation".to_string();
        b.status = CaseStatus::Resolved;
        vec![a, b]
    }

    #[test]
    fn csv_has_header_and_doubled_quotes() {
        let csv = to_csv(&two_records());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "1,\"Late to class\",pending,low,\"2024-03-01\",\"Late Arrival\",\"Said \"\"sorry\"\" twice\""
        );
        assert_eq!(
            lines[2],
            "2,\"Uniform \"\"shoes\"\"\",resolved,medium,\"2024-03-02\",\"Uniform Violation\",\"\""
        );
        assert_eq!(lines.len(), 3);
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn commas_in_category_stay_in_one_column() {
        let mut record = CaseRecord::new(CaseId::Number(3), "Phone", CaseSource::Student);
        record.category = "Devices, phones".to_string();
        record.date = "2024-03-03".to_string();

        let csv = to_csv(&[record]);
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "3,\"Phone\",pending,medium,\"2024-03-03\",\"Devices, phones\",\"\"");
    }

    #[test]
    fn empty_export_is_just_the_header() {
        assert_eq!(to_csv(&[]), format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn json_export_keeps_provenance() {
        let json = to_json(&two_records()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[1]["source"], "teacher");
        assert_eq!(parsed[0]["status"], "pending");
    }

    #[test]
    fn file_names() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 9).unwrap();
        assert_eq!(ExportFormat::Csv.file_name(day), "complaints_export_2024-05-09.csv");
        assert_eq!(ExportFormat::Json.file_name(day), "complaints.json");
    }
}
