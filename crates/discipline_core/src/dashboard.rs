//! crates/discipline_core/src/dashboard.rs
//!
//! The output of one read → filter → aggregate pass, ready for rendering.

use crate::domain::CaseRecord;
use crate::filter::CaseFilter;
use crate::stats::{aggregate, CaseStats, ChartDataset, SummaryCounters};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

const RECENT_LIMIT: usize = 3;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub filter: CaseFilter,
    /// Records matching the filter, in repository order.
    pub cases: Vec<CaseRecord>,
    /// The newest records regardless of the filter.
    pub recent: Vec<CaseRecord>,
    /// Counts over every record, not just the filtered ones.
    pub stats: CaseStats,
    pub summary: SummaryCounters,
    pub status_chart: ChartDataset,
    pub priority_chart: ChartDataset,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

impl DashboardView {
    pub fn build(records: &[CaseRecord], filter: &CaseFilter) -> Self {
        let stats = aggregate(records);
        Self {
            filter: filter.clone(),
            cases: filter.apply(records),
            recent: most_recent(records, RECENT_LIMIT),
            summary: stats.summary(),
            status_chart: stats.status_chart(),
            priority_chart: stats.priority_chart(),
            badge: stats.badge(),
            stats,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

fn parse_date(value: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.naive_utc())
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// The `limit` newest records by date. Undated records sort last.
pub fn most_recent(records: &[CaseRecord], limit: usize) -> Vec<CaseRecord> {
    let mut sorted: Vec<&CaseRecord> = records.iter().collect();
    sorted.sort_by(|a, b| parse_date(&b.date).cmp(&parse_date(&a.date)));
    sorted.into_iter().take(limit).cloned().collect()
}
