//! crates/discipline_core/src/stats.rs
//!
//! Counts by status and priority. Summary counters, chart datasets and the
//! notification badge are all derived from one `CaseStats` value.

use crate::domain::{CasePriority, CaseRecord, CaseStatus};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseStats {
    pub by_status: BTreeMap<CaseStatus, usize>,
    pub by_priority: BTreeMap<CasePriority, usize>,
}

/// Counts `records` by status and priority. Every enum value has an entry.
pub fn aggregate(records: &[CaseRecord]) -> CaseStats {
    let mut by_status: BTreeMap<CaseStatus, usize> = CaseStatus::ALL.into_iter().map(|s| (s, 0)).collect();
    let mut by_priority: BTreeMap<CasePriority, usize> =
        CasePriority::ALL.into_iter().map(|p| (p, 0)).collect();

    for record in records {
        *by_status.entry(record.status).or_default() += 1;
        *by_priority.entry(record.priority).or_default() += 1;
    }

    CaseStats { by_status, by_priority }
}

impl CaseStats {
    pub fn total(&self) -> usize {
        self.by_status.values().sum()
    }

    pub fn status(&self, status: CaseStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn priority(&self, priority: CasePriority) -> usize {
        self.by_priority.get(&priority).copied().unwrap_or(0)
    }

    /// Cases that still need attention: pending plus in progress.
    pub fn open(&self) -> usize {
        CaseStatus::ALL
            .into_iter()
            .filter(|s| s.is_open())
            .map(|s| self.status(s))
            .sum()
    }

    pub fn summary(&self) -> SummaryCounters {
        SummaryCounters {
            total: self.total(),
            pending: self.status(CaseStatus::Pending),
            resolved: self.status(CaseStatus::Resolved),
            urgent: self.priority(CasePriority::Urgent),
        }
    }

    pub fn status_chart(&self) -> ChartDataset {
        ChartDataset {
            labels: CaseStatus::ALL.iter().map(|s| s.label()).collect(),
            data: CaseStatus::ALL.iter().map(|s| self.status(*s)).collect(),
        }
    }

    pub fn priority_chart(&self) -> ChartDataset {
        ChartDataset {
            labels: CasePriority::ALL.iter().map(|p| p.label()).collect(),
            data: CasePriority::ALL.iter().map(|p| self.priority(*p)).collect(),
        }
    }

    /// Badge text for the notification bell, `None` when it should be hidden.
    pub fn badge(&self) -> Option<String> {
        match self.open() {
            0 => None,
            n if n > 9 => Some("9+".to_string()),
            n => Some(n.to_string()),
        }
    }
}

/// The four numbers shown on the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryCounters {
    pub total: usize,
    pub pending: usize,
    pub resolved: usize,
    pub urgent: usize,
}

/// Labels and values of one doughnut chart, in label order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDataset {
    pub labels: Vec<&'static str>,
    pub data: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseId, CaseSource};

    fn record(id: i64, status: CaseStatus, priority: CasePriority) -> CaseRecord {
        let mut r = CaseRecord::new(CaseId::Number(id), "case", CaseSource::Student);
        r.status = status;
        r.priority = priority;
        r
    }

    #[test]
    fn seeded_pair_counts() {
        let records = vec![
            record(1, CaseStatus::Pending, CasePriority::Low),
            record(2, CaseStatus::Resolved, CasePriority::Medium),
        ];
        let stats = aggregate(&records);

        assert_eq!(stats.status(CaseStatus::Pending), 1);
        assert_eq!(stats.status(CaseStatus::Resolved), 1);
        assert_eq!(stats.status(CaseStatus::InProgress), 0);
        assert_eq!(stats.status(CaseStatus::Rejected), 0);
        assert_eq!(stats.priority(CasePriority::Low), 1);
        assert_eq!(stats.priority(CasePriority::Medium), 1);
        assert_eq!(stats.priority(CasePriority::High), 0);
        assert_eq!(stats.priority(CasePriority::Urgent), 0);
    }

    #[test]
    fn empty_input_still_has_every_key() {
        let stats = aggregate(&[]);
        assert_eq!(stats.by_status.len(), 4);
        assert_eq!(stats.by_priority.len(), 4);
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.badge(), None);
    }

    #[test]
    fn status_counts_sum_to_length() {
        let records: Vec<_> = (0..13)
            .map(|i| record(i, CaseStatus::ALL[i as usize % 4], CasePriority::ALL[i as usize % 3]))
            .collect();
        let stats = aggregate(&records);
        assert_eq!(stats.by_status.values().sum::<usize>(), records.len());
        assert_eq!(stats.by_priority.values().sum::<usize>(), records.len());
    }

    #[test]
    fn counters_and_charts_share_the_counts() {
        let records = vec![
            record(1, CaseStatus::Pending, CasePriority::Urgent),
            record(2, CaseStatus::InProgress, CasePriority::Urgent),
            record(3, CaseStatus::Resolved, CasePriority::Low),
        ];
        let stats = aggregate(&records);

        let summary = stats.summary();
        assert_eq!((summary.total, summary.pending, summary.resolved, summary.urgent), (3, 1, 1, 2));
        assert_eq!(stats.status_chart().data, vec![1, 1, 1, 0]);
        assert_eq!(stats.priority_chart().data, vec![1, 0, 0, 2]);
        assert_eq!(stats.status_chart().labels[1], "In Progress");
        assert_eq!(stats.badge().as_deref(), Some("2"));
    }

    #[test]
    fn badge_caps_at_nine() {
        let records: Vec<_> = (0..12).map(|i| record(i, CaseStatus::Pending, CasePriority::Low)).collect();
        assert_eq!(aggregate(&records).badge().as_deref(), Some("9+"));
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(aggregate(&[])).unwrap();
        assert_eq!(json["byStatus"]["in-progress"], 0);
        assert_eq!(json["byPriority"]["urgent"], 0);
    }
}
