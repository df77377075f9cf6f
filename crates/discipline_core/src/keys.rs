//! crates/discipline_core/src/keys.rs
//!
//! Well-known names of the persisted store. The names are shared with the
//! dashboard pages and must not change.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    StudentProfile,
    StudentComplaints,
    TeacherCases,
    Inbox,
    Activities,
    Theme,
    /// Unversioned complaint list written by older dashboards.
    LegacyComplaints,
}

impl StoreKey {
    pub const ALL: [StoreKey; 7] = [
        StoreKey::StudentProfile,
        StoreKey::StudentComplaints,
        StoreKey::TeacherCases,
        StoreKey::Inbox,
        StoreKey::Activities,
        StoreKey::Theme,
        StoreKey::LegacyComplaints,
    ];

    /// Keys erased at session bootstrap so one student's data never reaches the next.
    pub const SESSION_SCOPED: [StoreKey; 6] = [
        StoreKey::StudentProfile,
        StoreKey::StudentComplaints,
        StoreKey::LegacyComplaints,
        StoreKey::TeacherCases,
        StoreKey::Inbox,
        StoreKey::Activities,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::StudentProfile => "studentProfile_v1",
            StoreKey::StudentComplaints => "studentComplaints_v1",
            StoreKey::TeacherCases => "cases",
            StoreKey::Inbox => "newComplaintsForStudent",
            StoreKey::Activities => "studentActivities_v1",
            StoreKey::Theme => "theme",
            StoreKey::LegacyComplaints => "studentComplaints",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
