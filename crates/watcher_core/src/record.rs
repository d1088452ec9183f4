use chrono::NaiveDate;
use serde::Serialize;

/// A collected item as loaded from the service for one group query.
///
/// Fields are never changed locally; visibility lives beside the record in
/// [`crate::RecordBoard`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub uid: String,
    pub group: String,
    pub source: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub agency: Option<String>,
    pub region: Option<String>,
}

impl Record {
    pub fn new(uid: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            group: group.into(),
            source: String::new(),
            title: None,
            link: None,
            deadline: None,
            amount: None,
            status: None,
            notes: None,
            agency: None,
            region: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<NaiveDate>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_amount(mut self, amount: Option<f64>) -> Self {
        self.amount = amount;
        self
    }
}

/// Parses the date part of an ISO timestamp (`2025-03-10T12:00:00` or `2025-03-10`).
///
/// Invalid dates are treated as absent.
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
