use chrono::NaiveDate;

use crate::filter::{FilterLimits, VisibilityCount};
use crate::pricing::PricingQuote;
use crate::record::Record;
use crate::run::RunProgress;
use crate::service::SearchResult;
use crate::summary::{CollectionSummary, DiagnosticsOutcome};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub min_days: u32,
    /// False while a collection is in flight.
    pub collect_enabled: bool,
    pub collection_progress: Option<RunProgress>,
    pub collection_label: Option<String>,
    pub last_collection: Option<CollectionSummary>,
    pub notice: Option<String>,
    pub diagnostics_running: bool,
    pub diagnostics_label: Option<String>,
    pub last_diagnostics: Option<DiagnosticsOutcome>,
    /// Visible records only, in load order.
    pub records: Vec<RecordRowView>,
    pub visibility: VisibilityCount,
    pub limits: FilterLimits,
    pub filter_error: Option<String>,
    pub usd_brl: f64,
    pub link_tokens: u64,
    pub quote: Option<PricingQuote>,
    pub search: Option<SearchResult>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordRowView {
    pub uid: String,
    pub group: String,
    pub source: String,
    pub title: String,
    pub link: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub status: Option<String>,
}

impl From<&Record> for RecordRowView {
    fn from(record: &Record) -> Self {
        Self {
            uid: record.uid.clone(),
            group: record.group.clone(),
            source: record.source.clone(),
            title: record
                .title
                .clone()
                .unwrap_or_else(|| "(untitled)".to_string()),
            link: record.link.clone(),
            deadline: record.deadline,
            amount: record.amount,
            status: record.status.clone(),
        }
    }
}
