//! Values exchanged with the collection service, independent of the wire format.

use serde::Serialize;

use crate::pricing::RemoteCost;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ServiceConfig {
    pub available_groups: Vec<String>,
    pub min_days: Option<u32>,
    pub usd_brl: Option<f64>,
    pub status_choices: Vec<String>,
}

/// Metrics returned by one group collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CollectCounts {
    pub fixed_links: u64,
    pub new_items: u64,
}

/// Free-text provider patterns, one per provider family.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DiagnosticsPatterns {
    pub gov: String,
    pub funda: String,
    pub corp: String,
    pub latam: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsRow {
    pub group: String,
    pub source: String,
    pub item_count: u64,
    pub elapsed_seconds: f64,
    pub error: Option<String>,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DiagnosticsReport {
    pub rows: Vec<DiagnosticsRow>,
    /// Tabular log; the first row, when present, holds the column names.
    pub logs: Vec<Vec<String>>,
}

impl DiagnosticsReport {
    /// True when the call completed but no provider was reported.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Log rows below the header, cells joined with ` | `.
    pub fn log_lines(&self) -> Vec<String> {
        self.logs.iter().skip(1).map(|row| row.join(" | ")).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub prompt: String,
    pub model: String,
    pub mode_label: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub input_per_million: f64,
    pub output_per_million: f64,
    pub usd_brl: f64,
    pub save: bool,
    pub link_tokens: u64,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchResult {
    pub summary: Option<String>,
    pub links: Vec<String>,
    /// Error text reported by the service in an otherwise successful response.
    pub error: Option<String>,
    pub remote: RemoteCost,
}
