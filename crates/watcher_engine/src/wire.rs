//! JSON shapes of the collection service and their conversion into core values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use watcher_core::{
    normalize_amount, parse_amount, parse_deadline, CollectCounts, DiagnosticsPatterns,
    DiagnosticsReport, DiagnosticsRow, Record, RemoteCost, SearchRequest, SearchResult,
    ServiceConfig,
};
use watcher_logging::watch_warn;

/// Error entry the service attaches to any response.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ServiceErrorEntry {
    #[serde(default)]
    ts: Option<String>,
    #[serde(default, rename = "where")]
    location: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

pub(crate) fn log_service_errors(endpoint: &str, errors: &[ServiceErrorEntry]) {
    for entry in errors {
        watch_warn!(
            "Service reported an error on {} at {} [{}]: {}",
            endpoint,
            entry.location.as_deref().unwrap_or("?"),
            entry.ts.as_deref().unwrap_or("-"),
            entry.msg.as_deref().unwrap_or("")
        );
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfigResponse {
    #[serde(default)]
    pub config: ConfigWire,
    #[serde(default)]
    pub errors: Vec<ServiceErrorEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfigWire {
    #[serde(default)]
    config: HashMap<String, Value>,
    #[serde(default)]
    available_groups: Vec<String>,
    #[serde(default)]
    status_choices: Vec<String>,
}

impl ConfigWire {
    pub fn into_config(self) -> ServiceConfig {
        let min_days = self
            .config
            .get("MIN_DAYS")
            .and_then(value_to_f64)
            .filter(|d| *d >= 1.0 && *d <= f64::from(u32::MAX))
            .map(|d| d as u32);
        let usd_brl = self.config.get("USD_BRL").and_then(value_to_f64);
        ServiceConfig {
            available_groups: self.available_groups,
            min_days,
            usd_brl,
            status_choices: self.status_choices,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CollectBody<'a> {
    pub groups: [&'a str; 1],
    pub min_days: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CollectResponse {
    #[serde(default)]
    pub result: Option<CollectResultWire>,
    #[serde(default)]
    pub errors: Vec<ServiceErrorEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CollectResultWire {
    #[serde(default)]
    fixed_links: Option<Value>,
    #[serde(default)]
    new_items: Option<Value>,
}

impl CollectResultWire {
    pub fn into_counts(self) -> CollectCounts {
        CollectCounts {
            fixed_links: self.fixed_links.as_ref().and_then(value_to_u64).unwrap_or(0),
            new_items: self.new_items.as_ref().and_then(value_to_u64).unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DiagnosticsBody<'a> {
    re_gov: &'a str,
    re_funda: &'a str,
    re_corp: &'a str,
    re_latam: &'a str,
}

impl<'a> From<&'a DiagnosticsPatterns> for DiagnosticsBody<'a> {
    fn from(patterns: &'a DiagnosticsPatterns) -> Self {
        Self {
            re_gov: &patterns.gov,
            re_funda: &patterns.funda,
            re_corp: &patterns.corp,
            re_latam: &patterns.latam,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DiagnosticsResponse {
    #[serde(default)]
    pub diag: DiagnosticsWire,
    #[serde(default)]
    pub errors: Vec<ServiceErrorEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DiagnosticsWire {
    #[serde(default)]
    rows: Vec<DiagnosticsRowWire>,
    #[serde(default)]
    logs: Vec<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct DiagnosticsRowWire {
    #[serde(default, rename = "Grupo")]
    group: Option<Value>,
    #[serde(default, rename = "Fonte")]
    source: Option<Value>,
    #[serde(default, rename = "Itens")]
    items: Option<Value>,
    #[serde(default, rename = "Tempo (s)")]
    elapsed: Option<Value>,
    #[serde(default, rename = "Erro")]
    error: Option<Value>,
    #[serde(default, rename = "Hint")]
    hint: Option<Value>,
}

impl DiagnosticsWire {
    pub fn into_report(self) -> DiagnosticsReport {
        let rows = self
            .rows
            .into_iter()
            .map(|row| DiagnosticsRow {
                group: row.group.as_ref().map(value_to_text).unwrap_or_default(),
                source: row.source.as_ref().map(value_to_text).unwrap_or_default(),
                item_count: row.items.as_ref().and_then(value_to_u64).unwrap_or(0),
                elapsed_seconds: row.elapsed.as_ref().and_then(value_to_f64).unwrap_or(0.0),
                error: row.error.as_ref().and_then(non_blank_text),
                hint: row.hint.as_ref().and_then(non_blank_text),
            })
            .collect();
        let logs = self
            .logs
            .into_iter()
            .map(|row| row.iter().map(value_to_text).collect())
            .collect();
        DiagnosticsReport { rows, logs }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ItemsResponse {
    #[serde(default)]
    pub items: ItemsWire,
    #[serde(default)]
    pub errors: Vec<ServiceErrorEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ItemsWire {
    #[serde(default)]
    sources: Vec<SourceWire>,
}

#[derive(Debug, Default, Deserialize)]
struct SourceWire {
    #[serde(default)]
    source: String,
    #[serde(default)]
    items: Vec<ItemWire>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemWire {
    #[serde(default)]
    uid: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    deadline_iso: Option<String>,
    #[serde(default)]
    value_brl: Option<Value>,
    #[serde(default)]
    amount_brl: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    agency: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

impl ItemsWire {
    /// Flattens sources into records. Items without a uid cannot be tracked and are skipped.
    pub fn into_records(self, group: &str) -> Vec<Record> {
        let mut records = Vec::new();
        for source in self.sources {
            for item in source.items {
                let Some(uid) = item.uid.as_ref().and_then(non_blank_text) else {
                    watch_warn!("Skipping item without uid in {}/{}", group, source.source);
                    continue;
                };
                // First present candidate wins, even when it does not parse.
                let amount = [&item.value_brl, &item.amount_brl, &item.value]
                    .into_iter()
                    .find_map(|candidate| candidate.as_ref().filter(|v| !v.is_null()))
                    .and_then(value_to_amount);
                records.push(Record {
                    uid,
                    group: group.to_string(),
                    source: source.source.clone(),
                    title: item.title,
                    link: item.link,
                    deadline: item.deadline_iso.as_deref().and_then(parse_deadline),
                    amount,
                    status: item.status,
                    notes: item.notes,
                    agency: item.agency,
                    region: item.region,
                });
            }
        }
        records
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CountTokensBody<'a> {
    pub url: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CountTokensResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub tokens: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Vec<ServiceErrorEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchBody<'a> {
    prompt: &'a str,
    modelo_api: &'a str,
    modo_label: &'a str,
    temperature: f64,
    max_tokens: u32,
    pricing_in: f64,
    pricing_out: f64,
    usd_brl: f64,
    save: bool,
    link_tokens: u64,
    edital_link: Option<&'a str>,
}

impl<'a> From<&'a SearchRequest> for SearchBody<'a> {
    fn from(request: &'a SearchRequest) -> Self {
        Self {
            prompt: &request.prompt,
            modelo_api: &request.model,
            modo_label: &request.mode_label,
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
            pricing_in: request.input_per_million,
            pricing_out: request.output_per_million,
            usd_brl: request.usd_brl,
            save: request.save,
            link_tokens: request.link_tokens,
            edital_link: request.link.as_deref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub result: SearchResultWire,
    #[serde(default)]
    pub errors: Vec<ServiceErrorEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResultWire {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    links: Vec<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    tokens_in: Option<Value>,
    #[serde(default)]
    estimated_cost_usd: Option<Value>,
    #[serde(default)]
    estimated_cost_brl: Option<Value>,
}

impl SearchResultWire {
    pub fn into_result(self) -> SearchResult {
        // Only genuine JSON numbers count as authoritative figures.
        let number = |v: &Option<Value>| v.as_ref().and_then(Value::as_f64).filter(|x| x.is_finite());
        SearchResult {
            summary: self.summary,
            links: self.links,
            error: self.error.filter(|e| !e.trim().is_empty()),
            remote: RemoteCost {
                tokens_in: self.tokens_in.as_ref().and_then(Value::as_u64),
                cost_usd: number(&self.estimated_cost_usd),
                cost_brl: number(&self.estimated_cost_brl),
            },
        }
    }
}

pub(crate) fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

pub(crate) fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|x| *x >= 0.0).map(|x| x as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(normalize_amount),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn non_blank_text(value: &Value) -> Option<String> {
    let text = value_to_text(value);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
