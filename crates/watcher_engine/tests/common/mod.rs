#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use watcher_core::{
    CollectCounts, DiagnosticsPatterns, DiagnosticsReport, Record, SearchRequest, SearchResult,
    ServiceConfig,
};
use watcher_engine::{
    race_abort, Abortable, AbortSignal, Backend, BackendError, CancelToken, EngineEvent,
    FailureKind, ProgressSink,
};

/// In-memory backend recording every call it receives.
#[derive(Default)]
pub struct FakeBackend {
    pub calls: Mutex<Vec<String>>,
    pub failing_groups: HashSet<String>,
    /// Cancel this token while collecting the named group.
    pub cancel_during: Mutex<Option<(String, CancelToken)>>,
    pub collect_delay: Option<Duration>,
    pub diagnostics: Mutex<Option<Result<DiagnosticsReport, BackendError>>>,
    /// Diagnostics never answers on its own.
    pub diagnostics_hang: bool,
}

impl FakeBackend {
    pub fn failing(groups: &[&str]) -> Self {
        Self {
            failing_groups: groups.iter().map(|g| g.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn cancel_while_collecting(&self, group: &str, token: &CancelToken) {
        *self.cancel_during.lock().unwrap() = Some((group.to_string(), token.clone()));
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn fetch_config(&self) -> Result<ServiceConfig, BackendError> {
        self.calls.lock().unwrap().push("config".to_string());
        Ok(ServiceConfig {
            available_groups: vec!["gov".to_string(), "funda".to_string()],
            min_days: Some(14),
            usd_brl: Some(5.0),
            status_choices: Vec::new(),
        })
    }

    async fn collect(&self, group: &str, min_days: u32) -> Result<CollectCounts, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("collect:{group}:{min_days}"));
        if let Some(delay) = self.collect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((target, token)) = self.cancel_during.lock().unwrap().as_ref() {
            if target == group {
                token.request_cancel();
            }
        }
        if self.failing_groups.contains(group) {
            return Err(BackendError {
                kind: FailureKind::HttpStatus(500),
                message: format!("{group} exploded"),
            });
        }
        Ok(CollectCounts {
            fixed_links: 1,
            new_items: group.len() as u64,
        })
    }

    async fn run_diagnostics(
        &self,
        _patterns: &DiagnosticsPatterns,
        signal: &AbortSignal,
    ) -> Abortable<Result<DiagnosticsReport, BackendError>> {
        self.calls.lock().unwrap().push("diagnostics".to_string());
        if self.diagnostics_hang {
            return race_abort(signal, std::future::pending::<Result<DiagnosticsReport, BackendError>>()).await;
        }
        let answer = self
            .diagnostics
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(DiagnosticsReport::default()));
        Abortable::Completed(answer)
    }

    async fn load_items(
        &self,
        group: &str,
        _status: Option<&str>,
    ) -> Result<Vec<Record>, BackendError> {
        self.calls.lock().unwrap().push(format!("items:{group}"));
        Ok(vec![Record::new("u1", group).with_amount(Some(10.0))])
    }

    async fn count_link_tokens(&self, url: &str) -> Result<u64, BackendError> {
        self.calls.lock().unwrap().push(format!("tokens:{url}"));
        Ok(321)
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, BackendError> {
        self.calls.lock().unwrap().push(format!("search:{}", request.model));
        Ok(SearchResult {
            summary: Some("ok".to_string()),
            ..SearchResult::default()
        })
    }
}

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn groups(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
