use std::fmt;

use thiserror::Error;
use watcher_core::{
    CollectionSummary, DiagnosticsOutcome, Record, SearchResult, ServiceConfig,
};

/// Failure of one call to the collection service or the rate service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Request rejected locally before anything was sent.
    InvalidInput,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    /// The service answered but reported the operation as failed.
    Service,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidInput => write!(f, "invalid input"),
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::Service => write!(f, "service error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Collection,
    Diagnostics,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Collection => write!(f, "collection"),
            JobKind::Diagnostics => write!(f, "diagnostics"),
        }
    }
}

/// Reasons a job refuses to start. Nothing has run when these are returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("no groups available for collection")]
    NoGroupsAvailable,
    #[error("a {0} run is already in progress")]
    AlreadyRunning(JobKind),
}

/// The IO thread is gone; no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine thread stopped")]
pub struct EngineStopped;

/// Result of a call that can be aborted mid-flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abortable<T> {
    Completed(T),
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// One collection step finished (0-based `index`).
    CollectionProgress {
        index: usize,
        total: usize,
        group: String,
    },
    CollectionFinished(Result<CollectionSummary, JobError>),
    DiagnosticsFinished(Result<DiagnosticsOutcome, JobError>),
    ItemsLoaded {
        group: String,
        result: Result<Vec<Record>, BackendError>,
    },
    ConfigLoaded(Result<ServiceConfig, BackendError>),
    ExchangeRateFetched(Result<f64, BackendError>),
    LinkTokensCounted(Result<u64, BackendError>),
    SearchFinished(Result<SearchResult, BackendError>),
    /// Ctrl-C was pressed in the terminal.
    Interrupted,
}
