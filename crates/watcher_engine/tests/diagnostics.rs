mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::FakeBackend;
use pretty_assertions::assert_eq;
use watcher_core::{DiagnosticsOutcome, DiagnosticsPatterns, DiagnosticsReport, DiagnosticsRow};
use watcher_engine::{AbortSignal, BackendError, DiagnosticsJob, FailureKind, JobError, JobKind};

fn one_row_report() -> DiagnosticsReport {
    DiagnosticsReport {
        rows: vec![DiagnosticsRow {
            group: "gov".to_string(),
            source: "FINEP".to_string(),
            item_count: 4,
            elapsed_seconds: 1.5,
            error: None,
            hint: None,
        }],
        logs: vec![
            vec!["when".to_string(), "what".to_string()],
            vec!["10:00".to_string(), "fetched".to_string()],
        ],
    }
}

#[tokio::test]
async fn completed_run_carries_the_report() {
    let backend = Arc::new(FakeBackend {
        diagnostics: Mutex::new(Some(Ok(one_row_report()))),
        ..FakeBackend::default()
    });
    let job = DiagnosticsJob::new(backend);

    let outcome = job
        .run(&DiagnosticsPatterns::default(), &AbortSignal::new())
        .await
        .unwrap();

    assert_eq!(outcome, DiagnosticsOutcome::Completed { report: one_row_report() });
    assert_eq!(outcome.report().unwrap().log_lines(), vec!["10:00 | fetched"]);
}

#[tokio::test]
async fn service_failure_is_distinct_from_cancellation() {
    let backend = Arc::new(FakeBackend {
        diagnostics: Mutex::new(Some(Err(BackendError {
            kind: FailureKind::Timeout,
            message: "slow".to_string(),
        }))),
        ..FakeBackend::default()
    });
    let job = DiagnosticsJob::new(backend);

    let outcome = job
        .run(&DiagnosticsPatterns::default(), &AbortSignal::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DiagnosticsOutcome::Failed {
            message: "timeout: slow".to_string()
        }
    );
}

#[tokio::test]
async fn abort_mid_flight_reports_cancelled() {
    let backend = Arc::new(FakeBackend {
        diagnostics_hang: true,
        ..FakeBackend::default()
    });
    let job = DiagnosticsJob::new(backend.clone());
    let signal = AbortSignal::new();
    let trigger = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.abort();
    });

    let outcome = job
        .run(&DiagnosticsPatterns::default(), &signal)
        .await
        .unwrap();

    assert_eq!(outcome, DiagnosticsOutcome::Cancelled);
    assert_eq!(backend.calls(), vec!["diagnostics"]);
    assert!(!job.is_running());
}

#[tokio::test]
async fn abort_before_start_skips_the_call() {
    let backend = Arc::new(FakeBackend::default());
    let job = DiagnosticsJob::new(backend.clone());
    let signal = AbortSignal::new();
    signal.abort();

    let outcome = job.run(&DiagnosticsPatterns::default(), &signal).await.unwrap();

    assert_eq!(outcome, DiagnosticsOutcome::Cancelled);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn concurrent_diagnostics_run_is_rejected() {
    let backend = Arc::new(FakeBackend {
        diagnostics_hang: true,
        ..FakeBackend::default()
    });
    let job = Arc::new(DiagnosticsJob::new(backend));
    let signal = AbortSignal::new();

    let first = {
        let job = Arc::clone(&job);
        let signal = signal.clone();
        tokio::spawn(async move { job.run(&DiagnosticsPatterns::default(), &signal).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = job
        .run(&DiagnosticsPatterns::default(), &AbortSignal::new())
        .await;
    assert_eq!(second, Err(JobError::AlreadyRunning(JobKind::Diagnostics)));

    signal.abort();
    assert_eq!(first.await.unwrap(), Ok(DiagnosticsOutcome::Cancelled));
}
