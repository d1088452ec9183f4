mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{groups, FakeBackend};
use pretty_assertions::assert_eq;
use watcher_core::DiagnosticsOutcome;
use watcher_engine::{
    EngineCommand, EngineEvent, EngineHandle, FailureKind, JobError, JobKind,
};

fn wait_for<F>(engine: &EngineHandle, mut done: F) -> Vec<EngineEvent>
where
    F: FnMut(&EngineEvent) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = engine
            .recv_timeout(Duration::from_millis(50))
            .expect("engine thread alive")
        {
            let finished = done(&event);
            events.push(event);
            if finished {
                return events;
            }
        }
    }
    panic!("timed out; got {events:?}");
}

#[test]
fn collection_streams_progress_then_summary() {
    let backend = Arc::new(FakeBackend::default());
    let engine = EngineHandle::with_backend(backend.clone(), None);

    engine.send(EngineCommand::StartCollection {
        groups: groups(&["gov", "corp"]),
        min_days: 30,
    });
    let events = wait_for(&engine, |e| matches!(e, EngineEvent::CollectionFinished(_)));

    assert_eq!(events.len(), 3);
    assert!(matches!(
        &events[1],
        EngineEvent::CollectionProgress { index: 1, total: 2, group } if group == "corp"
    ));
    match &events[2] {
        EngineEvent::CollectionFinished(Ok(summary)) => {
            assert!(!summary.cancelled);
            assert_eq!(summary.total_new_items, 7);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(backend.calls(), vec!["collect:gov:30", "collect:corp:30"]);
}

#[test]
fn second_start_while_running_is_rejected_and_cancel_still_reaches_the_first() {
    let backend = Arc::new(FakeBackend {
        collect_delay: Some(Duration::from_millis(150)),
        ..FakeBackend::default()
    });
    let engine = EngineHandle::with_backend(backend.clone(), None);

    engine.send(EngineCommand::StartCollection {
        groups: groups(&["gov", "funda", "corp"]),
        min_days: 21,
    });
    engine.send(EngineCommand::StartCollection {
        groups: groups(&["latam"]),
        min_days: 21,
    });
    engine.send(EngineCommand::CancelCollection);

    let first = wait_for(&engine, |e| matches!(e, EngineEvent::CollectionFinished(_)));
    assert_eq!(
        first.last(),
        Some(&EngineEvent::CollectionFinished(Err(JobError::AlreadyRunning(
            JobKind::Collection
        ))))
    );

    let rest = wait_for(&engine, |e| matches!(e, EngineEvent::CollectionFinished(_)));
    match rest.last() {
        Some(EngineEvent::CollectionFinished(Ok(summary))) => {
            assert!(summary.cancelled);
            assert_eq!(summary.progress.completed_steps, 1);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(backend.calls(), vec!["collect:gov:21"]);
}

#[test]
fn empty_collection_is_refused() {
    let engine = EngineHandle::with_backend(Arc::new(FakeBackend::default()), None);
    engine.send(EngineCommand::StartCollection {
        groups: Vec::new(),
        min_days: 21,
    });
    let events = wait_for(&engine, |e| matches!(e, EngineEvent::CollectionFinished(_)));
    assert_eq!(
        events,
        vec![EngineEvent::CollectionFinished(Err(JobError::NoGroupsAvailable))]
    );
}

#[test]
fn diagnostics_abort_yields_cancelled() {
    let backend = Arc::new(FakeBackend {
        diagnostics_hang: true,
        ..FakeBackend::default()
    });
    let engine = EngineHandle::with_backend(backend, None);

    engine.send(EngineCommand::StartDiagnostics {
        patterns: Default::default(),
    });
    std::thread::sleep(Duration::from_millis(50));
    engine.send(EngineCommand::AbortDiagnostics);

    let events = wait_for(&engine, |e| matches!(e, EngineEvent::DiagnosticsFinished(_)));
    assert_eq!(
        events.last(),
        Some(&EngineEvent::DiagnosticsFinished(Ok(DiagnosticsOutcome::Cancelled)))
    );
}

#[test]
fn one_shot_requests_answer_with_their_own_event() {
    let engine = EngineHandle::with_backend(Arc::new(FakeBackend::default()), None);

    engine.send(EngineCommand::FetchConfig);
    let config = wait_for(&engine, |e| matches!(e, EngineEvent::ConfigLoaded(_)));
    match config.last() {
        Some(EngineEvent::ConfigLoaded(Ok(config))) => assert_eq!(config.min_days, Some(14)),
        other => panic!("unexpected {other:?}"),
    }

    engine.send(EngineCommand::LoadItems {
        group: "gov".to_string(),
        status: None,
    });
    let items = wait_for(&engine, |e| matches!(e, EngineEvent::ItemsLoaded { .. }));
    match items.last() {
        Some(EngineEvent::ItemsLoaded { group, result: Ok(records) }) => {
            assert_eq!(group, "gov");
            assert_eq!(records.len(), 1);
        }
        other => panic!("unexpected {other:?}"),
    }

    engine.send(EngineCommand::CountLinkTokens {
        url: "https://example.org".to_string(),
    });
    let tokens = wait_for(&engine, |e| matches!(e, EngineEvent::LinkTokensCounted(_)));
    assert_eq!(tokens.last(), Some(&EngineEvent::LinkTokensCounted(Ok(321))));
}

#[test]
fn rate_request_without_rate_service_reports_an_error() {
    let engine = EngineHandle::with_backend(Arc::new(FakeBackend::default()), None);
    engine.send(EngineCommand::FetchExchangeRate);
    let events = wait_for(&engine, |e| matches!(e, EngineEvent::ExchangeRateFetched(_)));
    match events.last() {
        Some(EngineEvent::ExchangeRateFetched(Err(err))) => {
            assert_eq!(err.kind, FailureKind::InvalidInput)
        }
        other => panic!("unexpected {other:?}"),
    }
}
