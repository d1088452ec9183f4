use std::time::Duration;

use watcher_core::{DiagnosticsOutcome, Effect, Msg};
use watcher_engine::{
    BackendError, EngineCommand, EngineEvent, EngineHandle, EngineStopped, JobError,
};
use watcher_logging::{watch_info, watch_warn};

/// Runs core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            let command = match effect {
                Effect::StartCollection { groups, min_days } => {
                    watch_info!(
                        "StartCollection groups={} min_days={}",
                        groups.join(","),
                        min_days
                    );
                    EngineCommand::StartCollection { groups, min_days }
                }
                Effect::CancelCollection => EngineCommand::CancelCollection,
                Effect::StartDiagnostics { patterns } => {
                    EngineCommand::StartDiagnostics { patterns }
                }
                Effect::AbortDiagnostics => EngineCommand::AbortDiagnostics,
            };
            self.engine.send(command);
        }
    }

    /// Sends a request that has no counterpart in the state machine.
    pub fn request(&self, command: EngineCommand) {
        self.engine.send(command);
    }

    pub fn next_event(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        self.engine.recv_timeout(timeout)
    }
}

/// Maps an engine event onto the message the state machine understands.
///
/// A failed one-shot request has no message; its error is handed back to the caller.
pub fn event_to_msg(event: EngineEvent) -> Result<Msg, BackendError> {
    let msg = match event {
        EngineEvent::CollectionProgress {
            index,
            total,
            group,
        } => Msg::CollectionStepFinished {
            index,
            total,
            group,
        },
        EngineEvent::CollectionFinished(Ok(summary)) => Msg::CollectionFinished(summary),
        EngineEvent::CollectionFinished(Err(err)) => {
            watch_warn!("Collection refused: {}", err);
            Msg::CollectionRejected(rejection_notice(&err))
        }
        EngineEvent::DiagnosticsFinished(Ok(outcome)) => Msg::DiagnosticsFinished(outcome),
        EngineEvent::DiagnosticsFinished(Err(err)) => {
            Msg::DiagnosticsFinished(DiagnosticsOutcome::Failed {
                message: err.to_string(),
            })
        }
        EngineEvent::ItemsLoaded { group, result } => Msg::ItemsLoaded {
            group,
            records: result?,
        },
        EngineEvent::ConfigLoaded(result) => Msg::ConfigLoaded(result?),
        EngineEvent::ExchangeRateFetched(result) => {
            if let Err(err) = &result {
                watch_warn!("Exchange rate unavailable, keeping the current one: {}", err);
            }
            Msg::ExchangeRateFetched(result.ok())
        }
        EngineEvent::LinkTokensCounted(result) => Msg::LinkTokensCounted(result?),
        EngineEvent::SearchFinished(result) => Msg::SearchFinished(result?),
        EngineEvent::Interrupted => Msg::Interrupted,
    };
    Ok(msg)
}

fn rejection_notice(err: &JobError) -> String {
    match err {
        JobError::NoGroupsAvailable => watcher_core::NO_GROUPS_NOTICE.to_string(),
        JobError::AlreadyRunning(_) => format!("Not started: {err}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watcher_engine::{FailureKind, JobKind};

    #[test]
    fn failed_rate_lookup_keeps_previous_rate() {
        let msg = event_to_msg(EngineEvent::ExchangeRateFetched(Err(BackendError {
            kind: FailureKind::Timeout,
            message: "slow".to_string(),
        })));
        assert_eq!(msg, Ok(Msg::ExchangeRateFetched(None)));
    }

    #[test]
    fn refused_collection_becomes_a_notice() {
        assert_eq!(
            event_to_msg(EngineEvent::CollectionFinished(Err(JobError::NoGroupsAvailable))),
            Ok(Msg::CollectionRejected(
                "No groups available for collection.".to_string()
            ))
        );
        assert_eq!(
            event_to_msg(EngineEvent::CollectionFinished(Err(JobError::AlreadyRunning(
                JobKind::Collection
            )))),
            Ok(Msg::CollectionRejected(
                "Not started: a collection run is already in progress.".to_string()
            ))
        );
    }

    #[test]
    fn failed_item_load_returns_the_error() {
        let event = EngineEvent::ItemsLoaded {
            group: "gov".to_string(),
            result: Err(BackendError {
                kind: FailureKind::HttpStatus(500),
                message: "boom".to_string(),
            }),
        };
        assert_eq!(
            event_to_msg(event).unwrap_err().kind,
            FailureKind::HttpStatus(500)
        );
    }
}
