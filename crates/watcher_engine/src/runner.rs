//! Sequential, cooperatively cancellable step runner and its single-shot
//! abortable counterpart.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use watcher_core::{RunPlan, RunProgress, RunReport, RunStatus, StepOutcome, StepRecord};
use watcher_logging::{watch_info, watch_warn};

use crate::cancel::{AbortSignal, CancelToken};
use crate::types::{Abortable, JobError, JobKind};

/// Runs every step of `plan` in order, one at a time.
///
/// A failing step is recorded and the run moves on. `cancel` is consulted only
/// after a step has finished; if it is set and steps remain, the run stops and
/// is reported as [`RunStatus::CancelledBeforeCompletion`]. A cancel request
/// that arrives during the last step has no observable effect on the status.
///
/// `on_progress` receives `(index, total, step)` after each step, `index` being 0-based.
pub async fn run_sequential<S, M, E, F, Fut, P>(
    plan: &RunPlan<S>,
    cancel: &CancelToken,
    mut on_progress: P,
    mut execute: F,
) -> RunReport<S, M>
where
    S: Clone + Display,
    E: Display,
    F: FnMut(S) -> Fut,
    Fut: Future<Output = Result<M, E>>,
    P: FnMut(usize, usize, &S),
{
    let total = plan.len();
    let mut progress = RunProgress::start(total);
    let mut outcomes = Vec::with_capacity(total);
    let mut status = RunStatus::Completed;
    watch_info!("Run started with {} step(s)", total);

    for (index, step) in plan.steps().iter().enumerate() {
        let outcome = match execute(step.clone()).await {
            Ok(metrics) => {
                watch_info!("Step {}/{} ({}) succeeded", index + 1, total, step);
                StepOutcome::Success { metrics }
            }
            Err(err) => {
                let message = err.to_string();
                watch_warn!("Step {}/{} ({}) failed: {}", index + 1, total, step, message);
                StepOutcome::Failure { message }
            }
        };
        outcomes.push(StepRecord {
            step: step.clone(),
            outcome,
        });
        progress.completed_steps = index + 1;
        progress.cancel_requested = cancel.is_cancel_requested();
        on_progress(index, total, step);

        if progress.cancel_requested && index + 1 < total {
            watch_info!(
                "Cancellation observed after step {}/{}; skipping {} step(s)",
                index + 1,
                total,
                total - index - 1
            );
            status = RunStatus::CancelledBeforeCompletion;
            break;
        }
    }

    RunReport {
        outcomes,
        progress,
        status,
    }
}

/// Terminal state of a single abortable call.
#[derive(Debug, Clone, PartialEq)]
pub enum SingleShotOutcome<T> {
    Succeeded(T),
    Failed(String),
    Cancelled,
}

/// Runs one call that receives `signal` and must report whether it was aborted.
///
/// A signal that fired before the call started means no attempt is made.
pub async fn run_abortable<T, E, F, Fut>(signal: &AbortSignal, execute: F) -> SingleShotOutcome<T>
where
    E: Display,
    F: FnOnce(AbortSignal) -> Fut,
    Fut: Future<Output = Abortable<Result<T, E>>>,
{
    if signal.is_aborted() {
        watch_info!("Abort fired before the call started");
        return SingleShotOutcome::Cancelled;
    }
    match execute(signal.clone()).await {
        Abortable::Completed(Ok(value)) => SingleShotOutcome::Succeeded(value),
        Abortable::Completed(Err(err)) => {
            let message = err.to_string();
            watch_warn!("Single-shot call failed: {}", message);
            SingleShotOutcome::Failed(message)
        }
        Abortable::Aborted => {
            watch_info!("Single-shot call aborted by user");
            SingleShotOutcome::Cancelled
        }
    }
}

/// Marks a job as running for as long as the guard lives.
pub(crate) struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool, kind: JobKind) -> Result<Self, JobError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| JobError::AlreadyRunning(kind))?;
        Ok(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
