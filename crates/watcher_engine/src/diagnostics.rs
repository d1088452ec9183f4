use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use watcher_core::{DiagnosticsOutcome, DiagnosticsPatterns};

use crate::backend::Backend;
use crate::cancel::AbortSignal;
use crate::runner::{run_abortable, RunGuard, SingleShotOutcome};
use crate::types::{JobError, JobKind};

/// Runs the provider diagnostics call, which the user may abort mid-flight.
pub struct DiagnosticsJob {
    backend: Arc<dyn Backend>,
    running: AtomicBool,
}

impl DiagnosticsJob {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(std::sync::atomic::Ordering::Acquire)
    }

    pub async fn run(
        &self,
        patterns: &DiagnosticsPatterns,
        signal: &AbortSignal,
    ) -> Result<DiagnosticsOutcome, JobError> {
        let _guard = RunGuard::acquire(&self.running, JobKind::Diagnostics)?;
        let backend = Arc::clone(&self.backend);
        let outcome = run_abortable(signal, |signal| async move {
            backend.run_diagnostics(patterns, &signal).await
        })
        .await;
        Ok(match outcome {
            SingleShotOutcome::Succeeded(report) => DiagnosticsOutcome::Completed { report },
            SingleShotOutcome::Failed(message) => DiagnosticsOutcome::Failed { message },
            SingleShotOutcome::Cancelled => DiagnosticsOutcome::Cancelled,
        })
    }
}
