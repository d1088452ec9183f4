use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use watcher_core::{CollectionSummary, RunPlan};
use watcher_logging::watch_info;

use crate::backend::Backend;
use crate::cancel::CancelToken;
use crate::runner::{run_sequential, RunGuard};
use crate::sink::ProgressSink;
use crate::types::{EngineEvent, JobError, JobKind};

/// Collects groups one after another through a [`Backend`].
///
/// At most one run is active per job; a second call while one is running is
/// rejected without touching the first.
pub struct GroupCollectionJob {
    backend: Arc<dyn Backend>,
    running: AtomicBool,
}

impl GroupCollectionJob {
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
        groups: &[String],
        min_days: u32,
        cancel: &CancelToken,
        sink: &dyn ProgressSink,
    ) -> Result<CollectionSummary, JobError> {
        let plan = RunPlan::for_groups(groups).ok_or(JobError::NoGroupsAvailable)?;
        let _guard = RunGuard::acquire(&self.running, JobKind::Collection)?;
        watch_info!(
            "Collecting {} group(s) with min_days={}",
            plan.len(),
            min_days
        );

        let backend = Arc::clone(&self.backend);
        let report = run_sequential(
            &plan,
            cancel,
            |index, total, group: &String| {
                sink.emit(EngineEvent::CollectionProgress {
                    index,
                    total,
                    group: group.clone(),
                });
            },
            |group: String| {
                let backend = Arc::clone(&backend);
                async move { backend.collect(&group, min_days).await }
            },
        )
        .await;

        let summary = CollectionSummary::from_report(&report);
        watch_info!("{}", summary.headline());
        Ok(summary)
    }
}
