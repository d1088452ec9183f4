use serde::Serialize;

use crate::run::{RunProgress, RunReport, StepOutcome};
use crate::service::{CollectCounts, DiagnosticsReport};

/// What a collection run produced, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CollectionSummary {
    pub total_fixed_links: u64,
    pub total_new_items: u64,
    /// One line per attempted group, in run order.
    pub lines: Vec<String>,
    /// True when cancellation skipped at least one group.
    pub cancelled: bool,
    pub progress: RunProgress,
}

impl CollectionSummary {
    pub fn from_report(report: &RunReport<String, CollectCounts>) -> Self {
        let mut summary = CollectionSummary {
            cancelled: !report.completed_all(),
            progress: report.progress,
            ..CollectionSummary::default()
        };
        for record in &report.outcomes {
            let line = match &record.outcome {
                StepOutcome::Success { metrics } => {
                    summary.total_fixed_links += metrics.fixed_links;
                    summary.total_new_items += metrics.new_items;
                    format!(
                        "{}: fixed links {}, new items {}",
                        record.step, metrics.fixed_links, metrics.new_items
                    )
                }
                StepOutcome::Failure { message } => {
                    format!("{}: collection failed ({})", record.step, message)
                }
            };
            summary.lines.push(line);
        }
        summary
    }

    pub fn headline(&self) -> &'static str {
        if self.cancelled {
            "Collection cancelled before all groups completed."
        } else {
            "Collection finished."
        }
    }
}

/// Terminal state of a diagnostics run. Each variant renders differently.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticsOutcome {
    Completed { report: DiagnosticsReport },
    Failed { message: String },
    Cancelled,
}

impl DiagnosticsOutcome {
    pub fn report(&self) -> Option<&DiagnosticsReport> {
        match self {
            DiagnosticsOutcome::Completed { report } => Some(report),
            _ => None,
        }
    }
}
