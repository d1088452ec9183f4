//! Data model of a sequential run: its plan, progress and per-step outcomes.

use serde::Serialize;

/// Ordered steps of one run. Fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan<S> {
    steps: Vec<S>,
}

impl<S> RunPlan<S> {
    pub fn new(steps: Vec<S>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl RunPlan<String> {
    /// One step per group: trimmed, blank entries dropped, first occurrence wins.
    ///
    /// Returns `None` when no group remains, so an empty plan is never run.
    pub fn for_groups<I, G>(groups: I) -> Option<Self>
    where
        I: IntoIterator<Item = G>,
        G: AsRef<str>,
    {
        let mut steps: Vec<String> = Vec::new();
        for group in groups {
            let group = group.as_ref().trim();
            if group.is_empty() || steps.iter().any(|g| g == group) {
                continue;
            }
            steps.push(group.to_string());
        }
        if steps.is_empty() {
            None
        } else {
            Some(Self { steps })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunProgress {
    pub total_steps: usize,
    pub completed_steps: usize,
    pub cancel_requested: bool,
}

impl RunProgress {
    pub fn start(total_steps: usize) -> Self {
        Self {
            total_steps,
            completed_steps: 0,
            cancel_requested: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed_steps >= self.total_steps
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome<M> {
    Success { metrics: M },
    Failure { message: String },
}

impl<M> StepOutcome<M> {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord<S, M> {
    pub step: S,
    pub outcome: StepOutcome<M>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CancelledBeforeCompletion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport<S, M> {
    pub outcomes: Vec<StepRecord<S, M>>,
    pub progress: RunProgress,
    pub status: RunStatus,
}

impl<S, M> RunReport<S, M> {
    pub fn completed_all(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn failures(&self) -> impl Iterator<Item = (&S, &str)> {
        self.outcomes.iter().filter_map(|record| match &record.outcome {
            StepOutcome::Failure { message } => Some((&record.step, message.as_str())),
            StepOutcome::Success { .. } => None,
        })
    }
}
