use crate::filter::{FilterInputError, FilterLimits, RecordBoard};
use crate::msg::QuoteInputs;
use crate::pricing::{estimate, ExchangeRate, PricingQuote};
use crate::record::Record;
use crate::run::{RunPlan, RunProgress};
use crate::service::{SearchResult, ServiceConfig};
use crate::summary::{CollectionSummary, DiagnosticsOutcome};
use crate::view_model::{AppViewModel, RecordRowView};

pub const DEFAULT_MIN_DAYS: u32 = 21;
pub const NO_GROUPS_NOTICE: &str = "No groups available for collection.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CollectionState {
    #[default]
    Idle,
    Running {
        progress: RunProgress,
        last_group: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticsState {
    #[default]
    Idle,
    Running {
        cancel_requested: bool,
    },
}

/// Everything the front end shows, owned by one context and changed only by [`crate::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    available_groups: Vec<String>,
    selected_groups: Vec<String>,
    min_days: u32,
    collection: CollectionState,
    last_collection: Option<CollectionSummary>,
    notice: Option<String>,
    diagnostics: DiagnosticsState,
    last_diagnostics: Option<DiagnosticsOutcome>,
    limits: FilterLimits,
    board: RecordBoard,
    filter_error: Option<String>,
    usd_brl: ExchangeRate,
    link_tokens: u64,
    quote_inputs: Option<QuoteInputs>,
    last_search: Option<SearchResult>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            available_groups: Vec::new(),
            selected_groups: Vec::new(),
            min_days: DEFAULT_MIN_DAYS,
            collection: CollectionState::Idle,
            last_collection: None,
            notice: None,
            diagnostics: DiagnosticsState::Idle,
            last_diagnostics: None,
            limits: FilterLimits::default(),
            board: RecordBoard::default(),
            filter_error: None,
            usd_brl: ExchangeRate::default(),
            link_tokens: 0,
            quote_inputs: None,
            last_search: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let collection_progress = match &self.collection {
            CollectionState::Running { progress, .. } => Some(*progress),
            CollectionState::Idle => None,
        };
        AppViewModel {
            min_days: self.min_days,
            collect_enabled: collection_progress.is_none(),
            collection_progress,
            collection_label: self.collection_label(),
            last_collection: self.last_collection.clone(),
            notice: self.notice.clone(),
            diagnostics_running: self.diagnostics_running(),
            diagnostics_label: self.diagnostics_label(),
            last_diagnostics: self.last_diagnostics.clone(),
            records: self.board.visible().map(RecordRowView::from).collect(),
            visibility: self.board.count(),
            limits: self.limits,
            filter_error: self.filter_error.clone(),
            usd_brl: self.usd_brl.value(),
            link_tokens: self.link_tokens,
            quote: self.current_quote(),
            search: self.last_search.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn min_days(&self) -> u32 {
        self.min_days
    }

    pub fn limits(&self) -> &FilterLimits {
        &self.limits
    }

    pub fn collection_running(&self) -> bool {
        matches!(self.collection, CollectionState::Running { .. })
    }

    pub fn diagnostics_running(&self) -> bool {
        matches!(self.diagnostics, DiagnosticsState::Running { .. })
    }

    /// True once a cancel or abort was requested and the job has not finished yet.
    pub fn cancel_pending(&self) -> bool {
        let collection = matches!(
            &self.collection,
            CollectionState::Running { progress, .. } if progress.cancel_requested
        );
        let diagnostics = matches!(
            self.diagnostics,
            DiagnosticsState::Running {
                cancel_requested: true
            }
        );
        collection || diagnostics
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn apply_config(&mut self, config: ServiceConfig) {
        self.available_groups = config.available_groups;
        if let Some(days) = config.min_days.filter(|d| *d > 0) {
            self.min_days = days;
        }
        self.usd_brl = self.usd_brl.updated(config.usd_brl);
        self.mark_dirty();
    }

    pub(crate) fn select_groups(&mut self, groups: Vec<String>) {
        self.selected_groups = groups;
        self.mark_dirty();
    }

    pub(crate) fn set_min_days(&mut self, days: u32) {
        if days == 0 || days == self.min_days {
            return;
        }
        self.min_days = days;
        self.mark_dirty();
    }

    /// Selected groups, or every available group when nothing is selected.
    pub(crate) fn collection_plan(&self) -> Option<RunPlan<String>> {
        if self.selected_groups.is_empty() {
            RunPlan::for_groups(&self.available_groups)
        } else {
            RunPlan::for_groups(&self.selected_groups)
        }
    }

    pub(crate) fn set_notice(&mut self, notice: &str) {
        self.notice = Some(notice.to_string());
        self.mark_dirty();
    }

    pub(crate) fn begin_collection(&mut self, total_steps: usize) {
        self.collection = CollectionState::Running {
            progress: RunProgress::start(total_steps),
            last_group: None,
        };
        self.notice = None;
        self.last_collection = None;
        self.mark_dirty();
    }

    /// Flags the running collection for cancellation. Returns false if there is nothing to cancel.
    pub(crate) fn request_collection_cancel(&mut self) -> bool {
        match &mut self.collection {
            CollectionState::Running { progress, .. } if !progress.cancel_requested => {
                progress.cancel_requested = true;
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn apply_collection_step(&mut self, index: usize, total: usize, group: String) {
        if let CollectionState::Running {
            progress,
            last_group,
        } = &mut self.collection
        {
            progress.total_steps = total;
            progress.completed_steps = (index + 1).min(total);
            *last_group = Some(group);
            self.dirty = true;
        }
    }

    pub(crate) fn finish_collection(&mut self, summary: CollectionSummary) {
        self.collection = CollectionState::Idle;
        self.last_collection = Some(summary);
        self.mark_dirty();
    }

    pub(crate) fn reject_collection(&mut self, reason: String) {
        self.collection = CollectionState::Idle;
        self.notice = Some(reason);
        self.mark_dirty();
    }

    pub(crate) fn begin_diagnostics(&mut self) {
        self.diagnostics = DiagnosticsState::Running {
            cancel_requested: false,
        };
        self.last_diagnostics = None;
        self.mark_dirty();
    }

    pub(crate) fn request_diagnostics_abort(&mut self) -> bool {
        match &mut self.diagnostics {
            DiagnosticsState::Running { cancel_requested } if !*cancel_requested => {
                *cancel_requested = true;
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn finish_diagnostics(&mut self, outcome: DiagnosticsOutcome) {
        self.diagnostics = DiagnosticsState::Idle;
        self.last_diagnostics = Some(outcome);
        self.mark_dirty();
    }

    pub(crate) fn load_records(&mut self, group: &str, records: Vec<Record>) {
        self.board.load_group(group, records, &self.limits);
        self.mark_dirty();
    }

    pub(crate) fn change_limits<F>(&mut self, change: F)
    where
        F: FnOnce(&mut FilterLimits) -> Result<(), FilterInputError>,
    {
        match change(&mut self.limits) {
            Ok(()) => {
                self.filter_error = None;
                self.board.apply(&self.limits);
            }
            Err(err) => self.filter_error = Some(err.to_string()),
        }
        self.mark_dirty();
    }

    pub(crate) fn update_rate(&mut self, fetched: Option<f64>) {
        self.usd_brl = self.usd_brl.updated(fetched);
        self.mark_dirty();
    }

    pub(crate) fn set_link_tokens(&mut self, tokens: u64) {
        self.link_tokens = tokens;
        self.mark_dirty();
    }

    pub(crate) fn set_quote_inputs(&mut self, inputs: QuoteInputs) {
        self.quote_inputs = Some(inputs);
        self.last_search = None;
        self.mark_dirty();
    }

    pub(crate) fn set_search_result(&mut self, result: SearchResult) {
        self.last_search = Some(result);
        self.mark_dirty();
    }

    fn current_quote(&self) -> Option<PricingQuote> {
        let inputs = self.quote_inputs.as_ref()?;
        let local = estimate(
            &inputs.prompt,
            self.link_tokens,
            inputs.pricing,
            inputs.max_output_tokens,
            self.usd_brl.value(),
        );
        Some(match &self.last_search {
            Some(result) => local.superseded_by(&result.remote),
            None => local,
        })
    }

    fn collection_label(&self) -> Option<String> {
        let CollectionState::Running {
            progress,
            last_group,
        } = &self.collection
        else {
            return None;
        };
        if progress.cancel_requested {
            return Some("Cancelling... waiting for the current group to finish.".to_string());
        }
        Some(match last_group {
            Some(group) => format!(
                "Collected group {} ({} of {})",
                group, progress.completed_steps, progress.total_steps
            ),
            None => "Starting collection...".to_string(),
        })
    }

    fn diagnostics_label(&self) -> Option<String> {
        match self.diagnostics {
            DiagnosticsState::Running {
                cancel_requested: false,
            } => Some("Running provider diagnostics...".to_string()),
            DiagnosticsState::Running {
                cancel_requested: true,
            } => Some("Cancelling diagnostics...".to_string()),
            DiagnosticsState::Idle => None,
        }
    }
}
