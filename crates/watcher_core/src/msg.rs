use crate::pricing::ModelPricing;
use crate::record::Record;
use crate::service::{DiagnosticsPatterns, SearchResult, ServiceConfig};
use crate::summary::{CollectionSummary, DiagnosticsOutcome};

/// Inputs of a pre-flight cost estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteInputs {
    pub prompt: String,
    pub pricing: ModelPricing,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Service configuration arrived (groups, defaults).
    ConfigLoaded(ServiceConfig),
    /// User changed the group selection. Empty means "all available groups".
    GroupsSelected(Vec<String>),
    /// User picked a minimum-days preset.
    MinDaysPresetChosen(u32),
    /// User clicked Collect.
    CollectClicked,
    /// User clicked Cancel on the collection progress.
    CancelCollectClicked,
    /// Engine finished one collection step (0-based index).
    CollectionStepFinished {
        index: usize,
        total: usize,
        group: String,
    },
    /// Engine finished the collection run, fully or through cancellation.
    CollectionFinished(CollectionSummary),
    /// Engine refused to start the collection.
    CollectionRejected(String),
    /// User started provider diagnostics.
    DiagnosticsClicked(DiagnosticsPatterns),
    /// User clicked Cancel on the diagnostics progress.
    CancelDiagnosticsClicked,
    /// Engine reported the terminal state of diagnostics.
    DiagnosticsFinished(DiagnosticsOutcome),
    /// Records of one group were loaded.
    ItemsLoaded { group: String, records: Vec<Record> },
    /// User entered a deadline limit (`YYYY-MM-DD`).
    DeadlineFilterEntered(String),
    /// User entered an amount ceiling.
    AmountFilterEntered(String),
    DeadlineFilterCleared,
    AmountFilterCleared,
    /// Live exchange rate lookup finished; `None` when it failed.
    ExchangeRateFetched(Option<f64>),
    /// Token count of the call link content.
    LinkTokensCounted(u64),
    /// Prompt or pricing inputs changed.
    PromptPrepared(QuoteInputs),
    /// AI search returned.
    SearchFinished(SearchResult),
    /// Interrupt from the terminal: cancels whatever job is in flight.
    Interrupted,
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
