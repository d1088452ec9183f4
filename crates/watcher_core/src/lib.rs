//! Watcher core: pure state machine, filter, cost estimation and run data model.
mod amount;
mod effect;
mod filter;
mod msg;
mod pricing;
mod prompt;
mod record;
mod run;
mod service;
mod state;
mod summary;
mod update;
mod view_model;

pub use amount::{normalize_amount, parse_amount};
pub use effect::Effect;
pub use filter::{
    is_visible, FilterInputError, FilterLimits, LoadedRecord, RecordBoard, VisibilityCount,
};
pub use msg::{Msg, QuoteInputs};
pub use pricing::{
    approx_tokens, estimate, ExchangeRate, ModelPricing, PriceTable, PricingQuote, RemoteCost,
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_USD_BRL, FALLBACK_PRICE_PER_MILLION,
};
pub use prompt::{PromptInputs, PromptTemplate};
pub use record::{parse_deadline, Record};
pub use run::{RunPlan, RunProgress, RunReport, RunStatus, StepOutcome, StepRecord};
pub use service::{
    CollectCounts, DiagnosticsPatterns, DiagnosticsReport, DiagnosticsRow, SearchRequest,
    SearchResult, ServiceConfig,
};
pub use state::{AppState, CollectionState, DiagnosticsState, DEFAULT_MIN_DAYS, NO_GROUPS_NOTICE};
pub use summary::{CollectionSummary, DiagnosticsOutcome};
pub use update::update;
pub use view_model::{AppViewModel, RecordRowView};
