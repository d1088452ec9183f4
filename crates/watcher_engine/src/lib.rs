//! Watcher engine: service calls, cancellable runs and effect execution.
mod backend;
mod cancel;
mod collect;
mod diagnostics;
mod engine;
mod rates;
mod runner;
mod sink;
mod types;
mod wire;

pub use backend::{Backend, BackendSettings, ReqwestBackend};
pub use cancel::{race_abort, AbortSignal, CancelToken};
pub use collect::GroupCollectionJob;
pub use diagnostics::DiagnosticsJob;
pub use engine::{EngineCommand, EngineConfig, EngineHandle};
pub use rates::{RateFetcher, DEFAULT_RATE_URL};
pub use runner::{run_abortable, run_sequential, SingleShotOutcome};
pub use sink::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use types::{
    Abortable, BackendError, EngineEvent, EngineStopped, FailureKind, JobError, JobKind,
};
