use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use watcher_core::{DiagnosticsPatterns, SearchRequest};
use watcher_logging::{watch_debug, watch_info, watch_warn};

use crate::backend::{Backend, BackendSettings, ReqwestBackend};
use crate::cancel::{AbortSignal, CancelToken};
use crate::collect::GroupCollectionJob;
use crate::diagnostics::DiagnosticsJob;
use crate::rates::{RateFetcher, DEFAULT_RATE_URL};
use crate::sink::{ChannelProgressSink, ProgressSink};
use crate::types::{BackendError, EngineEvent, EngineStopped, FailureKind, JobError, JobKind};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    StartCollection { groups: Vec<String>, min_days: u32 },
    CancelCollection,
    StartDiagnostics { patterns: DiagnosticsPatterns },
    AbortDiagnostics,
    LoadItems { group: String, status: Option<String> },
    FetchConfig,
    FetchExchangeRate,
    CountLinkTokens { url: String },
    Search(SearchRequest),
    /// Forward Ctrl-C presses as [`EngineEvent::Interrupted`] instead of terminating.
    WatchInterrupts,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub backend: BackendSettings,
    pub rate_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            rate_url: DEFAULT_RATE_URL.to_string(),
        }
    }
}

/// Owns the IO thread. Commands go in, [`EngineEvent`]s come out.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, BackendError> {
        let connect_timeout = config.backend.connect_timeout;
        let backend = ReqwestBackend::new(config.backend)?;
        let rates = RateFetcher::new(&config.rate_url, connect_timeout)?;
        Ok(Self::with_backend(Arc::new(backend), Some(rates)))
    }

    /// Starts the IO thread around any [`Backend`]. Without `rates`, rate
    /// requests answer with an error.
    pub fn with_backend(backend: Arc<dyn Backend>, rates: Option<RateFetcher>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = Runtime::new().expect("tokio runtime");
            let mut worker = Worker::new(backend, rates.map(Arc::new), event_tx);
            while let Ok(command) = cmd_rx.recv() {
                worker.handle(&runtime, command);
            }
            watch_debug!("Engine command channel closed; stopping IO thread");
        });

        Self { cmd_tx, event_rx }
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event. `Ok(None)` means nothing
    /// arrived in time.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }
}

/// A spawned run together with the handle used to stop it.
struct ActiveRun<C> {
    control: C,
    task: JoinHandle<()>,
}

impl<C> ActiveRun<C> {
    fn is_live(&self) -> bool {
        !self.task.is_finished()
    }
}

struct Worker {
    backend: Arc<dyn Backend>,
    rates: Option<Arc<RateFetcher>>,
    collection: Arc<GroupCollectionJob>,
    diagnostics: Arc<DiagnosticsJob>,
    active_collection: Option<ActiveRun<CancelToken>>,
    active_diagnostics: Option<ActiveRun<AbortSignal>>,
    watching_interrupts: bool,
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Worker {
    fn new(
        backend: Arc<dyn Backend>,
        rates: Option<Arc<RateFetcher>>,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            collection: Arc::new(GroupCollectionJob::new(Arc::clone(&backend))),
            diagnostics: Arc::new(DiagnosticsJob::new(Arc::clone(&backend))),
            backend,
            rates,
            active_collection: None,
            active_diagnostics: None,
            watching_interrupts: false,
            event_tx,
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.event_tx.send(event);
    }

    fn handle(&mut self, runtime: &Runtime, command: EngineCommand) {
        match command {
            EngineCommand::StartCollection { groups, min_days } => {
                if self.active_collection.as_ref().is_some_and(ActiveRun::is_live) {
                    watch_warn!("Collection requested while one is running; ignored");
                    self.emit(EngineEvent::CollectionFinished(Err(JobError::AlreadyRunning(
                        JobKind::Collection,
                    ))));
                    return;
                }
                let cancel = CancelToken::new();
                let job = Arc::clone(&self.collection);
                let token = cancel.clone();
                let sink = ChannelProgressSink::new(self.event_tx.clone());
                let task = runtime.spawn(async move {
                    let result = job.run(&groups, min_days, &token, &sink).await;
                    sink.emit(EngineEvent::CollectionFinished(result));
                });
                self.active_collection = Some(ActiveRun {
                    control: cancel,
                    task,
                });
            }
            EngineCommand::CancelCollection => match &self.active_collection {
                Some(run) if run.is_live() => {
                    watch_info!("Collection cancel requested");
                    run.control.request_cancel();
                }
                _ => watch_debug!("Cancel requested with no collection running"),
            },
            EngineCommand::StartDiagnostics { patterns } => {
                if self.active_diagnostics.as_ref().is_some_and(ActiveRun::is_live) {
                    watch_warn!("Diagnostics requested while a run is active; ignored");
                    self.emit(EngineEvent::DiagnosticsFinished(Err(JobError::AlreadyRunning(
                        JobKind::Diagnostics,
                    ))));
                    return;
                }
                let signal = AbortSignal::new();
                let job = Arc::clone(&self.diagnostics);
                let abort = signal.clone();
                let event_tx = self.event_tx.clone();
                let task = runtime.spawn(async move {
                    let result = job.run(&patterns, &abort).await;
                    let _ = event_tx.send(EngineEvent::DiagnosticsFinished(result));
                });
                self.active_diagnostics = Some(ActiveRun {
                    control: signal,
                    task,
                });
            }
            EngineCommand::AbortDiagnostics => match &self.active_diagnostics {
                Some(run) if run.is_live() => {
                    watch_info!("Diagnostics abort requested");
                    run.control.abort();
                }
                _ => watch_debug!("Abort requested with no diagnostics running"),
            },
            EngineCommand::LoadItems { group, status } => {
                let backend = Arc::clone(&self.backend);
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let result = backend.load_items(&group, status.as_deref()).await;
                    let _ = event_tx.send(EngineEvent::ItemsLoaded { group, result });
                });
            }
            EngineCommand::FetchConfig => {
                let backend = Arc::clone(&self.backend);
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let result = backend.fetch_config().await;
                    let _ = event_tx.send(EngineEvent::ConfigLoaded(result));
                });
            }
            EngineCommand::FetchExchangeRate => {
                let Some(rates) = self.rates.clone() else {
                    self.emit(EngineEvent::ExchangeRateFetched(Err(BackendError::new(
                        FailureKind::InvalidInput,
                        "no rate service configured",
                    ))));
                    return;
                };
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let result = rates.fetch_usd_brl().await;
                    let _ = event_tx.send(EngineEvent::ExchangeRateFetched(result));
                });
            }
            EngineCommand::CountLinkTokens { url } => {
                let backend = Arc::clone(&self.backend);
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let result = backend.count_link_tokens(&url).await;
                    let _ = event_tx.send(EngineEvent::LinkTokensCounted(result));
                });
            }
            EngineCommand::Search(request) => {
                let backend = Arc::clone(&self.backend);
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    let result = backend.search(&request).await;
                    let _ = event_tx.send(EngineEvent::SearchFinished(result));
                });
            }
            EngineCommand::WatchInterrupts => {
                if self.watching_interrupts {
                    return;
                }
                self.watching_interrupts = true;
                let event_tx = self.event_tx.clone();
                runtime.spawn(async move {
                    while tokio::signal::ctrl_c().await.is_ok() {
                        watch_info!("Interrupt received");
                        if event_tx.send(EngineEvent::Interrupted).is_err() {
                            break;
                        }
                    }
                });
            }
        }
    }
}
