use std::fmt;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use watcher_core::{
    update, AppState, AppViewModel, DiagnosticsOutcome, DiagnosticsPatterns, Msg, PromptInputs,
    PromptTemplate, QuoteInputs, SearchRequest,
};
use watcher_engine::{BackendError, EngineCommand, EngineEvent, EngineHandle, EngineStopped};
use watcher_logging::{watch_debug, watch_info, watch_warn};

use super::effects::{event_to_msg, EffectRunner};
use super::settings::Settings;
use super::ui::render;
use crate::cli::{Command, PromptArgs};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Exit status after a second Ctrl-C, as a shell reports death by SIGINT.
const INTERRUPTED_EXIT: u8 = 130;

/// Reasons to stop waiting on the engine before the awaited event arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Ctrl-C arrived again while the first cancel was still pending.
    Interrupted,
    EngineStopped,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::Interrupted => f.write_str("interrupted twice"),
            Halt::EngineStopped => f.write_str("engine thread stopped unexpectedly"),
        }
    }
}

impl std::error::Error for Halt {}

impl From<EngineStopped> for Halt {
    fn from(_: EngineStopped) -> Self {
        Halt::EngineStopped
    }
}

/// Drives one command: messages go through [`update`], effects go to the
/// engine, and engine events come back as messages until the command is done.
pub struct App {
    state: AppState,
    runner: EffectRunner,
    settings: Settings,
    last_progress: Option<String>,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        let engine = EngineHandle::new(settings.engine_config())
            .context("failed to set up the service client")?;
        Ok(Self::with_engine(settings, engine))
    }

    pub fn with_engine(settings: Settings, engine: EngineHandle) -> Self {
        let mut app = Self {
            state: AppState::default(),
            runner: EffectRunner::new(engine),
            settings,
            last_progress: None,
        };
        if let Some(days) = app.settings.default_min_days {
            app.dispatch(Msg::MinDaysPresetChosen(days));
        }
        if let Some(rate) = app.settings.usd_brl {
            app.dispatch(Msg::ExchangeRateFetched(Some(rate)));
        }
        app
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    /// Runs `command` to completion. A second Ctrl-C ends it at once with status 130.
    pub fn run(&mut self, command: Command) -> Result<ExitCode> {
        match self.run_command(command) {
            Err(err) if err.downcast_ref::<Halt>() == Some(&Halt::Interrupted) => {
                watch_warn!("Second Ctrl-C received; stopping without waiting");
                eprintln!("Received second Ctrl-C, stopping immediately.");
                Ok(ExitCode::from(INTERRUPTED_EXIT))
            }
            other => other,
        }
    }

    fn run_command(&mut self, command: Command) -> Result<ExitCode> {
        match command {
            Command::Collect { groups, min_days } => self.collect(groups, min_days),
            Command::Diag {
                re_gov,
                re_funda,
                re_corp,
                re_latam,
            } => self.diagnostics(DiagnosticsPatterns {
                gov: re_gov,
                funda: re_funda,
                corp: re_corp,
                latam: re_latam,
            }),
            Command::Items {
                groups,
                status,
                deadline,
                max_amount,
            } => self.items(groups, status, deadline, max_amount),
            Command::Estimate(prompt) => {
                self.prepare_quote(&prompt)?;
                print_lines(render::quote_lines(&self.view()));
                Ok(ExitCode::SUCCESS)
            }
            Command::Search {
                prompt,
                temperature,
                save,
            } => self.search(&prompt, temperature, save),
            Command::Rate => {
                self.refresh_rate()?;
                println!("1 USD = {:.4} BRL", self.view().usd_brl);
                Ok(ExitCode::SUCCESS)
            }
        }
    }

    /// Applies `msg` and starts its effects. Returns the new view when something changed.
    pub fn dispatch(&mut self, msg: Msg) -> Option<AppViewModel> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);
        if was_dirty {
            self.render_progress(&view);
            Some(view)
        } else {
            None
        }
    }

    fn render_progress(&mut self, view: &AppViewModel) {
        let line = render::collection_progress(view).or_else(|| view.diagnostics_label.clone());
        if line != self.last_progress {
            if let Some(text) = &line {
                println!("{text}");
            }
        }
        self.last_progress = line;
    }

    /// Feeds engine events through the state machine until one matching
    /// `wanted` has been applied. A failed reply to the awaited request is
    /// returned in the inner result.
    fn await_event<F>(&mut self, wanted: F) -> Result<Result<(), BackendError>, Halt>
    where
        F: Fn(&EngineEvent) -> bool,
    {
        loop {
            let Some(event) = self.runner.next_event(POLL_INTERVAL)? else {
                continue;
            };
            let is_wanted = wanted(&event);
            match self.handle_event(event)? {
                Some(err) if is_wanted => return Ok(Err(err)),
                Some(err) => watch_warn!("Ignoring failed request: {}", err),
                None => {}
            }
            if is_wanted {
                return Ok(Ok(()));
            }
        }
    }

    /// Applies one engine event. An interrupt while a cancel is already
    /// pending halts instead of being applied.
    fn handle_event(&mut self, event: EngineEvent) -> Result<Option<BackendError>, Halt> {
        if matches!(event, EngineEvent::Interrupted) && self.state.cancel_pending() {
            return Err(Halt::Interrupted);
        }
        match event_to_msg(event) {
            Ok(msg) => {
                self.dispatch(msg);
                Ok(None)
            }
            Err(err) => Ok(Some(err)),
        }
    }

    fn collect(&mut self, groups: Vec<String>, min_days: Option<u32>) -> Result<ExitCode> {
        self.runner.request(EngineCommand::FetchConfig);
        if let Err(err) = self.await_event(|e| matches!(e, EngineEvent::ConfigLoaded(_)))? {
            watch_warn!("Service configuration unavailable: {}", err);
        }
        if let Some(days) = self.settings.default_min_days {
            self.dispatch(Msg::MinDaysPresetChosen(days));
        }
        if let Some(days) = min_days {
            self.dispatch(Msg::MinDaysPresetChosen(days));
        }
        self.dispatch(Msg::GroupsSelected(groups));

        self.runner.request(EngineCommand::WatchInterrupts);
        self.dispatch(Msg::CollectClicked);
        if !self.state.collection_running() {
            print_lines(render::collection_report(&self.view()));
            return Ok(ExitCode::from(2));
        }
        self.await_event(|e| matches!(e, EngineEvent::CollectionFinished(_)))??;

        let view = self.view();
        print_lines(render::collection_report(&view));
        if view.last_collection.is_none() {
            return Ok(ExitCode::from(2));
        }
        Ok(ExitCode::SUCCESS)
    }

    fn diagnostics(&mut self, patterns: DiagnosticsPatterns) -> Result<ExitCode> {
        self.runner.request(EngineCommand::WatchInterrupts);
        self.dispatch(Msg::DiagnosticsClicked(patterns));
        self.await_event(|e| matches!(e, EngineEvent::DiagnosticsFinished(_)))??;

        let view = self.view();
        print_lines(render::diagnostics_report(&view));
        Ok(match view.last_diagnostics {
            Some(DiagnosticsOutcome::Failed { .. }) => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        })
    }

    fn items(
        &mut self,
        groups: Vec<String>,
        status: Option<String>,
        deadline: Option<String>,
        max_amount: Option<String>,
    ) -> Result<ExitCode> {
        for group in &groups {
            self.runner.request(EngineCommand::LoadItems {
                group: group.clone(),
                status: status.clone(),
            });
        }
        for _ in &groups {
            self.await_event(|e| matches!(e, EngineEvent::ItemsLoaded { .. }))?
                .context("failed to load items")?;
        }

        if let Some(raw) = deadline {
            self.dispatch(Msg::DeadlineFilterEntered(raw));
        }
        if let Some(raw) = max_amount {
            self.dispatch(Msg::AmountFilterEntered(raw));
        }

        let view = self.view();
        watch_debug!(
            "Filters applied: {} of {} records visible",
            view.visibility.visible,
            view.visibility.total
        );
        print_lines(render::record_lines(&view));
        Ok(if view.filter_error.is_some() {
            ExitCode::from(2)
        } else {
            ExitCode::SUCCESS
        })
    }

    fn refresh_rate(&mut self) -> Result<()> {
        self.runner.request(EngineCommand::FetchExchangeRate);
        self.await_event(|e| matches!(e, EngineEvent::ExchangeRateFetched(_)))??;
        Ok(())
    }

    /// Builds the prompt, gathers rate and link tokens, and records the quote inputs.
    fn prepare_quote(&mut self, args: &PromptArgs) -> Result<(String, PromptTemplate)> {
        let template = PromptTemplate::from_key(&args.template).unwrap_or_default();
        let prompt = match &args.prompt {
            Some(text) => text.clone(),
            None => template.render(&PromptInputs {
                theme: args.theme.clone(),
                region: args.region.clone(),
                min_days: self.state.min_days(),
                link: args.link.clone(),
            }),
        };
        if prompt.trim().is_empty() {
            bail!("prompt is empty");
        }

        if !args.offline {
            self.refresh_rate()?;
        }
        if args.count_link {
            let Some(link) = &args.link else {
                bail!("--count-link needs --link");
            };
            self.runner.request(EngineCommand::CountLinkTokens { url: link.clone() });
            self.await_event(|e| matches!(e, EngineEvent::LinkTokensCounted(_)))?
                .context("failed to count link tokens")?;
        }

        let pricing = self.settings.price_table().pricing_for(&args.model);
        watch_info!(
            "Quoting model {} at {}/{} USD per million tokens",
            args.model,
            pricing.input_per_million,
            pricing.output_per_million
        );
        self.dispatch(Msg::PromptPrepared(QuoteInputs {
            prompt: prompt.clone(),
            pricing,
            max_output_tokens: args.max_tokens,
        }));
        Ok((prompt, template))
    }

    fn search(&mut self, args: &PromptArgs, temperature: f64, save: bool) -> Result<ExitCode> {
        let (prompt, template) = self.prepare_quote(args)?;
        print_lines(render::quote_lines(&self.view()));

        let view = self.view();
        let pricing = self.settings.price_table().pricing_for(&args.model).normalized();
        let mode_label = match &args.prompt {
            Some(_) => "Free prompt".to_string(),
            None => template.mode_label().to_string(),
        };
        self.runner.request(EngineCommand::Search(SearchRequest {
            prompt,
            model: args.model.clone(),
            mode_label,
            temperature,
            max_output_tokens: args.max_tokens,
            input_per_million: pricing.input_per_million,
            output_per_million: pricing.output_per_million,
            usd_brl: view.usd_brl,
            save,
            link_tokens: view.link_tokens,
            link: args.link.clone(),
        }));
        self.await_event(|e| matches!(e, EngineEvent::SearchFinished(_)))?
            .context("search failed")?;

        println!();
        print_lines(render::search_lines(&self.view()));
        Ok(ExitCode::SUCCESS)
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}
