mod app;
mod effects;
mod logging;
mod settings;
mod ui;

use std::process::ExitCode;

use anyhow::{anyhow, Result};
use watcher_logging::watch_info;

use crate::cli::Cli;

use app::App;
pub use settings::DEFAULT_SETTINGS_FILE;

pub fn run_cli(cli: Cli) -> Result<ExitCode> {
    let level = watcher_logging::parse_level_filter(&cli.log_level)
        .ok_or_else(|| anyhow!("unknown log level {:?}", cli.log_level))?;
    let destination = if cli.verbose {
        logging::LogDestination::Both
    } else {
        logging::LogDestination::File
    };
    logging::initialize(destination, level);

    let mut settings = settings::load_settings(&cli.settings);
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    watch_info!("Using collection service at {}", settings.base_url);

    let mut app = App::new(settings)?;
    app.run(cli.command)
}
