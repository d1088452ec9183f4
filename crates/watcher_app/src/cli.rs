use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "editais-watcher",
    version,
    about = "Collects funding calls by group, probes providers and estimates AI search costs"
)]
pub struct Cli {
    /// RON settings file
    #[arg(long, default_value = crate::platform::DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Base URL of the collection service (overrides the settings file)
    #[arg(long)]
    pub base_url: Option<String>,

    /// off, error, warn, info, debug or trace
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Also write log lines to the terminal
    #[arg(long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Collect groups one at a time; Ctrl-C stops after the current group
    Collect {
        /// Group to collect (repeatable); all available groups when omitted
        #[arg(long = "group")]
        groups: Vec<String>,

        /// Only keep calls with at least this many days left
        #[arg(long)]
        min_days: Option<u32>,
    },
    /// Probe every provider with optional filters; Ctrl-C aborts the probe
    Diag {
        #[arg(long, default_value = "")]
        re_gov: String,
        #[arg(long, default_value = "")]
        re_funda: String,
        #[arg(long, default_value = "")]
        re_corp: String,
        #[arg(long, default_value = "")]
        re_latam: String,
    },
    /// List collected items of one or more groups
    Items {
        #[arg(long = "group", required = true)]
        groups: Vec<String>,

        #[arg(long)]
        status: Option<String>,

        /// Hide items whose deadline is before this date (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        /// Hide items worth more than this amount (BRL)
        #[arg(long)]
        max_amount: Option<String>,
    },
    /// Estimate the cost of an AI search before running it
    Estimate(PromptArgs),
    /// Estimate, then run the AI search
    Search {
        #[command(flatten)]
        prompt: PromptArgs,

        #[arg(long, default_value_t = 0.2)]
        temperature: f64,

        /// Ask the service to store the answer
        #[arg(long)]
        save: bool,
    },
    /// Fetch the current USD to BRL exchange rate
    Rate,
}

#[derive(Debug, Args, Clone)]
pub struct PromptArgs {
    /// Prompt text; takes precedence over --template
    #[arg(long)]
    pub prompt: Option<String>,

    /// list, summary or compare
    #[arg(long, default_value = "list")]
    pub template: String,

    #[arg(long, default_value = "")]
    pub theme: String,

    #[arg(long, default_value = "")]
    pub region: String,

    /// Call link used by the summary and compare templates
    #[arg(long)]
    pub link: Option<String>,

    /// Count the tokens of the linked page and add them to the input
    #[arg(long)]
    pub count_link: bool,

    #[arg(long, default_value = "sonar")]
    pub model: String,

    #[arg(long, default_value_t = watcher_core::DEFAULT_MAX_OUTPUT_TOKENS)]
    pub max_tokens: u32,

    /// Skip the live exchange-rate lookup
    #[arg(long)]
    pub offline: bool,
}
