use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use storytag::config::CliOverrides;

mod cmd;

#[derive(Parser)]
#[command(name = "storytag")]
#[command(version, about = "Assign sequential identifiers to Pivotal Tracker stories")]
pub struct Cli {
    /// Log every classification decision
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to storytag.toml. Defaults to ./storytag.toml, then the user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Pivotal Tracker project id. Overrides PIVOTAL_TRACKER_PROJECT_ID.
    #[arg(long, global = true)]
    pub project_id: Option<String>,

    /// Identifier prefix for a single sequence (e.g. "PROJ"). Overrides PIVOTAL_TRACKER_STORY_PREFIX.
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Category mapping CODE=label (repeatable). Overrides PIVOTAL_TRACKER_CATEGORIES.
    #[arg(short = 'c', long = "category", global = true)]
    pub categories: Vec<String>,

    /// Base URL of the Tracker API. Overrides PIVOTAL_TRACKER_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tag every story that does not carry an identifier yet
    Run {
        /// Show the new titles without updating any story
        #[arg(long)]
        dry_run: bool,

        /// Print the pass report as JSON
        #[arg(long)]
        json: bool,

        /// Stories requested per page (1-500)
        #[arg(long)]
        page_size: Option<u32>,

        /// Maximum number of pages to fetch
        #[arg(long)]
        max_pages: Option<u32>,
    },
    /// View, validate or initialize configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Check that the configuration is complete
    Validate,
    /// Write a starter storytag.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let (page_size, max_pages) = match &self.command {
            Commands::Run {
                page_size,
                max_pages,
                ..
            } => (*page_size, *max_pages),
            Commands::Config { .. } => (None, None),
        };
        CliOverrides {
            config_path: self.config.clone(),
            project_id: self.project_id.clone(),
            prefix: self.prefix.clone(),
            categories: self.categories.clone(),
            api_url: self.api_url.clone(),
            page_size,
            max_pages,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is normal; real settings may come from the shell.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match std::env::current_dir() {
        Ok(cwd) => {
            let overrides = cli.overrides();
            match &cli.command {
                Commands::Run { dry_run, json, .. } => {
                    cmd::cmd_run(&cwd, &overrides, *dry_run, *json).await
                }
                Commands::Config { command } => cmd::cmd_config(&cwd, &overrides, command.clone()),
            }
        }
        Err(e) => Err(anyhow::Error::new(e).context("Failed to get current directory")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", console::style("[ERROR]:").for_stderr().red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
