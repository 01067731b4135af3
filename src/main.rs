//! # Parlament Harvest CLI (`harvest`)
//!
//! ## Usage
//!
//! ```bash
//! harvest                                   # same as `harvest sync`
//! harvest --config ./harvest.toml sync
//! harvest sync --resume 42:7:130            # skip everything before 42/7/130
//! harvest sync --dry-run                    # plan only
//! harvest status                            # what is on disk
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use parlament_harvest::api::HttpApi;
use parlament_harvest::config::{self, Config};
use parlament_harvest::plan::{ResumeMarker, ResumeRule};
use parlament_harvest::progress::ProgressMode;
use parlament_harvest::status;
use parlament_harvest::sync::{self, SyncOptions};

/// Incremental harvester for the Hungarian Parliament speech API.
#[derive(Parser)]
#[command(name = "harvest", version)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress output on stderr. Defaults to `human` on a TTY, `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every speech that is known remotely but missing locally.
    ///
    /// Builds the local inventory, reads (or fetches and caches) the term
    /// and sitting listings, plans the missing speeches and downloads them.
    Sync {
        /// Only consider speeches from this point on: `TERM:SESSION:SPEECH`.
        #[arg(long)]
        resume: Option<ResumeMarker>,

        /// Compare the resume marker the way older harvest runs did.
        #[arg(long, requires = "resume")]
        legacy_resume: bool,

        /// Stop after planning; print what would be downloaded.
        #[arg(long)]
        dry_run: bool,
    },

    /// Summarise the speeches already saved locally.
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command.unwrap_or(Commands::Sync {
        resume: None,
        legacy_resume: false,
        dry_run: false,
    }) {
        Commands::Sync {
            resume,
            legacy_resume,
            dry_run,
        } => {
            let access_token = config::load_access_token(&cfg.api.key_file)?;
            let api = HttpApi::new(&cfg.api, access_token)?;

            let rule = if legacy_resume {
                ResumeRule::Legacy
            } else {
                ResumeRule::Lexicographic
            };
            let options = SyncOptions {
                resume: resume.map(|m| m.with_rule(rule)),
                dry_run,
            };

            let summary = sync::run_sync(&cfg, &api, &options, progress.reporter().as_ref())?;
            summary.print();
        }
        Commands::Status => {
            status::run_status(&cfg)?;
        }
    }

    Ok(())
}
