//! Harvest run orchestration.
//!
//! Coordinates the full flow: local inventory → remote metadata → plan →
//! download. Nothing is checkpointed in memory or on the side; every run
//! re-derives its state from the save and metadata directories, so a run
//! that was killed or failed is simply started again.

use anyhow::{Context, Result};

use crate::api::ParliamentApi;
use crate::cache::ListingCache;
use crate::config::Config;
use crate::download::{download_plan, DownloadReport, RetryPolicy};
use crate::inventory::build_inventory;
use crate::metadata::build_metadata;
use crate::models::DownloadPlan;
use crate::plan::{plan_downloads, ResumeMarker};
use crate::progress::{SyncProgressEvent, SyncProgressReporter};

/// Per-run switches from the command line.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub resume: Option<ResumeMarker>,
    /// Stop after planning.
    pub dry_run: bool,
}

/// What a run found and did.
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub local_speeches: usize,
    pub remote_speeches: usize,
    pub plan: DownloadPlan,
    /// `None` on a dry run.
    pub download: Option<DownloadReport>,
}

impl SyncSummary {
    pub fn print(&self) {
        println!("harvest sync{}", if self.download.is_none() { " (dry-run)" } else { "" });
        println!("  local speeches: {}", self.local_speeches);
        println!("  remote speeches: {}", self.remote_speeches);
        println!(
            "  planned: {} speeches in {} sittings",
            self.plan.speech_count(),
            self.plan.session_count()
        );
        if let Some(report) = &self.download {
            println!("  saved: {}", report.saved);
            println!("  empty: {}", report.empty);
        }
        println!("ok");
    }
}

pub fn run_sync(
    config: &Config,
    api: &dyn ParliamentApi,
    options: &SyncOptions,
    reporter: &dyn SyncProgressReporter,
) -> Result<SyncSummary> {
    let storage = &config.storage;
    for dir in [&storage.save_dir, &storage.metadata_dir] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let inventory = build_inventory(&storage.save_dir)?;
    tracing::info!(
        terms = inventory.term_count(),
        speeches = inventory.speech_count(),
        "local inventory built"
    );

    let cache = ListingCache::new(&storage.metadata_dir);
    let metadata = build_metadata(api, &cache, config.scan.terms(), reporter)?;

    if let Some(marker) = &options.resume {
        tracing::info!(%marker, rule = ?marker.rule, "resuming");
    }
    let plan = plan_downloads(&metadata, &inventory, options.resume.as_ref());
    reporter.report(SyncProgressEvent::Planned {
        total: plan.speech_count() as u64,
    });

    let download = if options.dry_run {
        None
    } else {
        let retry = RetryPolicy::single_retry(config.api.retry_delay());
        Some(download_plan(api, &plan, &storage.save_dir, retry, reporter)?)
    };

    Ok(SyncSummary {
        local_speeches: inventory.speech_count(),
        remote_speeches: metadata.len(),
        plan,
        download,
    })
}
