//! Fetching and persisting planned speeches.
//!
//! Each speech lands at `<save_dir>/<term>/<session>/<term>-<session>-<speech>.xml`.
//! A speech the API reports as empty gets no file, so it stays missing from
//! the inventory and is planned again on the next run.
//!
//! A connection failure is retried once after a fixed pause; a second
//! consecutive failure aborts the run. Files written so far stay on disk.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{ApiError, ParliamentApi};
use crate::extract::pretty_print;
use crate::models::{DownloadPlan, SessionId, SpeechKey, TermId};
use crate::progress::{SyncProgressEvent, SyncProgressReporter};

/// How often a speech request is attempted, and the pause between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// One retry after `delay`.
    pub fn single_retry(delay: Duration) -> Self {
        Self { attempts: 2, delay }
    }
}

/// Outcome counts of [`download_plan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub saved: u64,
    /// Speeches the API answered with an empty document.
    pub empty: u64,
}

/// Directory holding the speeches of one sitting: `<save_dir>/<term>/<session>`.
pub fn session_dir(save_dir: &Path, term: TermId, session: SessionId) -> PathBuf {
    save_dir.join(term.to_string()).join(session.to_string())
}

/// Path a speech is saved under.
pub fn speech_path(save_dir: &Path, key: &SpeechKey) -> PathBuf {
    session_dir(save_dir, key.term, key.session).join(key.file_name())
}

/// Fetch and save every speech in `plan`, in canonical order.
pub fn download_plan(
    api: &dyn ParliamentApi,
    plan: &DownloadPlan,
    save_dir: &Path,
    retry: RetryPolicy,
    reporter: &dyn SyncProgressReporter,
) -> Result<DownloadReport> {
    let total = plan.speech_count() as u64;
    let mut report = DownloadReport::default();
    let mut n = 0u64;

    for (term, sessions) in plan.terms() {
        for (&session, speeches) in sessions {
            let dir = session_dir(save_dir, term, session);
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

            for &speech in speeches {
                let key = SpeechKey::new(term, session, speech);
                n += 1;
                reporter.report(SyncProgressEvent::Downloading { key, n, total });

                match fetch_with_retry(|| api.speech(key), retry)
                    .with_context(|| format!("Failed to fetch speech {}", key))?
                {
                    Some(xml) => {
                        save_speech(&speech_path(save_dir, &key), &xml)?;
                        report.saved += 1;
                    }
                    None => {
                        tracing::info!(%key, "speech has no content");
                        report.empty += 1;
                    }
                }
            }
        }
    }

    Ok(report)
}

/// Runs `request` up to `policy.attempts` times. Only connection failures are
/// repeated; anything else, or running out of attempts, returns the error.
pub fn fetch_with_retry<T, F>(mut request: F, policy: RetryPolicy) -> Result<T, ApiError>
where
    F: FnMut() -> Result<T, ApiError>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match request() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_connection() && attempt < attempts => {
                tracing::warn!(
                    error = %e,
                    delay_secs = policy.delay.as_secs_f64(),
                    "request failed, retrying"
                );
                std::thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Writes through a `.part` sibling so an interrupted run never leaves a
/// truncated `.xml` for the inventory to count.
fn save_speech(path: &Path, xml: &str) -> Result<()> {
    let pretty = pretty_print(xml)
        .with_context(|| format!("Malformed speech document for {}", path.display()))?;
    let partial = path.with_extension("xml.part");
    std::fs::write(&partial, pretty)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;
    tracing::debug!(path = %path.display(), "saved speech");
    Ok(())
}
