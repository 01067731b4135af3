//! Harvest progress reporting.
//!
//! Reports what a `harvest sync` run is doing: which term listing is being
//! scanned, how much the plan contains, and how far the download has got.
//! Progress is emitted on **stderr** so stdout remains parseable for scripts.

use std::io::Write;

use crate::models::{SpeechKey, TermId};

/// A single progress event for a harvest run.
#[derive(Clone, Debug)]
pub enum SyncProgressEvent {
    /// Reading (from cache or remote) the listings of one term.
    ScanningTerm { term: TermId },
    /// Planning finished: this many speeches still need fetching.
    Planned { total: u64 },
    /// Download phase: n speeches processed out of total.
    Downloading { key: SpeechKey, n: u64, total: u64 },
}

/// Reports harvest progress. Implementations write to stderr (human or JSON).
pub trait SyncProgressReporter {
    /// Emit a progress event.
    fn report(&self, event: SyncProgressEvent);
}

/// Human-friendly progress on stderr: "harvest  downloading  1,234 / 5,000 speeches".
pub struct StderrProgress;

impl SyncProgressReporter for StderrProgress {
    fn report(&self, event: SyncProgressEvent) {
        let line = match &event {
            SyncProgressEvent::ScanningTerm { term } => {
                format!("harvest  scanning term {}...\n", term)
            }
            SyncProgressEvent::Planned { total } => {
                format!("harvest  planned  {} speeches\n", format_number(*total))
            }
            SyncProgressEvent::Downloading { key, n, total } => format!(
                "harvest  downloading  {} / {} speeches  ({})\n",
                format_number(*n),
                format_number(*total),
                key
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl SyncProgressReporter for JsonProgress {
    fn report(&self, event: SyncProgressEvent) {
        let obj = match &event {
            SyncProgressEvent::ScanningTerm { term } => serde_json::json!({
                "event": "progress",
                "phase": "scanning",
                "term": term
            }),
            SyncProgressEvent::Planned { total } => serde_json::json!({
                "event": "progress",
                "phase": "planned",
                "total": total
            }),
            SyncProgressEvent::Downloading { key, n, total } => serde_json::json!({
                "event": "progress",
                "phase": "downloading",
                "term": key.term,
                "session": key.session,
                "speech": key.speech,
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl SyncProgressReporter for NoProgress {
    fn report(&self, _event: SyncProgressEvent) {}
}

pub(crate) fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let len = digits.len();
    digits
        .char_indices()
        .fold(String::with_capacity(len + len / 3), |mut out, (i, c)| {
            if i > 0 && (len - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
            out
        })
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn SyncProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1), "1");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1_234_567), "1,234,567");
        assert_eq!(format_number(12_345), "12,345");
        assert_eq!(format_number(u64::MAX), "18,446,744,073,709,551,615");
    }
}
