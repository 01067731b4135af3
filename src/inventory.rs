//! Local inventory of saved speeches.
//!
//! Rebuilds, from the save directory alone, which speeches have already been
//! downloaded. The expected layout is:
//!
//! ```text
//! <save_dir>/
//!   42/                 term (numeric directory)
//!     7/                sitting (numeric directory)
//!       42-7-1.xml      speech; the last dash segment of the stem is the id
//!       42-7-2.xml
//! ```
//!
//! Anything that does not fit (non-numeric names, stray files, other
//! extensions) is not part of the managed tree and is skipped silently.
//! That includes numeric names too large for an id (above `u32::MAX`): the
//! harvester never writes such a path, so a scan treats it as a foreign file
//! rather than failing. Listings are stricter, see [`crate::extract`], since
//! an unparsable id there means the remote document is not what we expect.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::{Inventory, SpeechKey, SpeechTreeBuilder};

/// Extension of persisted speech documents.
pub const SPEECH_EXTENSION: &str = "xml";

/// Scan `root` and return every speech saved under it.
///
/// A missing root is an empty inventory. Terms and sittings whose
/// directories exist are present even without any speech file.
pub fn build_inventory(root: &Path) -> Result<Inventory> {
    let mut builder = SpeechTreeBuilder::new();

    if !root.is_dir() {
        return Ok(Inventory(builder.build()));
    }

    for (term, term_dir) in numeric_subdirs(root)? {
        builder.term(term);

        for (session, session_dir) in numeric_subdirs(&term_dir)? {
            builder.session(term, session);

            for entry in children(&session_dir) {
                let entry = entry
                    .with_context(|| format!("Failed to read {}", session_dir.display()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(speech) = speech_id_from_path(entry.path()) {
                    builder.speech(SpeechKey::new(term, session, speech));
                }
            }
        }
    }

    Ok(Inventory(builder.build()))
}

/// The speech id encoded in a saved file name, e.g. `42-7-130.xml` → `130`.
pub fn speech_id_from_path(path: &Path) -> Option<u32> {
    if path.extension()? != SPEECH_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    parse_numeric(stem.rsplit('-').next()?)
}

fn numeric_subdirs(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let mut out = Vec::new();
    for entry in children(dir) {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(id) = entry.file_name().to_str().and_then(parse_numeric) {
            out.push((id, entry.into_path()));
        }
    }
    Ok(out)
}

fn children(dir: &Path) -> walkdir::IntoIter {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
}

/// Only plain ASCII digits that fit a `u32` count; signs, spaces, empty
/// strings and overflowing values do not.
fn parse_numeric(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
