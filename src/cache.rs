//! On-disk cache of listing documents.
//!
//! ```text
//! <metadata_dir>/
//!   term_42.xml              sittings of term 42
//!   42/
//!     sittings_7.xml         speeches of term 42, sitting 7
//! ```
//!
//! Entries are written once, pretty-printed, and read back verbatim. Nothing
//! here ever refreshes or invalidates an entry.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::extract::pretty_print;
use crate::models::{SessionId, TermId};

pub struct ListingCache {
    root: PathBuf,
}

impl ListingCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn term_path(&self, term: TermId) -> PathBuf {
        self.root.join(format!("term_{}.xml", term))
    }

    pub fn sitting_path(&self, term: TermId, session: SessionId) -> PathBuf {
        self.root
            .join(term.to_string())
            .join(format!("sittings_{}.xml", session))
    }

    pub fn load_term(&self, term: TermId) -> Result<Option<String>> {
        read_if_present(&self.term_path(term))
    }

    pub fn load_sitting(&self, term: TermId, session: SessionId) -> Result<Option<String>> {
        read_if_present(&self.sitting_path(term, session))
    }

    /// Stores a freshly fetched term listing and returns the stored text.
    pub fn store_term(&self, term: TermId, xml: &str) -> Result<String> {
        write_pretty(&self.term_path(term), xml)
    }

    /// Stores a freshly fetched sitting listing and returns the stored text.
    pub fn store_sitting(&self, term: TermId, session: SessionId, xml: &str) -> Result<String> {
        write_pretty(&self.sitting_path(term, session), xml)
    }
}

fn read_if_present(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cached listing: {}", path.display()))?;
    Ok(Some(text))
}

fn write_pretty(path: &Path, xml: &str) -> Result<String> {
    let pretty = pretty_print(xml)
        .with_context(|| format!("Refusing to cache malformed listing: {}", path.display()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, &pretty)
        .with_context(|| format!("Failed to write cached listing: {}", path.display()))?;
    tracing::info!(path = %path.display(), "cached listing");
    Ok(pretty)
}
