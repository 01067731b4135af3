//! Remote metadata: the flat, ordered list of every speech known to exist.
//!
//! Walks term → sitting → speech listings, reading each listing from the
//! [`ListingCache`] when present and fetching (then caching) it otherwise.
//!
//! Scan rules:
//! - terms are requested in ascending order; the first term whose listing comes
//!   back empty ends the scan, later terms are assumed not to exist;
//! - a sitting whose speech listing comes back empty is skipped and the scan
//!   continues with the next sitting;
//! - any other API failure propagates. Listings cached so far stay cached,
//!   so a re-run picks up where this one stopped.

use anyhow::{Context, Result};
use std::ops::RangeInclusive;

use crate::api::ParliamentApi;
use crate::cache::ListingCache;
use crate::extract::{session_ids, speech_ids};
use crate::models::{SessionId, SpeechKey, TermId};
use crate::progress::{SyncProgressEvent, SyncProgressReporter};

/// Every speech key in `terms`, in ascending order.
pub fn build_metadata(
    api: &dyn ParliamentApi,
    cache: &ListingCache,
    terms: RangeInclusive<TermId>,
    reporter: &dyn SyncProgressReporter,
) -> Result<Vec<SpeechKey>> {
    let mut keys = Vec::new();

    for term in terms {
        reporter.report(SyncProgressEvent::ScanningTerm { term });

        let Some(listing) = term_listing(api, cache, term)? else {
            tracing::info!(term, "term listing is empty, stopping scan");
            break;
        };

        let sessions =
            session_ids(&listing).with_context(|| format!("Bad sitting listing for term {}", term))?;

        for session in sessions {
            let Some(listing) = sitting_listing(api, cache, term, session)? else {
                tracing::debug!(term, session, "sitting has no speech listing, skipping");
                continue;
            };

            let speeches = speech_ids(&listing).with_context(|| {
                format!("Bad speech listing for term {} sitting {}", term, session)
            })?;
            keys.extend(
                speeches
                    .into_iter()
                    .map(|speech| SpeechKey::new(term, session, speech)),
            );
        }
    }

    tracing::info!(speeches = keys.len(), "remote metadata built");
    Ok(keys)
}

fn term_listing(
    api: &dyn ParliamentApi,
    cache: &ListingCache,
    term: TermId,
) -> Result<Option<String>> {
    if let Some(cached) = cache.load_term(term)? {
        tracing::debug!(term, "term listing from cache");
        return Ok(Some(cached));
    }

    match api
        .term_sittings(term)
        .with_context(|| format!("Failed to fetch sitting listing for term {}", term))?
    {
        Some(xml) => Ok(Some(cache.store_term(term, &xml)?)),
        None => Ok(None),
    }
}

fn sitting_listing(
    api: &dyn ParliamentApi,
    cache: &ListingCache,
    term: TermId,
    session: SessionId,
) -> Result<Option<String>> {
    if let Some(cached) = cache.load_sitting(term, session)? {
        return Ok(Some(cached));
    }

    match api.sitting_speeches(term, session).with_context(|| {
        format!(
            "Failed to fetch speech listing for term {} sitting {}",
            term, session
        )
    })? {
        Some(xml) => Ok(Some(cache.store_sitting(term, session, &xml)?)),
        None => Ok(None),
    }
}
