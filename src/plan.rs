//! Download planning: which speeches still have to be fetched.
//!
//! The plan is the remote metadata filtered twice: by an optional resume
//! marker (a lower bound), and by what is already held locally. Filtering
//! never reorders, so the plan inherits the metadata's canonical order.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context};

use crate::models::{
    DownloadPlan, Holdings, SessionId, SpeechId, SpeechKey, SpeechTreeBuilder, TermId,
};

/// How a [`ResumeMarker`] compares against candidate keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResumeRule {
    /// Plain `(term, session, speech)` ordering: a key is admitted when it
    /// sorts at or after the marker.
    #[default]
    Lexicographic,
    /// The comparison older harvest runs used, kept for reproducing their
    /// plans: admitted iff `T <= t && ((S == s && P <= p) || S < s)`.
    ///
    /// This is not an ordering. With marker `(1, 2, 2)` it rejects
    /// `(2, 1, 1)` (a later term with an earlier sitting number).
    Legacy,
}

/// Lower bound for planning; keys before it are left out regardless of
/// what is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeMarker {
    pub start: SpeechKey,
    pub rule: ResumeRule,
}

impl ResumeMarker {
    pub fn new(term: TermId, session: SessionId, speech: SpeechId) -> Self {
        Self {
            start: SpeechKey::new(term, session, speech),
            rule: ResumeRule::default(),
        }
    }

    pub fn with_rule(mut self, rule: ResumeRule) -> Self {
        self.rule = rule;
        self
    }

    /// Whether `key` is at or after the marker under its rule.
    pub fn admits(&self, key: &SpeechKey) -> bool {
        let m = &self.start;
        match self.rule {
            ResumeRule::Lexicographic => key >= m,
            ResumeRule::Legacy => {
                m.term <= key.term
                    && ((m.session == key.session && m.speech <= key.speech)
                        || m.session < key.session)
            }
        }
    }
}

impl fmt::Display for ResumeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.start.term, self.start.session, self.start.speech
        )
    }
}

/// Parses `TERM:SESSION:SPEECH`, e.g. `42:7:130`, with the default rule.
impl FromStr for ResumeMarker {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            bail!("Resume marker must look like TERM:SESSION:SPEECH, got '{}'", s);
        }
        let num = |name: &str, v: &str| -> anyhow::Result<u32> {
            v.trim()
                .parse()
                .with_context(|| format!("Invalid {} in resume marker: '{}'", name, v))
        };
        Ok(Self::new(
            num("term", parts[0])?,
            num("session", parts[1])?,
            num("speech", parts[2])?,
        ))
    }
}

/// Speeches in `metadata` that are admitted by `resume` (all of them when
/// `None`) and not already in `holdings`.
///
/// `metadata` is expected in canonical order, as produced by
/// [`crate::metadata::build_metadata`].
pub fn plan_downloads(
    metadata: &[SpeechKey],
    holdings: &dyn Holdings,
    resume: Option<&ResumeMarker>,
) -> DownloadPlan {
    let mut builder = SpeechTreeBuilder::new();

    for key in metadata {
        if resume.is_some_and(|marker| !marker.admits(key)) {
            continue;
        }
        if holdings.has(key) {
            continue;
        }
        tracing::debug!(%key, "planned");
        builder.speech(*key);
    }

    DownloadPlan(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Inventory, SpeechTree};

    fn keys(triples: &[(u32, u32, u32)]) -> Vec<SpeechKey> {
        triples.iter().copied().map(SpeechKey::from).collect()
    }

    fn inventory(triples: &[(u32, u32, u32)]) -> Inventory {
        Inventory(keys(triples).into_iter().collect())
    }

    const BOUNDARY_METADATA: [(u32, u32, u32); 4] = [(1, 1, 5), (1, 2, 1), (1, 2, 3), (2, 1, 1)];

    #[test]
    fn resume_boundary_lexicographic() {
        let metadata = keys(&BOUNDARY_METADATA);
        let marker = ResumeMarker::new(1, 2, 2);

        let plan = plan_downloads(&metadata, &Inventory::default(), Some(&marker));
        assert_eq!(plan.keys().collect::<Vec<_>>(), keys(&[(1, 2, 3), (2, 1, 1)]));
    }

    #[test]
    fn resume_boundary_legacy() {
        let metadata = keys(&BOUNDARY_METADATA);
        let marker = ResumeMarker::new(1, 2, 2).with_rule(ResumeRule::Legacy);

        let plan = plan_downloads(&metadata, &Inventory::default(), Some(&marker));
        assert_eq!(plan.keys().collect::<Vec<_>>(), keys(&[(1, 2, 3)]));
    }

    #[test]
    fn legacy_rule_truth_table() {
        let marker = ResumeMarker::new(5, 3, 10).with_rule(ResumeRule::Legacy);
        let admits = |t, s, p| marker.admits(&SpeechKey::new(t, s, p));

        assert!(admits(5, 3, 10));
        assert!(admits(5, 3, 11));
        assert!(!admits(5, 3, 9));
        assert!(admits(5, 4, 0));
        assert!(!admits(5, 2, 99));
        assert!(!admits(4, 9, 99));
        assert!(admits(6, 3, 10));
        assert!(!admits(6, 1, 1));
    }

    #[test]
    fn lexicographic_rule_admits_later_terms() {
        let marker = ResumeMarker::new(5, 3, 10);
        assert!(marker.admits(&SpeechKey::new(6, 1, 1)));
        assert!(marker.admits(&SpeechKey::new(5, 4, 0)));
        assert!(marker.admits(&SpeechKey::new(5, 3, 10)));
        assert!(!marker.admits(&SpeechKey::new(5, 3, 9)));
        assert!(!marker.admits(&SpeechKey::new(4, 9, 99)));
    }

    #[test]
    fn no_marker_and_empty_inventory_plans_everything() {
        let metadata = keys(&[(1, 1, 1), (1, 1, 2), (1, 3, 1), (2, 1, 4)]);
        let plan = plan_downloads(&metadata, &Inventory::default(), None);

        let expected: SpeechTree = metadata.iter().copied().collect();
        assert_eq!(plan.0, expected);
        assert_eq!(plan.speeches(1, 1), &[1, 2]);
    }

    #[test]
    fn held_speeches_are_skipped_per_sitting() {
        let metadata = keys(&[(1, 1, 1), (1, 1, 2), (1, 2, 1), (2, 1, 1)]);
        // (1, 2, 2) and (3, 1, 1) are on disk but unknown remotely.
        let held = inventory(&[(1, 1, 2), (1, 2, 2), (3, 1, 1)]);

        let plan = plan_downloads(&metadata, &held, None);
        assert_eq!(
            plan.keys().collect::<Vec<_>>(),
            keys(&[(1, 1, 1), (1, 2, 1), (2, 1, 1)])
        );
    }

    #[test]
    fn planning_is_deterministic() {
        let metadata = keys(&[(1, 1, 1), (1, 2, 5), (2, 1, 1), (2, 2, 2)]);
        let held = inventory(&[(1, 2, 5)]);
        let marker = ResumeMarker::new(1, 1, 2);

        let a = plan_downloads(&metadata, &held, Some(&marker));
        let b = plan_downloads(&metadata, &held, Some(&marker));
        assert_eq!(a, b);
        assert_eq!(a.keys().collect::<Vec<_>>(), keys(&[(2, 1, 1), (2, 2, 2)]));
    }

    #[test]
    fn parse_marker() {
        let marker: ResumeMarker = "42:7:130".parse().unwrap();
        assert_eq!(marker.start, SpeechKey::new(42, 7, 130));
        assert_eq!(marker.rule, ResumeRule::Lexicographic);
        assert_eq!(marker.to_string(), "42:7:130");

        assert!("42:7".parse::<ResumeMarker>().is_err());
        assert!("42:x:1".parse::<ResumeMarker>().is_err());
        assert!("42:-1:1".parse::<ResumeMarker>().is_err());
    }
}
