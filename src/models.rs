//! Core data models used throughout the harvester.
//!
//! Speeches are addressed by a three-level key: legislative term, sitting
//! (session) within the term, and speech number within the sitting. The
//! canonical ordering of keys is lexicographic over those three levels.
//!
//! [`SpeechTree`] is the shared grouped shape (term → sitting → sorted
//! speech ids). [`Inventory`] and [`DownloadPlan`] wrap it so the two roles
//! cannot be mixed up.

use std::collections::BTreeMap;
use std::fmt;

/// Legislative term number (e.g. `42`).
pub type TermId = u32;
/// Sitting (session day) number, unique within a term.
pub type SessionId = u32;
/// Speech number, unique within a term and sitting.
pub type SpeechId = u32;

/// The address of one speech.
///
/// Field order matters: the derived `Ord` compares term, then session, then
/// speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpeechKey {
    pub term: TermId,
    pub session: SessionId,
    pub speech: SpeechId,
}

impl SpeechKey {
    pub fn new(term: TermId, session: SessionId, speech: SpeechId) -> Self {
        Self {
            term,
            session,
            speech,
        }
    }

    /// File name under which the speech is persisted: `<term>-<session>-<speech>.xml`.
    pub fn file_name(&self) -> String {
        format!("{}-{}-{}.xml", self.term, self.session, self.speech)
    }
}

impl fmt::Display for SpeechKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.term, self.session, self.speech)
    }
}

impl From<(TermId, SessionId, SpeechId)> for SpeechKey {
    fn from((term, session, speech): (TermId, SessionId, SpeechId)) -> Self {
        Self::new(term, session, speech)
    }
}

/// Term → sitting → ascending, de-duplicated speech ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechTree {
    terms: BTreeMap<TermId, BTreeMap<SessionId, Vec<SpeechId>>>,
}

impl SpeechTree {
    pub fn is_empty(&self) -> bool {
        self.terms.values().all(|s| s.values().all(Vec::is_empty))
    }

    /// Speech ids recorded for a sitting; empty when the sitting is unknown.
    pub fn speeches(&self, term: TermId, session: SessionId) -> &[SpeechId] {
        self.terms
            .get(&term)
            .and_then(|sessions| sessions.get(&session))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, key: &SpeechKey) -> bool {
        self.speeches(key.term, key.session)
            .binary_search(&key.speech)
            .is_ok()
    }

    pub fn terms(&self) -> impl Iterator<Item = (TermId, &BTreeMap<SessionId, Vec<SpeechId>>)> {
        self.terms.iter().map(|(t, s)| (*t, s))
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    pub fn session_count(&self) -> usize {
        self.terms.values().map(BTreeMap::len).sum()
    }

    pub fn speech_count(&self) -> usize {
        self.terms
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// All keys in canonical order.
    pub fn keys(&self) -> impl Iterator<Item = SpeechKey> + '_ {
        self.terms.iter().flat_map(|(&term, sessions)| {
            sessions.iter().flat_map(move |(&session, speeches)| {
                speeches
                    .iter()
                    .map(move |&speech| SpeechKey::new(term, session, speech))
            })
        })
    }
}

/// Accumulates ids in any order and produces a sorted [`SpeechTree`].
#[derive(Debug, Default)]
pub struct SpeechTreeBuilder {
    terms: BTreeMap<TermId, BTreeMap<SessionId, Vec<SpeechId>>>,
}

impl SpeechTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a term with no sittings yet.
    pub fn term(&mut self, term: TermId) -> &mut Self {
        self.terms.entry(term).or_default();
        self
    }

    /// Registers a sitting with no speeches yet.
    pub fn session(&mut self, term: TermId, session: SessionId) -> &mut Self {
        self.terms
            .entry(term)
            .or_default()
            .entry(session)
            .or_default();
        self
    }

    pub fn speech(&mut self, key: SpeechKey) -> &mut Self {
        self.terms
            .entry(key.term)
            .or_default()
            .entry(key.session)
            .or_default()
            .push(key.speech);
        self
    }

    pub fn build(self) -> SpeechTree {
        let mut terms = self.terms;
        for speeches in terms.values_mut().flat_map(BTreeMap::values_mut) {
            speeches.sort_unstable();
            speeches.dedup();
        }
        SpeechTree { terms }
    }
}

impl FromIterator<SpeechKey> for SpeechTree {
    fn from_iter<I: IntoIterator<Item = SpeechKey>>(iter: I) -> Self {
        let mut builder = SpeechTreeBuilder::new();
        for key in iter {
            builder.speech(key);
        }
        builder.build()
    }
}

/// Speeches already saved on local storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory(pub SpeechTree);

/// Speeches that still have to be fetched, in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadPlan(pub SpeechTree);

impl std::ops::Deref for Inventory {
    type Target = SpeechTree;

    fn deref(&self) -> &SpeechTree {
        &self.0
    }
}

impl std::ops::Deref for DownloadPlan {
    type Target = SpeechTree;

    fn deref(&self) -> &SpeechTree {
        &self.0
    }
}

/// What the planner asks when deciding whether a speech still needs fetching.
///
/// [`Inventory`] answers from the files on disk. Other sources of "do not
/// fetch" knowledge (for instance a persisted set of speeches the API reports
/// as empty) can implement this and be passed to the planner instead.
pub trait Holdings {
    fn has(&self, key: &SpeechKey) -> bool;
}

impl Holdings for Inventory {
    fn has(&self, key: &SpeechKey) -> bool {
        self.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_order_lexicographically() {
        let mut keys = vec![
            SpeechKey::new(2, 1, 1),
            SpeechKey::new(1, 2, 1),
            SpeechKey::new(1, 1, 5),
            SpeechKey::new(1, 2, 0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                SpeechKey::new(1, 1, 5),
                SpeechKey::new(1, 2, 0),
                SpeechKey::new(1, 2, 1),
                SpeechKey::new(2, 1, 1),
            ]
        );
    }

    #[test]
    fn builder_sorts_and_dedups_leaves() {
        let tree: SpeechTree = [(3, 1, 9), (1, 4, 2), (1, 4, 1), (1, 4, 2), (1, 2, 7)]
            .into_iter()
            .map(SpeechKey::from)
            .collect();

        assert_eq!(tree.speeches(1, 4), &[1, 2]);
        assert_eq!(tree.term_count(), 2);
        assert_eq!(tree.session_count(), 3);
        assert_eq!(tree.speech_count(), 4);
        let keys: Vec<_> = tree.keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn empty_sessions_are_kept() {
        let mut builder = SpeechTreeBuilder::new();
        builder.term(5).session(6, 1);
        let tree = builder.build();
        assert_eq!(tree.term_count(), 2);
        assert_eq!(tree.session_count(), 1);
        assert!(tree.is_empty());
        assert!(tree.speeches(6, 1).is_empty());
    }

    #[test]
    fn contains_checks_exact_sitting() {
        let tree: SpeechTree = [SpeechKey::new(1, 1, 10)].into_iter().collect();
        assert!(tree.contains(&SpeechKey::new(1, 1, 10)));
        assert!(!tree.contains(&SpeechKey::new(1, 2, 10)));
        assert!(!tree.contains(&SpeechKey::new(2, 1, 10)));
    }

    #[test]
    fn file_name_encodes_key() {
        assert_eq!(SpeechKey::new(42, 7, 130).file_name(), "42-7-130.xml");
    }
}
