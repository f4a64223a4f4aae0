//! Collection Search Index
//!
//! A derived, disposable index over the current [`CardCollection`]. It is
//! replaced wholesale on every rebuild and never patched in place.

use super::config::{SearchConfig, SearchMode};
use super::fuzzy::{FuzzyMatch, FuzzyMatcher, PreparedName};
use crate::card::{CardCollection, CardId, CardRecord};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::sync::Arc;

// ============================================================================
// Result Set
// ============================================================================

/// Ordered view into a collection snapshot
///
/// Holds positions into the snapshot it was computed from, so it can only
/// ever contain records of that snapshot. Equality compares record ids in
/// order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    collection: Option<CardCollection>,
    positions: Vec<usize>,
}

impl ResultSet {
    fn new(collection: &CardCollection, positions: Vec<usize>) -> Self {
        Self {
            collection: Some(collection.clone()),
            positions,
        }
    }

    fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Generation of the source collection, 0 when none was indexed
    pub fn generation(&self) -> u64 {
        self.collection.as_ref().map_or(0, |c| c.generation())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CardRecord> + '_ {
        let records = self.collection.as_ref().map_or(&[][..], |c| c.records());
        self.positions.iter().map(move |&i| &records[i])
    }

    pub fn get(&self, index: usize) -> Option<&CardRecord> {
        let pos = *self.positions.get(index)?;
        self.collection.as_ref()?.records().get(pos)
    }

    pub fn ids(&self) -> Vec<CardId> {
        self.iter().map(|r| r.id).collect()
    }

    pub fn to_vec(&self) -> Vec<CardRecord> {
        self.iter().cloned().collect()
    }

    /// Reorder in place; the comparator sees records, not positions
    pub(crate) fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&CardRecord, &CardRecord) -> std::cmp::Ordering,
    {
        if let Some(collection) = &self.collection {
            let records = collection.records();
            self.positions
                .sort_by(|&a, &b| compare(&records[a], &records[b]));
        }
    }
}

impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.id == b.id)
    }
}

/// A ranked hit with its score
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub record: &'a CardRecord,
    pub score: f64,
    pub errors: usize,
}

// ============================================================================
// Search Index
// ============================================================================

/// Fuzzy index keyed on display names
#[derive(Debug, Default)]
pub struct SearchIndex {
    collection: Option<CardCollection>,
    names: Vec<PreparedName>,
    config: SearchConfig,
}

impl SearchIndex {
    /// An index with nothing built yet; queries behave as on an empty collection
    pub fn new(config: SearchConfig) -> Self {
        Self {
            collection: None,
            names: Vec::new(),
            config,
        }
    }

    /// Build straight from a collection
    pub fn build(collection: CardCollection, config: SearchConfig) -> Self {
        let mut index = Self::new(config);
        index.rebuild(collection);
        index
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Discard the current index and key a new one on `collection`
    pub fn rebuild(&mut self, collection: CardCollection) {
        let names: Vec<PreparedName> = if collection.len() >= self.config.parallel_threshold {
            collection
                .records()
                .par_iter()
                .map(|r| PreparedName::new(&r.name))
                .collect()
        } else {
            collection.iter().map(|r| PreparedName::new(&r.name)).collect()
        };

        tracing::debug!(
            generation = collection.generation(),
            records = collection.len(),
            "search index rebuilt"
        );

        self.names = names;
        self.collection = Some(collection);
    }

    /// Whether any collection has been indexed
    pub fn is_ready(&self) -> bool {
        self.collection.is_some()
    }

    /// Generation of the indexed collection, 0 before the first rebuild
    pub fn generation(&self) -> u64 {
        self.collection.as_ref().map_or(0, |c| c.generation())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn collection(&self) -> Option<&CardCollection> {
        self.collection.as_ref()
    }

    /// Everything, in collection order
    fn all(&self) -> ResultSet {
        match &self.collection {
            Some(c) => ResultSet::new(c, (0..c.len()).collect()),
            None => ResultSet::empty(),
        }
    }

    /// Ranked fuzzy query; blank text returns the whole collection
    pub fn query(&self, text: &str) -> ResultSet {
        let text = text.trim();
        let Some(collection) = &self.collection else {
            return ResultSet::empty();
        };
        if text.is_empty() {
            return self.all();
        }

        let ranked = self.rank(text);
        tracing::trace!(query = text, hits = ranked.len(), "fuzzy query");
        ResultSet::new(collection, ranked.into_iter().map(|(i, _)| i).collect())
    }

    /// Ranked hits with scores, best first
    pub fn query_scored(&self, text: &str) -> Vec<SearchHit<'_>> {
        let text = text.trim();
        let Some(collection) = &self.collection else {
            return Vec::new();
        };
        if text.is_empty() {
            return collection
                .iter()
                .map(|record| SearchHit {
                    record,
                    score: 0.0,
                    errors: 0,
                })
                .collect();
        }

        self.rank(text)
            .into_iter()
            .map(|(i, m)| SearchHit {
                record: &collection[i],
                score: m.score,
                errors: m.errors,
            })
            .collect()
    }

    /// Degraded mode: case-insensitive containment, collection order
    pub fn query_substring(&self, text: &str) -> ResultSet {
        let text = text.trim();
        let Some(collection) = &self.collection else {
            return ResultSet::empty();
        };
        if text.is_empty() {
            return self.all();
        }

        let needle = text.to_lowercase();
        let positions = self
            .names
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_str().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        ResultSet::new(collection, positions)
    }

    /// Query with the given mode; fuzzy falls back to substring when not ready
    pub fn search(&self, text: &str, mode: SearchMode) -> ResultSet {
        match mode {
            SearchMode::Fuzzy if self.is_ready() => self.query(text),
            _ => self.query_substring(text),
        }
    }

    /// (position, match) sorted by score, then collection order
    fn rank(&self, text: &str) -> Vec<(usize, FuzzyMatch)> {
        let matcher = FuzzyMatcher::new(text, &self.config);

        let mut hits: Vec<(usize, FuzzyMatch)> = if self.names.len() >= self.config.parallel_threshold {
            self.names
                .par_iter()
                .enumerate()
                .filter_map(|(i, name)| matcher.score(name).map(|m| (i, m)))
                .collect()
        } else {
            self.names
                .iter()
                .enumerate()
                .filter_map(|(i, name)| matcher.score(name).map(|m| (i, m)))
                .collect()
        };

        // Equal scores: closer name length first, then collection order
        let pattern_len = matcher.pattern().chars().count();
        hits.sort_by(|a, b| {
            a.1.score.total_cmp(&b.1.score).then_with(|| {
                let la = self.names[a.0].char_len().abs_diff(pattern_len);
                let lb = self.names[b.0].char_len().abs_diff(pattern_len);
                la.cmp(&lb)
            })
        });
        hits
    }
}

// ============================================================================
// Shared handle
// ============================================================================

/// Thread-safe handle: rebuilds take the write lock, so a query always sees
/// the most recently completed rebuild
#[derive(Debug, Clone, Default)]
pub struct SharedSearchIndex {
    inner: Arc<RwLock<SearchIndex>>,
}

impl SharedSearchIndex {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SearchIndex::new(config))),
        }
    }

    pub fn rebuild(&self, collection: CardCollection) {
        self.inner.write().rebuild(collection);
    }

    pub fn query(&self, text: &str) -> ResultSet {
        self.inner.read().query(text)
    }

    pub fn search(&self, text: &str, mode: SearchMode) -> ResultSet {
        self.inner.read().search(text, mode)
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation()
    }
}
