//! Collection search
//!
//! - Fuzzy index over card display names, rebuilt on every collection change
//! - Substring fallback for when the fuzzy path is not ready or not wanted
//! - Search-as-you-type input state

pub mod config;
pub mod fuzzy;
pub mod index;

pub use config::{SearchConfig, SearchMode};
pub use fuzzy::{FuzzyMatch, FuzzyMatcher, PreparedName};
pub use index::{ResultSet, SearchHit, SearchIndex, SharedSearchIndex};

/// Search input state
#[derive(Debug, Default, Clone)]
pub struct SearchState {
    /// Current search query
    pub query: String,
    /// Whether results are stale relative to `query`
    pub needs_search: bool,
}

impl SearchState {
    /// Replace the query text; returns true when it actually changed
    pub fn set_query(&mut self, text: &str) -> bool {
        if self.query == text {
            return false;
        }
        self.query.clear();
        self.query.push_str(text);
        self.needs_search = true;
        true
    }

    /// Blank queries show the whole collection
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}
