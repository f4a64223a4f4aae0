//! Search tuning knobs

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fuzzy matcher configuration
///
/// Scores run from 0.0 (perfect) upwards; a record matches when its score is
/// at most `threshold` and its edit count is within `floor(threshold * len)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum accepted score
    pub threshold: f64,
    /// Expected match position (in characters) within a name
    pub location: usize,
    /// How far from `location` a match may sit before the position alone
    /// costs a full score point
    pub distance: usize,
    /// Score on edits only, not on match position
    pub ignore_location: bool,
    /// Longer queries are truncated to this many characters for scoring
    pub max_pattern_len: usize,
    /// Collections at least this large are scored on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            location: 0,
            distance: 100,
            ignore_location: false,
            max_pattern_len: 32,
            parallel_threshold: 2048,
        }
    }
}

/// Which matcher answers queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Ranked approximate matching
    #[default]
    Fuzzy,
    /// Case-insensitive containment, collection order
    Substring,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Fuzzy => "fuzzy",
            SearchMode::Substring => "substring",
        }
    }
}

impl FromStr for SearchMode {
    type Err = crate::CardShelfError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fuzzy" => Ok(SearchMode::Fuzzy),
            "substring" => Ok(SearchMode::Substring),
            other => Err(crate::CardShelfError::InvalidArgument(format!(
                "unknown search mode '{}'",
                other
            ))),
        }
    }
}
