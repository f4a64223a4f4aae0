//! Approximate name matching
//!
//! Finds the best alignment of the query inside a name: the window with the
//! fewest edits (Levenshtein, via `strsim`), earliest on ties. The score mixes
//! the edit ratio with how far the window sits from the expected location.
//! Queries longer than `max_pattern_len` are scored by their prefix, but a
//! name is only accepted when the whole query also fits the edit budget.

use super::config::SearchConfig;

/// A lower-cased name prepared for window scoring
#[derive(Debug, Clone)]
pub struct PreparedName {
    lower: String,
    /// Byte offset of every char boundary, including the end
    bounds: Vec<usize>,
}

impl PreparedName {
    pub fn new(name: &str) -> Self {
        let lower = name.to_lowercase();
        let mut bounds: Vec<usize> = lower.char_indices().map(|(i, _)| i).collect();
        bounds.push(lower.len());
        Self { lower, bounds }
    }

    pub fn as_str(&self) -> &str {
        &self.lower
    }

    /// Length in chars
    pub fn char_len(&self) -> usize {
        self.bounds.len() - 1
    }

    fn window(&self, start: usize, len: usize) -> &str {
        &self.lower[self.bounds[start]..self.bounds[start + len]]
    }

    fn char_index_of_byte(&self, byte: usize) -> usize {
        self.bounds.binary_search(&byte).unwrap_or_else(|i| i)
    }
}

/// Outcome of scoring one name
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch {
    /// 0.0 is a perfect hit at the expected location
    pub score: f64,
    /// Edits needed to turn the best window into the query
    pub errors: usize,
    /// Char index of the best window
    pub start: usize,
}

/// Scores names against one query
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    pattern: String,
    pattern_len: usize,
    max_errors: usize,
    /// Whole lower-cased query, set only when `pattern` is a truncated prefix
    full: Option<(String, usize, usize)>,
    trimmed: String,
    threshold: f64,
    location: usize,
    distance: usize,
    ignore_location: bool,
}

impl FuzzyMatcher {
    /// `query` should already be trimmed and non-empty
    pub fn new(query: &str, config: &SearchConfig) -> Self {
        let lower = query.to_lowercase();
        let lower_len = lower.chars().count();
        let pattern: String = lower.chars().take(config.max_pattern_len.max(1)).collect();
        let pattern_len = pattern.chars().count();
        let max_errors = allowed_errors(config.threshold, pattern_len);
        let full = (pattern_len < lower_len)
            .then(|| (lower.clone(), lower_len, allowed_errors(config.threshold, lower_len)));

        Self {
            pattern,
            pattern_len,
            max_errors,
            full,
            trimmed: lower.trim().to_string(),
            threshold: config.threshold,
            location: config.location,
            distance: config.distance,
            ignore_location: config.ignore_location,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn max_errors(&self) -> usize {
        self.max_errors
    }

    /// Score a name, `None` when it does not match
    pub fn score(&self, name: &PreparedName) -> Option<FuzzyMatch> {
        if self.pattern_len == 0 {
            return None;
        }

        // Surrounding whitespace in a display name never costs an exact match
        if name.as_str().trim() == self.trimmed {
            return Some(FuzzyMatch {
                score: 0.0,
                errors: 0,
                start: 0,
            });
        }

        let (errors, start) = match name.as_str().find(&self.pattern) {
            Some(byte) => (0, name.char_index_of_byte(byte)),
            None => best_window(name, &self.pattern, self.pattern_len, self.max_errors)?,
        };

        let score = self.compute_score(errors, start);
        if errors <= self.max_errors && score <= self.threshold && self.accepts_full(name) {
            Some(FuzzyMatch {
                score,
                errors,
                start,
            })
        } else {
            None
        }
    }

    /// A truncated prefix only decides ranking; the whole query must still fit
    fn accepts_full(&self, name: &PreparedName) -> bool {
        match &self.full {
            None => true,
            Some((full, len, k)) => {
                name.as_str().contains(full.as_str()) || best_window(name, full, *len, *k).is_some()
            }
        }
    }

    fn compute_score(&self, errors: usize, start: usize) -> f64 {
        let accuracy = errors as f64 / self.pattern_len as f64;
        if self.ignore_location {
            return accuracy;
        }

        let proximity = start.abs_diff(self.location);
        if self.distance == 0 {
            return if proximity == 0 { accuracy } else { 1.0 };
        }
        accuracy + proximity as f64 / self.distance as f64
    }
}

// Small epsilon so 0.3 * 10 does not land just under 3
fn allowed_errors(threshold: f64, len: usize) -> usize {
    (threshold * len as f64 + 1e-9).floor().max(0.0) as usize
}

/// Minimum edit distance of `pattern` over windows of length `m-k ..= m+k`,
/// with the window's start. Callers rule out exact windows first.
fn best_window(
    name: &PreparedName,
    pattern: &str,
    pattern_len: usize,
    k: usize,
) -> Option<(usize, usize)> {
    if k == 0 {
        return None;
    }

    let n = name.char_len();
    let min_len = pattern_len.saturating_sub(k).max(1);
    let max_len = pattern_len + k;
    let mut best: Option<(usize, usize)> = None;

    for start in 0..n {
        for len in min_len..=max_len {
            if start + len > n {
                break;
            }
            let d = strsim::levenshtein(name.window(start, len), pattern);
            if d <= k && best.map_or(true, |(e, _)| d < e) {
                best = Some((d, start));
            }
        }
        if matches!(best, Some((1, _))) {
            break;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(query: &str) -> FuzzyMatcher {
        FuzzyMatcher::new(query, &SearchConfig::default())
    }

    #[test]
    fn exact_name_scores_zero() {
        let m = matcher("Aria").score(&PreparedName::new("ARIA")).unwrap();
        assert_eq!(m.score, 0.0);
        assert_eq!(m.errors, 0);
    }

    #[test]
    fn substring_hit_is_positioned() {
        let m = matcher("mar").score(&PreparedName::new("Marco")).unwrap();
        assert_eq!((m.errors, m.start), (0, 0));

        let m = matcher("arc").score(&PreparedName::new("Marco")).unwrap();
        assert_eq!((m.errors, m.start), (0, 1));
        assert!((m.score - 0.01).abs() < 1e-9);
    }

    #[test]
    fn short_queries_allow_no_edits() {
        // floor(0.3 * 3) == 0
        assert_eq!(matcher("mrc").max_errors(), 0);
        assert!(matcher("mrc").score(&PreparedName::new("Marco")).is_none());
    }

    #[test]
    fn single_typo_on_longer_query() {
        let m = matcher("selene").max_errors();
        assert_eq!(m, 1);
        let hit = matcher("selnne").score(&PreparedName::new("Selene")).unwrap();
        assert_eq!(hit.errors, 1);
        assert!(hit.score <= 0.3);
    }

    #[test]
    fn transposition_costs_two_edits() {
        // Levenshtein counts a swap as two substitutions
        assert!(matcher("mraco").score(&PreparedName::new("Marco")).is_none());
        assert!(matcher("mracopolo").score(&PreparedName::new("Marcopolo")).is_some());
    }

    #[test]
    fn far_away_match_exceeds_threshold() {
        let name = format!("{}luna", "x".repeat(40));
        assert!(matcher("luna").score(&PreparedName::new(&name)).is_none());

        let config = SearchConfig {
            ignore_location: true,
            ..SearchConfig::default()
        };
        assert!(FuzzyMatcher::new("luna", &config)
            .score(&PreparedName::new(&name))
            .is_some());
    }

    #[test]
    fn long_queries_are_truncated() {
        let config = SearchConfig {
            max_pattern_len: 4,
            ..SearchConfig::default()
        };
        let m = FuzzyMatcher::new("Arianna the Bold", &config);
        assert_eq!(m.pattern(), "aria");
        assert!(m.score(&PreparedName::new("Arianna the Bold")).is_some());
        assert!(m.score(&PreparedName::new("Arianna the Bald")).is_some());
        // The prefix alone is not enough
        assert!(m.score(&PreparedName::new("Arianna")).is_none());
    }

    #[test]
    fn prefix_match_of_long_query_needs_whole_query() {
        let name = "a".repeat(32);
        let query = format!("{}{}", name, "zqxjvkwpfgbhmyt".repeat(3));
        assert!(query.chars().count() > 32);
        assert!(matcher(&query).score(&PreparedName::new(&name)).is_none());

        // One typo in a 40-char query is still within budget
        let long = format!("{}selene", "aria the wanderer of the northern reach ");
        let typo = long.replacen("wanderer", "wandrer", 1);
        assert!(matcher(&typo).score(&PreparedName::new(&long)).is_some());
    }

    #[test]
    fn padded_exact_name_scores_zero() {
        let name = format!("{}Aria", " ".repeat(31));
        let m = matcher("aria").score(&PreparedName::new(&name)).unwrap();
        assert_eq!(m.score, 0.0);
        assert!(matcher("aria").score(&PreparedName::new("Aria   ")).is_some());
    }

    #[test]
    fn multibyte_names_slice_on_char_boundaries() {
        let name = PreparedName::new("Émilie Zoë");
        assert_eq!(name.char_len(), 10);
        let hit = matcher("zoe").score(&name);
        assert!(hit.is_none());
        let hit = matcher("émilie zoe").score(&name).unwrap();
        assert_eq!(hit.errors, 1);
    }
}
