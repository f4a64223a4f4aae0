//! Collection sort orders

use crate::card::CardRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Ordering applied to the unfiltered collection view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Most recently added to the collection first
    RecentlyAdded,
    /// Display name, case-insensitive
    Alphabetical,
    /// Most recently updated first
    Newest,
    /// Least recently updated first
    Oldest,
}

impl SortOrder {
    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::RecentlyAdded => "Recently Added",
            SortOrder::Alphabetical => "Alphabetical",
            SortOrder::Newest => "Newest",
            SortOrder::Oldest => "Oldest",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::RecentlyAdded => "recently-added",
            SortOrder::Alphabetical => "alphabetical",
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }

    pub fn all() -> &'static [SortOrder] {
        &[
            SortOrder::RecentlyAdded,
            SortOrder::Alphabetical,
            SortOrder::Newest,
            SortOrder::Oldest,
        ]
    }

    /// Comparator for a stable sort
    pub fn compare(&self, a: &CardRecord, b: &CardRecord) -> Ordering {
        match self {
            SortOrder::RecentlyAdded => b.added_at.cmp(&a.added_at),
            SortOrder::Alphabetical => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortOrder::Newest => b.updated_at.cmp(&a.updated_at),
            SortOrder::Oldest => a.updated_at.cmp(&b.updated_at),
        }
    }

    pub fn sort(&self, records: &mut [CardRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

impl FromStr for SortOrder {
    type Err = crate::CardShelfError;

    fn from_str(s: &str) -> crate::Result<Self> {
        SortOrder::all()
            .iter()
            .copied()
            .find(|o| o.as_str().eq_ignore_ascii_case(s) || o.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::CardShelfError::InvalidArgument(format!("unknown sort order '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn cards() -> Vec<CardRecord> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        vec![
            CardRecord::new(1, "marco").with_times(t0, t0 + Duration::days(5)),
            CardRecord::new(2, "Aria").with_times(t0 + Duration::days(2), t0 + Duration::days(1)),
            CardRecord::new(3, "Zed").with_times(t0 + Duration::days(1), t0 + Duration::days(9)),
            CardRecord::new(4, "aria").with_times(t0 + Duration::days(2), t0 + Duration::days(1)),
        ]
    }

    fn sorted_ids(order: SortOrder) -> Vec<u64> {
        let mut records = cards();
        order.sort(&mut records);
        records.iter().map(|r| r.id.0).collect()
    }

    #[test]
    fn comparators() {
        assert_eq!(sorted_ids(SortOrder::RecentlyAdded), vec![2, 4, 3, 1]);
        assert_eq!(sorted_ids(SortOrder::Alphabetical), vec![2, 4, 1, 3]);
        assert_eq!(sorted_ids(SortOrder::Newest), vec![3, 1, 2, 4]);
        assert_eq!(sorted_ids(SortOrder::Oldest), vec![2, 4, 1, 3]);
    }

    #[test]
    fn parse_names_and_labels() {
        assert_eq!("recently-added".parse::<SortOrder>().unwrap(), SortOrder::RecentlyAdded);
        assert_eq!("Alphabetical".parse::<SortOrder>().unwrap(), SortOrder::Alphabetical);
        assert_eq!("recently added".parse::<SortOrder>().unwrap(), SortOrder::RecentlyAdded);
        assert!("shuffle".parse::<SortOrder>().is_err());
    }
}
