//! Cardshelf - character card collection engine
//!
//! The state behind a chat-with-character-cards desktop app: the card
//! collection browser and the recent chats sidebar.
//!
//! # Features
//!
//! - **Search as you type**: fuzzy index over card names, rebuilt whenever the
//!   collection changes, with a substring fallback
//! - **Sorting**: recently added, alphabetical, newest, oldest
//! - **Store contracts**: cards and chats behind traits, with in-memory stores
//! - **Change feed**: collection snapshots pushed to subscribers
//!
//! # Example
//!
//! ```
//! use cardshelf::{AppConfig, CardRecord, CollectionBrowser, MemoryCardStore};
//!
//! let store = MemoryCardStore::new(vec![
//!     CardRecord::new(1, "Aria"),
//!     CardRecord::new(2, "Marco"),
//! ]);
//!
//! let mut browser = CollectionBrowser::new(&AppConfig::default());
//! browser.sync_cards(&store);
//! browser.set_query("mar");
//!
//! let names: Vec<_> = browser.results().iter().map(|c| c.name.as_str()).collect();
//! assert_eq!(names, ["Marco"]);
//! ```

pub mod browser;
pub mod card;
pub mod chats;
pub mod error;
pub mod feed;
pub mod logging;
pub mod notify;
pub mod search;
pub mod sort;
pub mod store;

// Re-export main types
pub use browser::{ActionKind, CollectionBrowser, ConfirmDialog};
pub use card::{
    CardCollection, CardData, CardId, CardRecord, ChatHandle, ChatId, ChatSummary, NewCard,
    Sender,
};
pub use chats::{ChatEntryView, RecentChats};
pub use error::{CardShelfError, Result};
pub use feed::{CollectionFeed, CollectionSubscription};
pub use notify::{Notification, NotificationLevel, Notifications};
pub use search::{ResultSet, SearchConfig, SearchIndex, SearchMode, SharedSearchIndex};
pub use sort::SortOrder;
pub use store::{CardStore, ChatStore, MemoryCardStore, MemoryChatStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format a timestamp for listings
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fuzzy matcher tuning
    pub search: SearchConfig,
    /// Matcher used for the search box
    pub search_mode: SearchMode,
    /// Sort applied to the unfiltered view
    pub default_sort: Option<SortOrder>,
    /// How long notifications stay visible
    pub notification_ttl_ms: u64,
    /// User that owns newly created chats
    pub user_id: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            search_mode: SearchMode::Fuzzy,
            default_sort: None,
            notification_ttl_ms: 4000,
            user_id: 1,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
