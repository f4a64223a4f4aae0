//! Card and chat records
//!
//! Cards are character personas shown in the collection browser. A
//! [`CardCollection`] is an immutable snapshot of the whole list; replacing the
//! list always means building a new snapshot with a fresh generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generation 0 is reserved for "nothing supplied yet".
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn now() -> DateTime<Utc> {
    Utc::now()
}

// ============================================================================
// Identifiers
// ============================================================================

/// Stable card identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable chat identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub u64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Card Record
// ============================================================================

/// Persona payload carried with a card. Not interpreted by search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardData {
    pub description: String,
    pub personality: String,
    /// First message the character sends in a new chat
    pub greeting: String,
    pub tags: Vec<String>,
    pub creator_notes: String,
}

/// A card bundle in the collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: CardId,
    /// Display name, the only search key
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub data: CardData,
    /// When the card entered the collection
    #[serde(default = "now")]
    pub added_at: DateTime<Utc>,
    /// Last modification of the card itself
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

impl CardRecord {
    /// Create a record with empty persona data, stamped now
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        let stamp = Utc::now();
        Self {
            id: CardId(id),
            name: name.into(),
            avatar: None,
            data: CardData::default(),
            added_at: stamp,
            updated_at: stamp,
        }
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.data.greeting = greeting.into();
        self
    }

    pub fn with_times(mut self, added_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.added_at = added_at;
        self.updated_at = updated_at;
        self
    }
}

/// Input for creating a card through a store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCard {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub data: CardData,
}

// ============================================================================
// Card Collection
// ============================================================================

/// Immutable, cheaply clonable snapshot of the card list
///
/// Identity is the generation: every constructed collection gets a new one,
/// clones share it.
#[derive(Debug, Clone)]
pub struct CardCollection {
    records: Arc<[CardRecord]>,
    generation: u64,
}

impl CardCollection {
    pub fn new(records: Vec<CardRecord>) -> Self {
        Self {
            records: records.into(),
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Same snapshot (not merely equal contents)
    pub fn same_as(&self, other: &CardCollection) -> bool {
        self.generation == other.generation
    }

    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    pub fn get(&self, id: CardId) -> Option<&CardRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

impl Default for CardCollection {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for CardCollection {
    type Target = [CardRecord];

    fn deref(&self) -> &[CardRecord] {
        &self.records
    }
}

impl From<Vec<CardRecord>> for CardCollection {
    fn from(records: Vec<CardRecord>) -> Self {
        Self::new(records)
    }
}

// ============================================================================
// Chats
// ============================================================================

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Character,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Character => "character",
        }
    }
}

/// One row of the recent chats sidebar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat_id: ChatId,
    pub name: String,
    #[serde(default)]
    pub avatar_uri: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

/// Returned by a successful chat creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatHandle {
    pub chat_id: ChatId,
    pub card_id: CardId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_collection_gets_a_fresh_generation() {
        let a = CardCollection::new(vec![CardRecord::new(1, "Aria")]);
        let b = CardCollection::new(vec![CardRecord::new(1, "Aria")]);
        let a2 = a.clone();

        assert_ne!(a.generation(), 0);
        assert!(!a.same_as(&b));
        assert!(a.same_as(&a2));
        assert_eq!(a.records(), b.records());
    }

    #[test]
    fn lookup_by_id() {
        let c = CardCollection::new(vec![CardRecord::new(1, "Aria"), CardRecord::new(2, "Marco")]);
        assert_eq!(c.get(CardId(2)).map(|r| r.name.as_str()), Some("Marco"));
        assert!(c.get(CardId(9)).is_none());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn card_json_defaults() {
        let card: CardRecord = serde_json::from_str(r#"{"id": 4, "name": "Nyx"}"#).unwrap();
        assert_eq!(card.id, CardId(4));
        assert!(card.avatar.is_none());
        assert!(card.data.greeting.is_empty());
    }
}
