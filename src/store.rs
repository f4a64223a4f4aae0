//! Card and chat store contracts
//!
//! The browser only ever talks to stores through these traits; every call
//! returns a tagged [`Result`] and never panics across the boundary. The
//! in-memory implementations back the CLI and the tests.

use crate::card::{
    CardCollection, CardId, CardRecord, ChatHandle, ChatId, ChatSummary, NewCard, Sender,
};
use crate::error::{CardShelfError, Result};
use crate::feed::CollectionFeed;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Authoritative card list and its mutations
pub trait CardStore {
    fn list_cards(&self) -> Result<CardCollection>;
    fn delete_card(&self, id: CardId) -> Result<()>;
    fn create_card(&self, card: NewCard) -> Result<CardRecord>;
}

/// Recent chats and chat/message mutations
pub trait ChatStore {
    fn list_recent_chats(&self) -> Result<Vec<ChatSummary>>;
    fn create_chat(&self, user_id: u64, card_id: CardId) -> Result<ChatHandle>;
    fn insert_message(&self, chat_id: ChatId, text: &str, sender: Sender) -> Result<()>;
    /// Remove every chat started from `card_id`; returns how many went
    fn delete_chats_for_card(&self, card_id: CardId) -> Result<usize>;
}

/// One-shot failure injection shared by the memory stores
#[derive(Debug, Default)]
struct FailSwitch(Mutex<Option<(Option<String>, String)>>);

impl FailSwitch {
    /// `op` of `None` fails whichever call comes next
    fn arm(&self, op: Option<&str>, message: impl Into<String>) {
        *self.0.lock() = Some((op.map(str::to_string), message.into()));
    }

    fn check(&self, op: &str) -> Result<()> {
        let mut armed = self.0.lock();
        let hit = match armed.as_ref() {
            Some((None, _)) => true,
            Some((Some(target), _)) => target == op,
            None => false,
        };
        let fired = if hit { armed.take() } else { None };
        match fired {
            Some((_, message)) => Err(CardShelfError::store(op, message)),
            None => Ok(()),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

// ============================================================================
// Memory Card Store
// ============================================================================

#[derive(Debug, Default)]
struct CardState {
    records: Vec<CardRecord>,
    next_id: u64,
}

/// In-process card store
#[derive(Debug)]
pub struct MemoryCardStore {
    state: RwLock<CardState>,
    feed: Option<CollectionFeed>,
    fail: FailSwitch,
}

impl MemoryCardStore {
    pub fn new(records: Vec<CardRecord>) -> Self {
        let next_id = records.iter().map(|r| r.id.0).max().unwrap_or(0) + 1;
        Self {
            state: RwLock::new(CardState { records, next_id }),
            feed: None,
            fail: FailSwitch::default(),
        }
    }

    /// Load a JSON array of cards
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let records: Vec<CardRecord> = read_json(path.as_ref())?;
        Ok(Self::new(records))
    }

    /// Publish a snapshot to `feed` after every successful mutation
    pub fn with_feed(mut self, feed: CollectionFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Make the next store call fail with `message`
    pub fn fail_next(&self, message: impl Into<String>) {
        self.fail.arm(None, message);
    }

    /// Make the next call to the operation named `op` fail with `message`
    pub fn fail_next_call(&self, op: &str, message: impl Into<String>) {
        self.fail.arm(Some(op), message);
    }

    fn publish(&self, state: &CardState) {
        if let Some(feed) = &self.feed {
            feed.publish(CardCollection::new(state.records.clone()));
        }
    }
}

impl Default for MemoryCardStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CardStore for MemoryCardStore {
    fn list_cards(&self) -> Result<CardCollection> {
        self.fail.check("list_cards")?;
        Ok(CardCollection::new(self.state.read().records.clone()))
    }

    fn delete_card(&self, id: CardId) -> Result<()> {
        self.fail.check("delete_card")?;
        let mut state = self.state.write();
        let pos = state
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or(CardShelfError::CardNotFound(id))?;
        let removed = state.records.remove(pos);
        tracing::info!(card_id = %id, name = %removed.name, "card deleted");
        self.publish(&state);
        Ok(())
    }

    fn create_card(&self, card: NewCard) -> Result<CardRecord> {
        self.fail.check("create_card")?;
        if card.name.trim().is_empty() {
            return Err(CardShelfError::InvalidArgument("card name is empty".into()));
        }

        let mut state = self.state.write();
        let stamp = Utc::now();
        let record = CardRecord {
            id: CardId(state.next_id),
            name: card.name,
            avatar: card.avatar,
            data: card.data,
            added_at: stamp,
            updated_at: stamp,
        };
        state.next_id += 1;
        state.records.push(record.clone());
        tracing::info!(card_id = %record.id, name = %record.name, "card created");
        self.publish(&state);
        Ok(record)
    }
}

// ============================================================================
// Memory Chat Store
// ============================================================================

/// A message as kept by the memory chat store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMessage {
    pub text: String,
    pub sender: Sender,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredChat {
    chat_id: ChatId,
    card_id: Option<CardId>,
    name: String,
    avatar_uri: Option<String>,
    messages: Vec<StoredMessage>,
    updated_at: DateTime<Utc>,
    /// Monotonic touch counter; orders chats touched within the same instant
    touched: u64,
}

#[derive(Debug, Default)]
struct ChatState {
    chats: Vec<StoredChat>,
    cards: HashMap<CardId, (String, Option<String>)>,
    next_chat_id: u64,
    clock: u64,
}

impl ChatState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// In-process chat store
#[derive(Debug)]
pub struct MemoryChatStore {
    state: RwLock<ChatState>,
    fail: FailSwitch,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ChatState {
                next_chat_id: 1,
                ..Default::default()
            }),
            fail: FailSwitch::default(),
        }
    }

    /// Seed from existing summaries; the preview becomes the only message
    pub fn from_summaries(summaries: Vec<ChatSummary>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write();
            // Oldest first so the touch counter mirrors `updated_at`
            let mut summaries = summaries;
            summaries.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
            for summary in summaries {
                let touched = state.tick();
                let messages = if summary.last_message.is_empty() {
                    Vec::new()
                } else {
                    vec![StoredMessage {
                        text: summary.last_message,
                        sender: Sender::Character,
                        sent_at: summary.updated_at,
                    }]
                };
                state.next_chat_id = state.next_chat_id.max(summary.chat_id.0 + 1);
                state.chats.push(StoredChat {
                    chat_id: summary.chat_id,
                    card_id: None,
                    name: summary.name,
                    avatar_uri: summary.avatar_uri,
                    messages,
                    updated_at: summary.updated_at,
                    touched,
                });
            }
        }
        store
    }

    /// Load a JSON array of chat summaries
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let summaries: Vec<ChatSummary> = read_json(path.as_ref())?;
        Ok(Self::from_summaries(summaries))
    }

    /// Make the chat store aware of the cards chats can be started with
    pub fn sync_cards(&self, cards: &CardCollection) {
        let mut state = self.state.write();
        state.cards = cards
            .iter()
            .map(|r| (r.id, (r.name.clone(), r.avatar.clone())))
            .collect();
    }

    pub fn messages(&self, chat_id: ChatId) -> Result<Vec<StoredMessage>> {
        self.state
            .read()
            .chats
            .iter()
            .find(|c| c.chat_id == chat_id)
            .map(|c| c.messages.clone())
            .ok_or(CardShelfError::ChatNotFound(chat_id))
    }

    /// Make the next store call fail with `message`
    pub fn fail_next(&self, message: impl Into<String>) {
        self.fail.arm(None, message);
    }

    /// Make the next call to the operation named `op` fail with `message`
    pub fn fail_next_call(&self, op: &str, message: impl Into<String>) {
        self.fail.arm(Some(op), message);
    }
}

impl Default for MemoryChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStore for MemoryChatStore {
    fn list_recent_chats(&self) -> Result<Vec<ChatSummary>> {
        self.fail.check("list_recent_chats")?;
        let state = self.state.read();
        let mut chats: Vec<&StoredChat> = state.chats.iter().collect();
        chats.sort_by(|a, b| b.touched.cmp(&a.touched));

        Ok(chats
            .into_iter()
            .map(|c| ChatSummary {
                chat_id: c.chat_id,
                name: c.name.clone(),
                avatar_uri: c.avatar_uri.clone(),
                last_message: c.messages.last().map(|m| m.text.clone()).unwrap_or_default(),
                updated_at: c.updated_at,
            })
            .collect())
    }

    fn create_chat(&self, user_id: u64, card_id: CardId) -> Result<ChatHandle> {
        self.fail.check("create_chat")?;
        let mut state = self.state.write();
        let (name, avatar_uri) = state
            .cards
            .get(&card_id)
            .cloned()
            .ok_or(CardShelfError::CardNotFound(card_id))?;

        let chat_id = ChatId(state.next_chat_id);
        state.next_chat_id += 1;
        let touched = state.tick();
        state.chats.push(StoredChat {
            chat_id,
            card_id: Some(card_id),
            name,
            avatar_uri,
            messages: Vec::new(),
            updated_at: Utc::now(),
            touched,
        });

        tracing::info!(chat_id = %chat_id, card_id = %card_id, user_id, "chat created");
        Ok(ChatHandle { chat_id, card_id })
    }

    fn insert_message(&self, chat_id: ChatId, text: &str, sender: Sender) -> Result<()> {
        self.fail.check("insert_message")?;
        let mut state = self.state.write();
        let touched = state.tick();
        let chat = state
            .chats
            .iter_mut()
            .find(|c| c.chat_id == chat_id)
            .ok_or(CardShelfError::ChatNotFound(chat_id))?;

        let now = Utc::now();
        chat.messages.push(StoredMessage {
            text: text.to_string(),
            sender,
            sent_at: now,
        });
        chat.updated_at = now;
        chat.touched = touched;
        tracing::debug!(chat_id = %chat_id, sender = sender.as_str(), "message inserted");
        Ok(())
    }

    fn delete_chats_for_card(&self, card_id: CardId) -> Result<usize> {
        self.fail.check("delete_chats_for_card")?;
        let mut state = self.state.write();
        let before = state.chats.len();
        state.chats.retain(|c| c.card_id != Some(card_id));
        state.cards.remove(&card_id);
        let removed = before - state.chats.len();
        tracing::info!(card_id = %card_id, removed, "chats deleted with card");
        Ok(removed)
    }
}
