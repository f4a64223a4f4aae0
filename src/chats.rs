//! Recent chats sidebar model

use crate::card::{ChatId, ChatSummary};
use crate::error::Result;
use crate::store::ChatStore;
use serde::Serialize;

/// Everything one sidebar row can show
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEntryView {
    pub id: String,
    pub name: String,
    /// Empty when the chat has no avatar
    pub avatar_uri: String,
    pub preview: String,
    pub active: bool,
}

/// Recent chats list with the currently open chat
#[derive(Debug, Default)]
pub struct RecentChats {
    entries: Vec<ChatSummary>,
    active: Option<ChatId>,
}

impl RecentChats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-fetch from the store; on failure the previous list stays
    pub fn refresh(&mut self, store: &impl ChatStore) -> Result<()> {
        match store.list_recent_chats() {
            Ok(entries) => {
                tracing::debug!(count = entries.len(), "recent chats refreshed");
                self.entries = entries;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to refresh recent chats");
                Err(e)
            }
        }
    }

    pub fn entries(&self) -> &[ChatSummary] {
        &self.entries
    }

    pub fn active(&self) -> Option<ChatId> {
        self.active
    }

    /// Select a chat in the list; unknown ids leave the selection alone
    pub fn select(&mut self, chat_id: ChatId) -> bool {
        if self.entries.iter().any(|c| c.chat_id == chat_id) {
            self.active = Some(chat_id);
            true
        } else {
            false
        }
    }

    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.active == Some(chat_id)
    }

    pub fn entry_view(&self, summary: &ChatSummary) -> ChatEntryView {
        ChatEntryView {
            id: summary.chat_id.to_string(),
            name: summary.name.clone(),
            avatar_uri: summary.avatar_uri.clone().unwrap_or_default(),
            preview: summary.last_message.clone(),
            active: self.is_active(summary.chat_id),
        }
    }

    pub fn views(&self) -> Vec<ChatEntryView> {
        self.entries.iter().map(|c| self.entry_view(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardCollection, CardId, CardRecord, Sender};
    use crate::store::MemoryChatStore;

    fn store() -> MemoryChatStore {
        let chats = MemoryChatStore::new();
        chats.sync_cards(&CardCollection::new(vec![
            CardRecord::new(1, "Aria"),
            CardRecord::new(2, "Marco"),
        ]));
        let a = chats.create_chat(1, CardId(1)).unwrap();
        chats.insert_message(a.chat_id, "Hello there", Sender::Character).unwrap();
        chats.create_chat(1, CardId(2)).unwrap();
        chats
    }

    #[test]
    fn refresh_and_select() {
        let store = store();
        let mut recent = RecentChats::new();
        recent.refresh(&store).unwrap();

        assert_eq!(recent.entries().len(), 2);
        assert!(recent.select(ChatId(1)));
        assert!(!recent.select(ChatId(42)));
        assert_eq!(recent.active(), Some(ChatId(1)));

        let views = recent.views();
        assert_eq!(views[0].name, "Marco");
        assert!(!views[0].active);
        assert_eq!(views[1].preview, "Hello there");
        assert!(views[1].active);
        assert_eq!(views[1].avatar_uri, "");
    }

    #[test]
    fn failed_refresh_keeps_previous_list() {
        let store = store();
        let mut recent = RecentChats::new();
        recent.refresh(&store).unwrap();

        store.fail_next("offline");
        assert!(recent.refresh(&store).is_err());
        assert_eq!(recent.entries().len(), 2);
    }
}
