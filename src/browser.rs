//! Collection browser
//!
//! Host-side state for the card collection page: the authoritative card
//! list, the search box, the sort dropdown and the displayed results. Store
//! failures never escape; they become notifications.

use crate::card::{CardCollection, CardId, CardRecord, ChatId, Sender};
use crate::feed::CollectionSubscription;
use crate::notify::Notifications;
use crate::search::{ResultSet, SearchIndex, SearchMode, SearchState};
use crate::sort::SortOrder;
use crate::store::{CardStore, ChatStore};
use crate::AppConfig;
use std::time::Duration;

/// What a confirmation dialog will do when accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    DeleteCard(CardId),
}

/// Pending yes/no question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub title: String,
    pub description: String,
    pub action_label: String,
    pub action: ActionKind,
}

impl ConfirmDialog {
    pub fn delete_card(id: CardId, name: &str) -> Self {
        Self {
            title: format!("Delete {}", name),
            description: format!(
                "Are you sure you want to delete {name}?\n\
                 This action will also delete corresponding chats with {name} and cannot be undone."
            ),
            action_label: "Delete".to_string(),
            action: ActionKind::DeleteCard(id),
        }
    }
}

pub struct CollectionBrowser {
    collection: CardCollection,
    index: SearchIndex,
    search: SearchState,
    mode: SearchMode,
    sort: Option<SortOrder>,
    results: ResultSet,
    results_version: u64,
    dialog: Option<ConfirmDialog>,
    notifications: Notifications,
    subscription: Option<CollectionSubscription>,
    user_id: u64,
}

impl CollectionBrowser {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            collection: CardCollection::empty(),
            index: SearchIndex::new(config.search.clone()),
            search: SearchState::default(),
            mode: config.search_mode,
            sort: config.default_sort,
            results: ResultSet::default(),
            results_version: 0,
            dialog: None,
            notifications: Notifications::new(Duration::from_millis(config.notification_ttl_ms)),
            subscription: None,
            user_id: config.user_id,
        }
    }

    /// Rebuild automatically from snapshots delivered on `subscription`
    pub fn with_subscription(mut self, subscription: CollectionSubscription) -> Self {
        self.subscription = Some(subscription);
        self
    }

    // ------------------------------------------------------------------
    // Collection
    // ------------------------------------------------------------------

    /// Fetch the card list and apply it; failures keep the current list
    pub fn sync_cards(&mut self, store: &impl CardStore) -> bool {
        match store.list_cards() {
            Ok(collection) => {
                self.apply_collection(collection);
                true
            }
            Err(e) => {
                self.notifications.error(format!("Error loading cards: {}", e));
                false
            }
        }
    }

    /// Replace the collection: rebuild the index, then recompute results
    pub fn apply_collection(&mut self, collection: CardCollection) {
        self.index.rebuild(collection.clone());
        self.collection = collection;
        self.search.needs_search = true;
        self.recompute();
    }

    /// Apply the newest snapshot from the subscription, if any arrived
    pub fn poll_updates(&mut self) -> bool {
        let latest = self.subscription.as_ref().and_then(|s| s.latest());
        match latest {
            Some(collection) => {
                self.apply_collection(collection);
                true
            }
            None => false,
        }
    }

    pub fn collection(&self) -> &CardCollection {
        &self.collection
    }

    // ------------------------------------------------------------------
    // Search and sort
    // ------------------------------------------------------------------

    /// Keystroke path: re-query immediately
    pub fn set_query(&mut self, text: &str) {
        if self.search.set_query(text) {
            self.recompute();
        }
    }

    pub fn query(&self) -> &str {
        &self.search.query
    }

    pub fn set_mode(&mut self, mode: SearchMode) {
        if self.mode != mode {
            self.mode = mode;
            self.recompute();
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn set_sort(&mut self, sort: Option<SortOrder>) {
        if self.sort != sort {
            self.sort = sort;
            self.recompute();
        }
    }

    pub fn sort(&self) -> Option<SortOrder> {
        self.sort
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// Bumped only when the displayed results actually change
    pub fn results_version(&self) -> u64 {
        self.results_version
    }

    pub fn status_line(&self) -> String {
        if self.search.is_blank() {
            format!("{} cards", self.collection.len())
        } else {
            format!("{} of {} cards", self.results.len(), self.collection.len())
        }
    }

    /// Re-run the current query; returns whether the displayed set changed
    fn recompute(&mut self) -> bool {
        let mut next = self.index.search(&self.search.query, self.mode);
        if self.search.is_blank() {
            if let Some(order) = self.sort {
                next.sort_by(|a, b| order.compare(a, b));
            }
        }
        self.search.needs_search = false;

        if next == self.results && next.generation() == self.results.generation() {
            return false;
        }
        self.results = next;
        self.results_version += 1;
        true
    }

    // ------------------------------------------------------------------
    // Delete with confirmation
    // ------------------------------------------------------------------

    /// Open the delete confirmation for a card in the collection
    pub fn request_delete(&mut self, id: CardId) -> Option<&ConfirmDialog> {
        let record = self.collection.get(id)?;
        self.dialog = Some(ConfirmDialog::delete_card(id, &record.name));
        self.dialog.as_ref()
    }

    pub fn dialog(&self) -> Option<&ConfirmDialog> {
        self.dialog.as_ref()
    }

    pub fn cancel_dialog(&mut self) {
        self.dialog = None;
    }

    /// Run the pending action; the dialog closes either way.
    /// Deleting a card also deletes the chats started from it.
    pub fn confirm_dialog(&mut self, cards: &impl CardStore, chats: &impl ChatStore) -> bool {
        let Some(dialog) = self.dialog.take() else {
            return false;
        };

        match dialog.action {
            ActionKind::DeleteCard(id) => {
                let name = self
                    .collection
                    .get(id)
                    .map(|r| r.name.clone())
                    .unwrap_or_else(|| id.to_string());
                if let Err(e) = cards.delete_card(id) {
                    self.notifications.error(format!("Error deleting {}: {}", name, e));
                    return false;
                }

                if let Err(e) = chats.delete_chats_for_card(id) {
                    tracing::warn!(card_id = %id, error = %e, "chat cascade failed");
                    self.notifications
                        .error(format!("Error deleting chats with {}: {}", name, e));
                }
                if self.sync_cards(cards) {
                    self.notifications.success(format!("Deleted {}", name));
                }
                true
            }
        }
    }

    /// Select a card in the collection for the edit page
    pub fn request_edit(&self, id: CardId) -> Option<&CardRecord> {
        self.collection.get(id)
    }

    // ------------------------------------------------------------------
    // Chats
    // ------------------------------------------------------------------

    /// Start a chat with a card and seed it with the card's greeting
    pub fn create_chat(
        &mut self,
        store: &impl ChatStore,
        card_id: CardId,
        greeting: &str,
    ) -> Option<ChatId> {
        let handle = match store.create_chat(self.user_id, card_id) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(card_id = %card_id, error = %e, "create_chat failed");
                self.notifications.error("Error creating new chat.");
                return None;
            }
        };

        if !greeting.is_empty() {
            if let Err(e) = store.insert_message(handle.chat_id, greeting, Sender::Character) {
                tracing::warn!(chat_id = %handle.chat_id, error = %e, "greeting insert failed");
                self.notifications
                    .error("Error inserting character greeting message.");
            }
        }

        Some(handle.chat_id)
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::CollectionFeed;
    use crate::notify::NotificationLevel;
    use crate::store::{MemoryCardStore, MemoryChatStore};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn store() -> MemoryCardStore {
        let t0 = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        MemoryCardStore::new(vec![
            CardRecord::new(1, "Marco").with_times(t0, t0),
            CardRecord::new(2, "Aria")
                .with_greeting("Hello, traveller.")
                .with_times(t0 + ChronoDuration::hours(1), t0),
            CardRecord::new(3, "Zed").with_times(t0 - ChronoDuration::hours(1), t0),
        ])
    }

    fn browser(store: &MemoryCardStore) -> CollectionBrowser {
        let mut b = CollectionBrowser::new(&AppConfig::default());
        assert!(b.sync_cards(store));
        b
    }

    fn names(b: &CollectionBrowser) -> Vec<String> {
        b.results().iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn results_follow_query() {
        let store = store();
        let mut b = browser(&store);
        assert_eq!(names(&b), vec!["Marco", "Aria", "Zed"]);

        b.set_query("mar");
        assert_eq!(names(&b), vec!["Marco"]);
        assert_eq!(b.status_line(), "1 of 3 cards");

        b.set_query("  ");
        assert_eq!(names(&b), vec!["Marco", "Aria", "Zed"]);
        assert_eq!(b.status_line(), "3 cards");
    }

    #[test]
    fn unchanged_results_do_not_bump_version() {
        let store = store();
        let mut b = browser(&store);
        b.set_query("ar");
        let v = b.results_version();

        b.set_query("ar ");
        assert_eq!(b.results_version(), v);

        b.set_query("zed");
        assert_eq!(b.results_version(), v + 1);
    }

    #[test]
    fn sort_applies_only_without_query() {
        let store = store();
        let mut b = browser(&store);
        b.set_sort(Some(SortOrder::Alphabetical));
        assert_eq!(names(&b), vec!["Aria", "Marco", "Zed"]);

        b.set_sort(Some(SortOrder::RecentlyAdded));
        assert_eq!(names(&b), vec!["Aria", "Marco", "Zed"]);

        b.set_query("a");
        assert_eq!(names(&b), vec!["Aria", "Marco"]);

        b.set_sort(None);
        b.set_query("");
        assert_eq!(names(&b), vec!["Marco", "Aria", "Zed"]);
    }

    #[test]
    fn substring_mode() {
        let store = store();
        let mut b = browser(&store);
        b.set_mode(SearchMode::Substring);
        b.set_query("A");
        assert_eq!(names(&b), vec!["Marco", "Aria"]);
    }

    #[test]
    fn delete_flow_refetches() {
        let store = store();
        let mut b = browser(&store);

        assert!(b.request_delete(CardId(99)).is_none());
        let dialog = b.request_delete(CardId(2)).unwrap();
        assert_eq!(dialog.title, "Delete Aria");
        assert!(dialog.description.contains("corresponding chats with Aria"));

        assert!(b.confirm_dialog(&store, &MemoryChatStore::new()));
        assert!(b.dialog().is_none());
        assert_eq!(names(&b), vec!["Marco", "Zed"]);
        assert_eq!(b.notifications().last().unwrap().level, NotificationLevel::Success);
    }

    #[test]
    fn delete_removes_the_cards_chats() {
        let store = store();
        let chats = MemoryChatStore::new();
        chats.sync_cards(&store.list_cards().unwrap());
        let mut b = browser(&store);
        b.create_chat(&chats, CardId(2), "Hello, traveller.").unwrap();
        b.create_chat(&chats, CardId(1), "").unwrap();

        b.request_delete(CardId(2));
        assert!(b.confirm_dialog(&store, &chats));
        let left = chats.list_recent_chats().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "Marco");
    }

    #[test]
    fn failed_chat_cascade_still_deletes_card() {
        let store = store();
        let chats = MemoryChatStore::new();
        let mut b = browser(&store);
        b.request_delete(CardId(3));
        chats.fail_next("chat db offline");

        assert!(b.confirm_dialog(&store, &chats));
        assert_eq!(names(&b), vec!["Marco", "Aria"]);
        let levels: Vec<_> = b.notifications().iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![NotificationLevel::Error, NotificationLevel::Success]);
    }

    #[test]
    fn no_success_toast_when_refetch_fails() {
        let store = store();
        let mut b = browser(&store);
        b.request_delete(CardId(1));
        store.fail_next_call("list_cards", "connection reset");

        assert!(b.confirm_dialog(&store, &MemoryChatStore::new()));
        assert_eq!(b.notifications().len(), 1);
        let last = b.notifications().last().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert!(last.message.starts_with("Error loading cards"));
    }

    #[test]
    fn edit_selects_known_cards_only() {
        let store = store();
        let b = browser(&store);
        assert_eq!(b.request_edit(CardId(2)).map(|r| r.name.as_str()), Some("Aria"));
        assert!(b.request_edit(CardId(42)).is_none());
    }

    #[test]
    fn cancelled_delete_does_nothing() {
        let store = store();
        let mut b = browser(&store);
        b.request_delete(CardId(1));
        b.cancel_dialog();
        assert!(!b.confirm_dialog(&store, &MemoryChatStore::new()));
        assert_eq!(b.collection().len(), 3);
    }

    #[test]
    fn failed_delete_notifies_and_keeps_cards() {
        let store = store();
        let mut b = browser(&store);
        b.request_delete(CardId(1));
        store.fail_next("database is locked");

        assert!(!b.confirm_dialog(&store, &MemoryChatStore::new()));
        assert!(b.dialog().is_none());
        assert_eq!(b.collection().len(), 3);
        let last = b.notifications().last().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert!(last.message.contains("Marco"));
    }

    #[test]
    fn failed_sync_keeps_previous_collection() {
        let store = store();
        let mut b = browser(&store);
        store.fail_next("timeout");
        assert!(!b.sync_cards(&store));
        assert_eq!(b.collection().len(), 3);
        assert_eq!(b.notifications().len(), 1);
    }

    #[test]
    fn subscription_rebuilds_index() {
        let feed = CollectionFeed::new();
        let store = store().with_feed(feed.clone());
        let mut b = browser(&store).with_subscription(feed.subscribe());
        b.set_query("aria");
        assert_eq!(names(&b), vec!["Aria"]);

        store.delete_card(CardId(2)).unwrap();
        assert!(b.poll_updates());
        assert!(b.results().is_empty());
        assert!(!b.poll_updates());
    }

    #[test]
    fn create_chat_inserts_greeting() {
        let store = store();
        let chats = MemoryChatStore::new();
        chats.sync_cards(&store.list_cards().unwrap());
        let mut b = browser(&store);

        let chat_id = b.create_chat(&chats, CardId(2), "Hello, traveller.").unwrap();
        let messages = chats.messages(chat_id).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender, Sender::Character);
        assert!(b.notifications().is_empty());
    }

    #[test]
    fn create_chat_failures() {
        let store = store();
        let chats = MemoryChatStore::new();
        chats.sync_cards(&store.list_cards().unwrap());
        let mut b = browser(&store);

        chats.fail_next("offline");
        assert!(b.create_chat(&chats, CardId(2), "Hi").is_none());
        assert_eq!(b.notifications().last().unwrap().message, "Error creating new chat.");

        // Chat opens even when the greeting cannot be stored
        chats.fail_next_call("insert_message", "disk full");
        let chat_id = b.create_chat(&chats, CardId(2), "Hi").unwrap();
        assert!(chats.messages(chat_id).unwrap().is_empty());
        assert_eq!(
            b.notifications().last().unwrap().message,
            "Error inserting character greeting message."
        );
    }
}
