//! Collection change notifications
//!
//! Stores publish a fresh [`CardCollection`] snapshot after each mutation;
//! anything that derives state from the collection subscribes and picks up
//! the newest snapshot when it next polls.

use crate::card::CardCollection;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Fan-out publisher of collection snapshots
#[derive(Debug, Clone, Default)]
pub struct CollectionFeed {
    subscribers: Arc<Mutex<Vec<Sender<CardCollection>>>>,
}

impl CollectionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> CollectionSubscription {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        CollectionSubscription { receiver: rx }
    }

    /// Send to every live subscriber, dropping the ones that went away
    pub fn publish(&self, collection: CardCollection) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(collection.clone()).is_ok());
        tracing::trace!(
            generation = collection.generation(),
            subscribers = subscribers.len(),
            "collection published"
        );
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Receiving end of a [`CollectionFeed`]
#[derive(Debug)]
pub struct CollectionSubscription {
    receiver: Receiver<CardCollection>,
}

impl CollectionSubscription {
    /// Drain pending snapshots and return the newest one
    pub fn latest(&self) -> Option<CardCollection> {
        let mut newest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(collection) => newest = Some(collection),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        newest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardRecord;

    #[test]
    fn latest_wins() {
        let feed = CollectionFeed::new();
        let sub = feed.subscribe();
        assert!(sub.latest().is_none());

        feed.publish(CardCollection::new(vec![CardRecord::new(1, "Aria")]));
        let last = CardCollection::new(vec![CardRecord::new(2, "Marco")]);
        let generation = last.generation();
        feed.publish(last);

        assert_eq!(sub.latest().map(|c| c.generation()), Some(generation));
        assert!(sub.latest().is_none());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let feed = CollectionFeed::new();
        let keep = feed.subscribe();
        drop(feed.subscribe());
        assert_eq!(feed.subscriber_count(), 2);

        feed.publish(CardCollection::empty());
        assert_eq!(feed.subscriber_count(), 1);
        assert!(keep.latest().is_some());
    }
}
