//! Transient user-facing notifications

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created: Instant,
}

/// Toast queue; entries expire after `ttl`
#[derive(Debug)]
pub struct Notifications {
    queue: VecDeque<Notification>,
    ttl: Duration,
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(Duration::from_millis(4000))
    }
}

impl Notifications {
    pub fn new(ttl: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();
        if level == NotificationLevel::Error {
            tracing::warn!(%message, "error notification");
        }
        self.queue.push_back(Notification {
            level,
            message,
            created: Instant::now(),
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message);
    }

    /// Notifications still visible at `now`
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Notification> + '_ {
        let ttl = self.ttl;
        self.queue
            .iter()
            .filter(move |n| now.saturating_duration_since(n.created) < ttl)
    }

    /// Drop expired notifications
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.queue
            .retain(|n| now.saturating_duration_since(n.created) < ttl);
    }

    /// Take everything, expired or not
    pub fn drain(&mut self) -> Vec<Notification> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn last(&self) -> Option<&Notification> {
        self.queue.back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Notification> + '_ {
        self.queue.iter()
    }
}
