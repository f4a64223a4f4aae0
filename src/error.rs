//! Error types for Cardshelf
//!
//! All fallibility lives at the store boundary; searching never fails.

use crate::card::{CardId, ChatId};
use thiserror::Error;

/// Main error type for Cardshelf operations
#[derive(Error, Debug)]
pub enum CardShelfError {
    #[error("Card {0} not found")]
    CardNotFound(CardId),

    #[error("Chat {0} not found")]
    ChatNotFound(ChatId),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Cardshelf operations
pub type Result<T> = std::result::Result<T, CardShelfError>;

impl CardShelfError {
    /// Create a store error with context
    pub fn store(context: &str, detail: impl std::fmt::Display) -> Self {
        CardShelfError::Store(format!("{}: {}", context, detail))
    }

    /// Check if this error is recoverable (surface it as a notification and carry on)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CardShelfError::CardNotFound(_)
                | CardShelfError::ChatNotFound(_)
                | CardShelfError::Store(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_recoverable() {
        assert!(CardShelfError::store("list_cards", "connection reset").is_recoverable());
        assert!(CardShelfError::CardNotFound(CardId(7)).is_recoverable());
        assert!(!CardShelfError::InvalidArgument("x".into()).is_recoverable());
    }

    #[test]
    fn display_includes_context() {
        let err = CardShelfError::store("delete_card", "locked");
        assert_eq!(err.to_string(), "Store error: delete_card: locked");
        assert_eq!(CardShelfError::ChatNotFound(ChatId(3)).to_string(), "Chat 3 not found");
    }
}
