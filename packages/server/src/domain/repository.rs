//! Repository traits for the persistence collaborator.
//!
//! The document store itself is external to this service; the domain layer
//! defines the interfaces it needs and the infrastructure layer provides
//! the implementations (dependency inversion, so use cases and the event
//! router can be tested against in-memory or mock stores).

use async_trait::async_trait;
use thiserror::Error;

use super::model::{ChatMessage, Conversation};

/// Errors surfaced by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The requested entity does not exist.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// The underlying store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Access to the `messages` collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message.
    async fn insert(&self, message: ChatMessage) -> Result<(), RepositoryError>;

    /// Fetch the most recent messages of a conversation, newest first,
    /// capped at `limit`.
    async fn find_by_conversation(
        &self,
        room_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;
}

/// Access to the `conversations` collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Persist a new conversation.
    async fn insert(&self, conversation: Conversation) -> Result<(), RepositoryError>;

    /// Look up one conversation by id.
    async fn find_by_id(&self, id: &str) -> Result<Conversation, RepositoryError>;

    /// All conversations the given user participates in.
    async fn find_by_participant(
        &self,
        user_id: &str,
    ) -> Result<Vec<Conversation>, RepositoryError>;

    /// Find a conversation with exactly the given participant set, and the
    /// given originating task when one is supplied. Used to deduplicate
    /// conversation creation.
    async fn find_by_members(
        &self,
        participants: &[String],
        task_id: Option<String>,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// Refresh the denormalized last-message snapshot and `updated_at`.
    async fn update_last_message(
        &self,
        room_id: &str,
        message: ChatMessage,
        updated_at: i64,
    ) -> Result<(), RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Every trait method must stay mockable; signatures with anonymous
    // lifetimes in type parameters break the generated mocks.
    #[tokio::test]
    async fn test_conversation_repository_is_mockable() {
        let mut conversations = MockConversationRepository::new();
        conversations
            .expect_find_by_members()
            .withf(|participants, task_id| {
                participants == ["u1".to_string(), "u2".to_string()]
                    && task_id == &Some("t1".to_string())
            })
            .returning(|_, _| Ok(None));

        let result = conversations
            .find_by_members(
                &["u1".to_string(), "u2".to_string()],
                Some("t1".to_string()),
            )
            .await;

        assert_eq!(result, Ok(None));
    }

    #[tokio::test]
    async fn test_message_repository_is_mockable() {
        let mut messages = MockMessageRepository::new();
        messages
            .expect_find_by_conversation()
            .returning(|_, _| Ok(vec![]));

        let result = messages.find_by_conversation("c1", 50).await;

        assert_eq!(result, Ok(vec![]));
    }
}
