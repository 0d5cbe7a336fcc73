//! In-memory repository implementations.
//!
//! Stand-ins for the external document store, suitable for tests and
//! single-process deployments. A driver-backed store slots in behind the
//! same traits.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, Conversation, ConversationRepository, MessageRepository, RepositoryError,
};

/// In-memory `messages` collection.
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored messages (test helper).
    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: ChatMessage) -> Result<(), RepositoryError> {
        let mut messages = self.messages.lock().await;
        messages.push(message);
        Ok(())
    }

    async fn find_by_conversation(
        &self,
        room_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let messages = self.messages.lock().await;
        let mut found: Vec<ChatMessage> = messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();
        // Newest first, capped, matching the store query the REST layer
        // issues against the real collection.
        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        found.truncate(limit);
        Ok(found)
    }
}

/// In-memory `conversations` collection.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: Mutex<HashMap<String, Conversation>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn insert(&self, conversation: Conversation) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.lock().await;
        conversations.insert(conversation.id.clone(), conversation);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Conversation, RepositoryError> {
        let conversations = self.conversations.lock().await;
        conversations
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
    }

    async fn find_by_participant(
        &self,
        user_id: &str,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let conversations = self.conversations.lock().await;
        let mut found: Vec<Conversation> = conversations
            .values()
            .filter(|c| c.participants.iter().any(|p| p == user_id))
            .cloned()
            .collect();
        // Most recently active first.
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn find_by_members(
        &self,
        participants: &[String],
        task_id: Option<String>,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.lock().await;
        let found = conversations
            .values()
            .find(|c| {
                same_member_set(&c.participants, participants)
                    && match &task_id {
                        Some(task) => c.task_id.as_ref() == Some(task),
                        None => true,
                    }
            })
            .cloned();
        Ok(found)
    }

    async fn update_last_message(
        &self,
        room_id: &str,
        message: ChatMessage,
        updated_at: i64,
    ) -> Result<(), RepositoryError> {
        let mut conversations = self.conversations.lock().await;
        let conversation = conversations
            .get_mut(room_id)
            .ok_or_else(|| RepositoryError::NotFound(room_id.to_string()))?;
        conversation.last_message = Some(message);
        conversation.updated_at = updated_at;
        Ok(())
    }
}

/// Order-insensitive participant-set equality.
fn same_member_set(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted: Vec<&String> = a.iter().collect();
    let mut b_sorted: Vec<&String> = b.iter().collect();
    a_sorted.sort();
    b_sorted.sort();
    a_sorted == b_sorted
}
