//! Persisted chat entities.
//!
//! Field names serialize in camelCase to match the wire format the chat
//! frontend already speaks (`roomId`, `senderId`, ...). Timestamps are UTC
//! Unix epoch seconds.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content kind of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Text,
    Image,
    File,
}

/// One chat message. Immutable once created; the server assigns `id` and
/// `timestamp`, the sender supplies the display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_avatar: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub timestamp: i64,
}

impl ChatMessage {
    /// Build a new text message with a server-assigned id.
    pub fn new_text(
        room_id: String,
        sender_id: String,
        sender_name: String,
        sender_avatar: String,
        content: String,
        timestamp: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_id,
            sender_id,
            sender_name,
            sender_avatar,
            content,
            kind: ContentKind::Text,
            timestamp,
        }
    }
}

/// Kind of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    #[default]
    Direct,
    Group,
}

/// A conversation (chat room) between a fixed set of participants.
///
/// `last_message` is a denormalized snapshot refreshed on every new message
/// so conversation lists can render without a second query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub last_message: Option<ChatMessage>,
    pub created_at: i64,
    pub updated_at: i64,
}
