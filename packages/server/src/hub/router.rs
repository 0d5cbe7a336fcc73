//! Inbound event routing: decode, optionally persist, fan out.

use std::sync::Arc;

use tsunagu_shared::time::Clock;

use crate::domain::{
    ChatMessage, ClientEvent, ConversationRepository, MessageRepository, ServerEvent,
};

use super::HubHandle;

/// Routes decoded client events to their behavior: `message` persists and
/// fans out, `typing` and `read` fan out only.
///
/// One router instance is shared by all connections; everything it needs
/// is injected, so tests can wire it to an isolated hub and mock stores.
pub struct EventRouter {
    hub: HubHandle,
    messages: Arc<dyn MessageRepository>,
    conversations: Arc<dyn ConversationRepository>,
    clock: Arc<dyn Clock>,
}

impl EventRouter {
    pub fn new(
        hub: HubHandle,
        messages: Arc<dyn MessageRepository>,
        conversations: Arc<dyn ConversationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            hub,
            messages,
            conversations,
            clock,
        }
    }

    /// Handle one raw text frame from the connection owned by `sender_id`.
    ///
    /// Never fails: malformed frames and unknown tags are logged and
    /// dropped so a misbehaving client cannot take its own pump down,
    /// let alone anyone else's.
    pub async fn dispatch(&self, sender_id: &str, text: &str) {
        let event = match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("dropping undecodable frame from '{}': {}", sender_id, e);
                return;
            }
        };

        match event {
            ClientEvent::Message {
                room_id,
                sender_name,
                sender_avatar,
                content,
            } => {
                self.handle_message(sender_id, room_id, sender_name, sender_avatar, content)
                    .await;
            }
            ClientEvent::Typing {
                room_id,
                user_name,
                is_typing,
            } => {
                self.fan_out(
                    ServerEvent::Typing {
                        room_id,
                        user_id: sender_id.to_string(),
                        user_name,
                        is_typing,
                    },
                    sender_id,
                );
            }
            ClientEvent::Read {
                room_id,
                message_id,
            } => {
                self.fan_out(
                    ServerEvent::Read {
                        room_id,
                        user_id: sender_id.to_string(),
                        message_id,
                    },
                    sender_id,
                );
            }
            ClientEvent::Unknown => {
                tracing::debug!("ignoring unrecognized event type from '{}'", sender_id);
            }
        }
    }

    async fn handle_message(
        &self,
        sender_id: &str,
        room_id: String,
        sender_name: String,
        sender_avatar: String,
        content: String,
    ) {
        let message = ChatMessage::new_text(
            room_id,
            sender_id.to_string(),
            sender_name,
            sender_avatar,
            content,
            self.clock.now_epoch_secs(),
        );

        // The insert is the source of truth: without it there is nothing
        // to deliver, so a failure suppresses the broadcast.
        if let Err(e) = self.messages.insert(message.clone()).await {
            tracing::error!(
                "failed to save message in room '{}' from '{}': {}",
                message.room_id,
                sender_id,
                e
            );
            return;
        }

        // The snapshot is derived data; losing one update only leaves the
        // conversation list stale, so the broadcast still goes out.
        if let Err(e) = self
            .conversations
            .update_last_message(&message.room_id, message.clone(), message.timestamp)
            .await
        {
            tracing::warn!(
                "failed to update last message of conversation '{}': {}",
                message.room_id,
                e
            );
        }

        self.fan_out(ServerEvent::Message { message }, sender_id);
    }

    fn fan_out(&self, event: ServerEvent, sender_id: &str) {
        match serde_json::to_string(&event) {
            Ok(frame) => self.hub.broadcast(frame, sender_id),
            Err(e) => tracing::error!("failed to encode outbound frame: {}", e),
        }
    }
}
