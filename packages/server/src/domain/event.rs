//! Wire events exchanged over a chat WebSocket.
//!
//! Both directions are closed tagged unions discriminated by a `type`
//! field. Inbound frames carry an explicit `Unknown` fallback so that tags
//! this server does not understand are a safe no-op instead of an error
//! (forward compatibility with newer clients).

use serde::{Deserialize, Serialize};

use super::model::ChatMessage;

/// An event received from a connected client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEvent {
    /// A new chat message for a conversation.
    #[serde(rename_all = "camelCase")]
    Message {
        room_id: String,
        sender_name: String,
        #[serde(default)]
        sender_avatar: String,
        content: String,
    },
    /// Ephemeral typing indicator; never persisted.
    #[serde(rename_all = "camelCase")]
    Typing {
        room_id: String,
        user_name: String,
        is_typing: bool,
    },
    /// Ephemeral read receipt; never persisted.
    #[serde(rename_all = "camelCase")]
    Read { room_id: String, message_id: String },
    /// Any tag this server does not recognize.
    #[serde(other)]
    Unknown,
}

/// An event pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    Message {
        message: ChatMessage,
    },
    #[serde(rename_all = "camelCase")]
    Typing {
        room_id: String,
        user_id: String,
        user_name: String,
        is_typing: bool,
    },
    #[serde(rename_all = "camelCase")]
    Read {
        room_id: String,
        user_id: String,
        message_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ContentKind;

    #[test]
    fn test_decode_message_event() {
        let json = r#"{
            "type": "message",
            "roomId": "c1",
            "senderName": "Alice",
            "senderAvatar": "a.png",
            "content": "hi"
        }"#;

        let event: ClientEvent = serde_json::from_str(json).unwrap();

        assert_eq!(
            event,
            ClientEvent::Message {
                room_id: "c1".to_string(),
                sender_name: "Alice".to_string(),
                sender_avatar: "a.png".to_string(),
                content: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_message_event_without_avatar() {
        let json = r#"{"type":"message","roomId":"c1","senderName":"Alice","content":"hi"}"#;

        let event: ClientEvent = serde_json::from_str(json).unwrap();

        match event {
            ClientEvent::Message { sender_avatar, .. } => assert_eq!(sender_avatar, ""),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_typing_event() {
        let json = r#"{"type":"typing","roomId":"c1","userName":"Alice","isTyping":true}"#;

        let event: ClientEvent = serde_json::from_str(json).unwrap();

        assert_eq!(
            event,
            ClientEvent::Typing {
                room_id: "c1".to_string(),
                user_name: "Alice".to_string(),
                is_typing: true,
            }
        );
    }

    #[test]
    fn test_decode_read_event() {
        let json = r#"{"type":"read","roomId":"c1","messageId":"m1"}"#;

        let event: ClientEvent = serde_json::from_str(json).unwrap();

        assert_eq!(
            event,
            ClientEvent::Read {
                room_id: "c1".to_string(),
                message_id: "m1".to_string(),
            }
        );
    }

    #[test]
    fn test_unrecognized_tag_decodes_as_unknown() {
        let json = r#"{"type":"bogus","whatever":123}"#;

        let event: ClientEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event, ClientEvent::Unknown);
    }

    #[test]
    fn test_recognized_tag_with_missing_fields_is_an_error() {
        // A known tag with a broken payload must surface as a decode error,
        // not silently fall through to Unknown.
        let json = r#"{"type":"typing","roomId":"c1"}"#;

        let result = serde_json::from_str::<ClientEvent>(json);

        assert!(result.is_err());
    }

    #[test]
    fn test_encode_typing_server_event() {
        let event = ServerEvent::Typing {
            room_id: "c1".to_string(),
            user_id: "u1".to_string(),
            user_name: "Alice".to_string(),
            is_typing: true,
        };

        let json: serde_json::Value =
            serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "typing");
        assert_eq!(json["roomId"], "c1");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["isTyping"], true);
    }

    #[test]
    fn test_encode_message_server_event_embeds_message() {
        let event = ServerEvent::Message {
            message: ChatMessage {
                id: "m1".to_string(),
                room_id: "c1".to_string(),
                sender_id: "u1".to_string(),
                sender_name: "Alice".to_string(),
                sender_avatar: String::new(),
                content: "hi".to_string(),
                kind: ContentKind::Text,
                timestamp: 42,
            },
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "message");
        assert_eq!(json["message"]["content"], "hi");
        assert_eq!(json["message"]["roomId"], "c1");
    }
}
