//! Endpoint handlers.

pub mod http;
pub mod websocket;

pub use http::{
    create_conversation, get_conversations, get_messages, get_presence, health_check,
    post_message,
};
pub use websocket::websocket_handler;
