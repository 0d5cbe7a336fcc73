//! tsunagu messaging hub.
//!
//! Tracks live WebSocket connections of the chat feature and relays chat
//! events (new message, typing indicator, read receipt) between the
//! connected users, while recording messages and conversation metadata.

// layers
pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
