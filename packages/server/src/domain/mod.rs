//! Domain layer: chat entities, wire events, and repository interfaces.

pub mod event;
pub mod model;
pub mod repository;

pub use event::{ClientEvent, ServerEvent};
pub use model::{ChatMessage, ContentKind, Conversation, ConversationKind};
pub use repository::{ConversationRepository, MessageRepository, RepositoryError};
