//! Shared application state.

use std::sync::Arc;

use tsunagu_shared::time::Clock;

use crate::domain::{ConversationRepository, MessageRepository};
use crate::hub::{HubHandle, router::EventRouter};

/// Everything the handlers need, injected at startup. No ambient
/// singletons: tests build independent states with isolated hubs.
pub struct AppState {
    /// Handle to the connection hub worker
    pub hub: HubHandle,
    /// Router for inbound WebSocket events
    pub router: Arc<EventRouter>,
    /// `messages` collection access
    pub messages: Arc<dyn MessageRepository>,
    /// `conversations` collection access
    pub conversations: Arc<dyn ConversationRepository>,
    /// Clock for server-assigned timestamps
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire a fresh state: spawns a hub worker and builds the event router
    /// on top of the given stores.
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        conversations: Arc<dyn ConversationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let hub = HubHandle::spawn();
        let router = Arc::new(EventRouter::new(
            hub.clone(),
            messages.clone(),
            conversations.clone(),
            clock.clone(),
        ));
        Self {
            hub,
            router,
            messages,
            conversations,
            clock,
        }
    }
}
