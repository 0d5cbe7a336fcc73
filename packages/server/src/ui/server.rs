//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    handler::{
        create_conversation, get_conversations, get_messages, get_presence, health_check,
        post_message, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the service router over the given state.
///
/// Split out of [`Server::run`] so integration tests can serve the exact
/// production routes on an ephemeral port.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket endpoint
        .route("/ws", get(websocket_handler))
        // HTTP endpoints
        .route("/api/health", get(health_check))
        .route("/api/presence", get(get_presence))
        .route(
            "/api/conversations",
            get(get_conversations).post(create_conversation),
        )
        .route(
            "/api/conversations/{id}/messages",
            get(get_messages).post(post_message),
        )
        .with_state(state)
        // The chat frontend is served from another origin.
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// The messaging hub server.
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance over fully wired application state.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Run the server until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the listen address fails or the server
    /// errors while running.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = app(self.state);

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("messaging hub listening on {}", listener.local_addr()?);
        tracing::info!("connect to: ws://{}/ws?userId=<id>", bind_addr);
        tracing::info!("press Ctrl+C to shut down gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("server shutdown complete");

        Ok(())
    }
}
