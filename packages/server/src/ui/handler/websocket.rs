//! WebSocket upgrade endpoint.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::hub::{
    Connection,
    connection::{read_pump, write_pump},
};
use crate::ui::state::AppState;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Opaque user identifier, trusted as given. Identity issuance lives
    /// in a separate service; this hub performs no further authentication.
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

/// `GET /ws?userId=<id>`: upgrade to a chat WebSocket session.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id = match query.user_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => {
            tracing::warn!("rejecting websocket upgrade without userId");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user_id: String) {
    let (sender, receiver) = socket.split();

    let (connection, frame_rx) = Connection::new(user_id.clone());
    let connection_id = connection.id;
    state.hub.register(connection);
    tracing::info!("user '{}' connected as {}", user_id, connection_id);

    let mut recv_task = tokio::spawn(read_pump(
        receiver,
        connection_id,
        user_id.clone(),
        state.router.clone(),
        state.hub.clone(),
    ));
    let mut send_task = tokio::spawn(write_pump(sender, frame_rx));

    // If one pump exits, tear the other down.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // The read pump already unregisters on its way out; this covers the
    // write-pump-first exits and is a no-op otherwise.
    state.hub.unregister(connection_id);
    tracing::info!("user '{}' disconnected ({})", user_id, connection_id);
}
