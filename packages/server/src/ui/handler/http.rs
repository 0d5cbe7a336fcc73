//! HTTP API endpoint handlers: conversation and message CRUD, presence,
//! health.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ChatMessage, ContentKind, Conversation, ConversationKind};
use crate::ui::state::AppState;

/// Page size for message history.
const MESSAGE_PAGE_LIMIT: usize = 50;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Currently connected users, as the hub sees them.
#[derive(Debug, Serialize)]
pub struct PresenceDto {
    pub online: Vec<String>,
}

/// `GET /api/presence`
pub async fn get_presence(State(state): State<Arc<AppState>>) -> Json<PresenceDto> {
    Json(PresenceDto {
        online: state.hub.online_users().await,
    })
}

#[derive(Debug, Deserialize)]
pub struct ConversationsQuery {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

/// `GET /api/conversations?userId=<id>`: conversations the user
/// participates in, most recently active first.
pub async fn get_conversations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConversationsQuery>,
) -> Result<Json<Vec<Conversation>>, StatusCode> {
    let user_id = match query.user_id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => return Err(StatusCode::BAD_REQUEST),
    };

    match state.conversations.find_by_participant(&user_id).await {
        Ok(conversations) => Ok(Json(conversations)),
        Err(e) => {
            tracing::error!("failed to fetch conversations for '{}': {}", user_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Body of `POST /api/conversations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[serde(rename = "type", default)]
    pub kind: ConversationKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub task_id: Option<String>,
}

/// `POST /api/conversations`: create a conversation, deduplicating on the
/// exact participant set (and originating task when given). Returns the id
/// of the existing or newly created conversation.
pub async fn create_conversation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<String>), StatusCode> {
    if request.participants.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let existing = state
        .conversations
        .find_by_members(&request.participants, request.task_id.clone())
        .await
        .map_err(|e| {
            tracing::error!("failed to look up existing conversation: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    if let Some(conversation) = existing {
        return Ok((StatusCode::OK, Json(conversation.id)));
    }

    let now = state.clock.now_epoch_secs();
    let conversation = Conversation {
        id: Uuid::new_v4().to_string(),
        kind: request.kind,
        name: request.name,
        avatar: request.avatar,
        participants: request.participants,
        task_id: request.task_id,
        last_message: None,
        created_at: now,
        updated_at: now,
    };
    let id = conversation.id.clone();

    state.conversations.insert(conversation).await.map_err(|e| {
        tracing::error!("failed to create conversation: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(id)))
}

/// `GET /api/conversations/{id}/messages`: the last page of messages in
/// chronological order (stored newest first, reversed for display).
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<ChatMessage>>, StatusCode> {
    match state
        .messages
        .find_by_conversation(&room_id, MESSAGE_PAGE_LIMIT)
        .await
    {
        Ok(mut messages) => {
            messages.reverse();
            Ok(Json(messages))
        }
        Err(e) => {
            tracing::error!("failed to fetch messages of '{}': {}", room_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Body of `POST /api/conversations/{id}/messages`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub sender_avatar: String,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: ContentKind,
}

/// `POST /api/conversations/{id}/messages`: store a message through the
/// REST surface (no fan-out) and echo the stored entity.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<PostMessageRequest>,
) -> Result<Json<ChatMessage>, StatusCode> {
    let message = ChatMessage {
        id: Uuid::new_v4().to_string(),
        room_id,
        sender_id: request.sender_id,
        sender_name: request.sender_name,
        sender_avatar: request.sender_avatar,
        content: request.content,
        kind: request.kind,
        timestamp: state.clock.now_epoch_secs(),
    };

    state.messages.insert(message.clone()).await.map_err(|e| {
        tracing::error!("failed to save message in '{}': {}", message.room_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // Snapshot refresh is best effort, as on the WebSocket path.
    if let Err(e) = state
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

    Ok(Json(message))
}
