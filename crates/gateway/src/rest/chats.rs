//! Chat endpoints: notes, tags and single-chat reads

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use frontdesk_database::{Chat, Note, Ticket};

use crate::error::GatewayResult;
use crate::middleware::Actor;
use crate::rest::ErrorResponse;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub workspace_id: String,
    pub chat_id: String,
    pub ticket_id: Option<String>,
    /// `chat_note` or `ticket_note`
    #[serde(rename = "type", alias = "source")]
    pub message_type: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTagsRequest {
    pub workspace_id: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub note_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub ticket_id: String,
    pub status: String,
    pub notes: Vec<NoteResponse>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub chat_id: String,
    pub workspace_id: String,
    pub source_client_id: String,
    pub assignee_user_id: Option<String>,
    pub team_id: Option<String>,
    pub source: String,
    pub tags: Vec<String>,
    pub notes: Vec<NoteResponse>,
    pub tickets: Vec<TicketResponse>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub ticket_id: Option<String>,
    pub chat_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: String,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            note_id: note.note_id,
            user_id: note.user_id,
            text: note.text,
            created_at: note.created_at,
        }
    }
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_id: ticket.ticket_id,
            status: ticket.status.as_str().to_string(),
            notes: ticket.notes.into_iter().map(Into::into).collect(),
            created_at: ticket.created_at,
        }
    }
}

impl From<Chat> for ChatResponse {
    fn from(chat: Chat) -> Self {
        Self {
            chat_id: chat.chat_id,
            workspace_id: chat.workspace_id,
            source_client_id: chat.source_client_id,
            assignee_user_id: chat.assignee_user_id,
            team_id: chat.team_id,
            source: chat.source,
            tags: chat.tags.into_iter().collect(),
            notes: chat.notes.into_iter().map(Into::into).collect(),
            tickets: chat.tickets.into_iter().map(Into::into).collect(),
            created_at: chat.created_at,
        }
    }
}

pub fn create_chat_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/messenger/message", post(create_note))
        .route("/api/messenger/chats/:chat_id/tags", put(update_tags))
        .route(
            "/api/messenger/workspaces/:workspace_id/chats/:chat_id",
            get(get_chat),
        )
}

#[utoipa::path(
    post,
    path = "/api/messenger/message",
    tag = "chats",
    request_body = CreateNoteRequest,
    responses(
        (status = 200, description = "Note stored and broadcast", body = EventResponse),
        (status = 400, description = "Unknown note type or empty text", body = ErrorResponse),
        (status = 403, description = "Not a member of the workspace", body = ErrorResponse),
        (status = 404, description = "Chat or ticket not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_note(
    State(state): State<Arc<GatewayState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateNoteRequest>,
) -> GatewayResult<Json<EventResponse>> {
    let event = state
        .notes
        .handle_message(
            &actor.0,
            &request.workspace_id,
            &request.chat_id,
            request.ticket_id.as_deref(),
            &request.message_type,
            &request.message,
        )
        .await?;

    state.notifier.broadcast(&request.workspace_id, &event).await;

    Ok(Json(EventResponse {
        kind: event.kind.as_str().to_string(),
        ticket_id: event.ticket_id,
        chat_id: event.chat_id,
        message: event.message,
        created_at: event.created_at,
    }))
}

#[utoipa::path(
    put,
    path = "/api/messenger/chats/{chat_id}/tags",
    tag = "chats",
    params(("chat_id" = String, Path, description = "Chat identifier")),
    request_body = UpdateTagsRequest,
    responses(
        (status = 200, description = "Tags replaced", body = ChatResponse),
        (status = 403, description = "Not a member of the workspace", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_tags(
    State(state): State<Arc<GatewayState>>,
    Extension(actor): Extension<Actor>,
    Path(chat_id): Path<String>,
    Json(request): Json<UpdateTagsRequest>,
) -> GatewayResult<Json<ChatResponse>> {
    let chat = state
        .notes
        .update_chat_tags(&actor.0, &request.workspace_id, &chat_id, &request.tags)
        .await?;
    Ok(Json(chat.into()))
}

#[utoipa::path(
    get,
    path = "/api/messenger/workspaces/{workspace_id}/chats/{chat_id}",
    tag = "chats",
    params(
        ("workspace_id" = String, Path, description = "Workspace identifier"),
        ("chat_id" = String, Path, description = "Chat identifier")
    ),
    responses(
        (status = 200, description = "Chat with tickets and notes", body = ChatResponse),
        (status = 403, description = "Not a member of the workspace", body = ErrorResponse),
        (status = 404, description = "Chat not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_chat(
    State(state): State<Arc<GatewayState>>,
    Extension(actor): Extension<Actor>,
    Path((workspace_id, chat_id)): Path<(String, String)>,
) -> GatewayResult<Json<ChatResponse>> {
    let chat = state.notes.get_chat(&actor.0, &workspace_id, &chat_id).await?;
    Ok(Json(chat.into()))
}
