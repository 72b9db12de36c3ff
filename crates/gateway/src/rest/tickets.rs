//! Ticket routing and status endpoints

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use frontdesk_tickets::{EventKind, InboxEvent, ReassignmentOutcome, StatusChange};

use crate::error::GatewayResult;
use crate::middleware::Actor;
use crate::rest::ErrorResponse;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReassignToTeamRequest {
    pub ticket_id: String,
    pub workspace_id: String,
    pub team_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReassignToUserRequest {
    pub ticket_id: String,
    pub workspace_id: String,
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub ticket_id: String,
    pub workspace_id: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReassignmentResponse {
    pub ticket_id: String,
    pub workspace_id: String,
    pub source_chat_id: String,
    pub source_chat_deleted: bool,
    pub destination_chat_id: String,
    pub destination_created: bool,
    pub assignee_user_id: String,
    pub team_id: Option<String>,
}

impl From<ReassignmentOutcome> for ReassignmentResponse {
    fn from(outcome: ReassignmentOutcome) -> Self {
        Self {
            ticket_id: outcome.ticket_id,
            workspace_id: outcome.workspace_id,
            source_chat_id: outcome.source_chat_id,
            source_chat_deleted: outcome.source_chat_deleted,
            destination_chat_id: outcome.destination_chat_id,
            destination_created: outcome.destination_created,
            assignee_user_id: outcome.assignee_user_id,
            team_id: outcome.team_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub ticket_id: String,
    pub chat_id: String,
    pub previous: String,
    pub status: String,
}

impl From<StatusChange> for StatusResponse {
    fn from(change: StatusChange) -> Self {
        Self {
            ticket_id: change.ticket_id,
            chat_id: change.chat_id,
            previous: change.previous.as_str().to_string(),
            status: change.status.as_str().to_string(),
        }
    }
}

pub fn create_ticket_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/messenger/ticket/reassign/team", post(reassign_to_team))
        .route("/api/messenger/ticket/reassign/user", post(reassign_to_user))
        .route("/api/messenger/ticket/status", post(update_status))
}

#[utoipa::path(
    post,
    path = "/api/messenger/ticket/reassign/team",
    tag = "tickets",
    request_body = ReassignToTeamRequest,
    responses(
        (status = 200, description = "Ticket moved to the least busy team member", body = ReassignmentResponse),
        (status = 403, description = "Not a member of the workspace", body = ErrorResponse),
        (status = 404, description = "Ticket, workspace or team not found", body = ErrorResponse),
        (status = 409, description = "Concurrent change, retry", body = ErrorResponse),
        (status = 422, description = "No team member can take the ticket", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn reassign_to_team(
    State(state): State<Arc<GatewayState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<ReassignToTeamRequest>,
) -> GatewayResult<Json<ReassignmentResponse>> {
    let outcome = state
        .reassignment
        .reassign_to_team(&actor.0, &request.ticket_id, &request.workspace_id, &request.team_name)
        .await?;

    announce_reassignment(&state, &outcome).await;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/api/messenger/ticket/reassign/user",
    tag = "tickets",
    request_body = ReassignToUserRequest,
    responses(
        (status = 200, description = "Ticket moved to the user", body = ReassignmentResponse),
        (status = 403, description = "Not a member of the workspace", body = ErrorResponse),
        (status = 404, description = "Ticket, workspace or user not found", body = ErrorResponse),
        (status = 409, description = "Concurrent change, retry", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn reassign_to_user(
    State(state): State<Arc<GatewayState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<ReassignToUserRequest>,
) -> GatewayResult<Json<ReassignmentResponse>> {
    let outcome = state
        .reassignment
        .reassign_to_user(&actor.0, &request.ticket_id, &request.workspace_id, &request.email)
        .await?;

    announce_reassignment(&state, &outcome).await;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    post,
    path = "/api/messenger/ticket/status",
    tag = "tickets",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status stored", body = StatusResponse),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Not a member of the workspace", body = ErrorResponse),
        (status = 404, description = "Ticket or workspace not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_status(
    State(state): State<Arc<GatewayState>>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<UpdateStatusRequest>,
) -> GatewayResult<Json<StatusResponse>> {
    let change = state
        .status
        .update_status(&actor.0, &request.ticket_id, &request.workspace_id, &request.status)
        .await?;

    let event = InboxEvent::new(
        EventKind::TicketStatus,
        Some(change.ticket_id.clone()),
        change.chat_id.clone(),
        change.status.as_str(),
    );
    state.notifier.broadcast(&request.workspace_id, &event).await;

    Ok(Json(change.into()))
}

async fn announce_reassignment(state: &GatewayState, outcome: &ReassignmentOutcome) {
    if outcome.is_noop() {
        return;
    }
    let event = InboxEvent::reassigned(outcome);
    state.notifier.broadcast(&outcome.workspace_id, &event).await;
}
