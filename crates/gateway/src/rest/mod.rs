//! REST API endpoints for the gateway

pub mod chats;
pub mod health;
pub mod tickets;

use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::GatewayState;

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Routes that require an authenticated agent.
pub fn create_rest_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .merge(tickets::create_ticket_routes())
        .merge(chats::create_chat_routes())
}
