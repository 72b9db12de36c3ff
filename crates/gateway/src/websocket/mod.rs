//! WebSocket endpoints for the gateway

pub mod inbox;
pub mod notifier;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::GatewayState;

pub fn create_websocket_routes() -> Router<Arc<GatewayState>> {
    Router::new().route(
        "/api/messenger/ws/:workspace_id",
        get(inbox::inbox_websocket_handler),
    )
}

pub use notifier::{Connection, ConnectionRegistry};
