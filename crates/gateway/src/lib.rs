//! # Frontdesk Gateway Crate
//!
//! HTTP and WebSocket surface of the Frontdesk inbox. Requests are
//! authenticated with bearer tokens, handed to the ticket services, and
//! every committed change is fanned out to the agents connected to the
//! affected workspace.
//!
//! ## Architecture
//!
//! - **REST**: ticket routing, status, notes and chat reads
//! - **WebSocket**: per-workspace inbox sockets and the connection registry
//! - **State**: services, token verifier and registry shared by handlers
//! - **Middleware**: authentication, CORS and request logging
//!
//! ## Usage
//!
//! ```rust,ignore
//! use frontdesk_gateway::{create_router, GatewayState};
//!
//! let state = GatewayState::from_config(&config).await?;
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:7070").await?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod token;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use middleware::{auth_middleware, Actor};
pub use state::GatewayState;
pub use token::{Claims, TokenIssuer};
pub use websocket::{Connection, ConnectionRegistry};

use axum::{middleware as axum_middleware, routing::get, Json, Router};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        rest::health::health_check,
        rest::tickets::reassign_to_team,
        rest::tickets::reassign_to_user,
        rest::tickets::update_status,
        rest::chats::create_note,
        rest::chats::update_tags,
        rest::chats::get_chat,
    ),
    components(
        schemas(
            rest::ErrorResponse,
            rest::health::HealthResponse,
            rest::tickets::ReassignToTeamRequest,
            rest::tickets::ReassignToUserRequest,
            rest::tickets::UpdateStatusRequest,
            rest::tickets::ReassignmentResponse,
            rest::tickets::StatusResponse,
            rest::chats::CreateNoteRequest,
            rest::chats::UpdateTagsRequest,
            rest::chats::NoteResponse,
            rest::chats::TicketResponse,
            rest::chats::ChatResponse,
            rest::chats::EventResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "tickets", description = "Ticket routing and status"),
        (name = "chats", description = "Notes, tags and chat reads"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);

    let authenticated = Router::new()
        .merge(rest::create_rest_routes())
        .merge(websocket::create_websocket_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            arc_state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(rest::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_document))
        .merge(authenticated)
        .with_state(arc_state)
        .layer(middleware::create_cors_middleware())
        .layer(middleware::create_trace_middleware())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for path in [
            "/health",
            "/api/messenger/ticket/reassign/team",
            "/api/messenger/ticket/reassign/user",
            "/api/messenger/ticket/status",
            "/api/messenger/message",
            "/api/messenger/chats/{chat_id}/tags",
            "/api/messenger/workspaces/{workspace_id}/chats/{chat_id}",
        ] {
            assert!(paths.iter().any(|p| p.as_str() == path), "missing {path}");
        }
    }
}
