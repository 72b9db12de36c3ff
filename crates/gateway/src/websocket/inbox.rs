//! Workspace inbox socket: `GET /api/messenger/ws/:workspace_id`.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use frontdesk_tickets::membership;

use crate::error::GatewayResult;
use crate::middleware::Actor;
use crate::state::GatewayState;
use crate::websocket::notifier::Connection;

/// Frame sent by an agent's client. Older clients name the kind `source`.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type", alias = "source")]
    pub message_type: String,
    #[serde(default)]
    pub ticket_id: Option<String>,
    pub chat_id: String,
    pub message: String,
}

pub async fn inbox_websocket_handler(
    State(state): State<Arc<GatewayState>>,
    Path(workspace_id): Path<String>,
    Extension(actor): Extension<Actor>,
    ws: WebSocketUpgrade,
) -> GatewayResult<Response> {
    membership::authorize_by_id(state.store.as_ref(), &actor.0, &workspace_id).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, workspace_id, actor)))
}

async fn handle_socket(socket: WebSocket, state: Arc<GatewayState>, workspace_id: String, actor: Actor) {
    let (mut ws_sender, mut receiver) = socket.split();
    let (connection, mut out_rx) = state.notifier.register(&workspace_id).await;
    info!(
        workspace_id = %workspace_id,
        user_id = %actor.0,
        connection_id = connection.id(),
        "inbox socket opened"
    );

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = out_rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(payload)).await {
                debug!(error = %e, "socket write failed");
                return;
            }
        }
        // The registry dropped this connection.
        let _ = ws_sender.send(Message::Close(None)).await;
    });

    let reader_state = Arc::clone(&state);
    let reader_connection = connection.clone();
    let reader_actor = actor.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    handle_inbound(&reader_state, &reader_connection, &reader_actor, &text).await;
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    debug!(error = %e, "socket read failed");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }

    state.notifier.remove(&connection).await;
    info!(
        workspace_id = %workspace_id,
        user_id = %actor.0,
        connection_id = connection.id(),
        "inbox socket closed"
    );
}

async fn handle_inbound(state: &GatewayState, connection: &Connection, actor: &Actor, text: &str) {
    let inbound = match serde_json::from_str::<InboundMessage>(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            warn!(user_id = %actor.0, error = %e, "unparseable inbox frame");
            let reply = json!({ "error": "invalid message format" }).to_string();
            state.notifier.send_to(connection, reply).await;
            return;
        }
    };

    let result = state
        .notes
        .handle_message(
            &actor.0,
            connection.workspace_id(),
            &inbound.chat_id,
            inbound.ticket_id.as_deref(),
            &inbound.message_type,
            &inbound.message,
        )
        .await;

    match result {
        Ok(event) => {
            state.notifier.broadcast(connection.workspace_id(), &event).await;
        }
        Err(e) => {
            warn!(user_id = %actor.0, chat_id = %inbound.chat_id, error = %e, "inbox frame rejected");
            let reply = json!({ "error": e.to_string() }).to_string();
            state.notifier.send_to(connection, reply).await;
        }
    }
}
