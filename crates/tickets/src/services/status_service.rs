//! Ticket status transitions. Any of `open`, `pending` and `closed` may
//! follow any other; anything else is rejected.

use std::sync::Arc;

use frontdesk_database::{InboxStore, InboxTransaction, TicketStatus};
use serde::Serialize;
use tracing::info;

use crate::services::{finish, membership};
use crate::types::{InboxError, InboxResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub ticket_id: String,
    pub chat_id: String,
    pub previous: TicketStatus,
    pub status: TicketStatus,
}

pub struct TicketStatusService<S> {
    store: Arc<S>,
}

impl<S> Clone for TicketStatusService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: InboxStore> TicketStatusService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn update_status(
        &self,
        actor_id: &str,
        ticket_id: &str,
        workspace_id: &str,
        new_status: &str,
    ) -> InboxResult<StatusChange> {
        let mut tx = self.store.begin().await?;
        let outcome =
            Self::apply_status(&mut tx, actor_id, ticket_id, workspace_id, new_status).await;
        let change = finish(tx, outcome).await?;

        info!(
            ticket_id,
            workspace_id,
            actor_id,
            from = %change.previous,
            to = %change.status,
            "ticket status updated"
        );
        Ok(change)
    }

    async fn apply_status(
        tx: &mut S::Tx,
        actor_id: &str,
        ticket_id: &str,
        workspace_id: &str,
        new_status: &str,
    ) -> InboxResult<StatusChange> {
        let workspace = tx
            .find_workspace_by_workspace_id(workspace_id)
            .await?
            .ok_or_else(|| InboxError::not_found("workspace", workspace_id))?;
        membership::authorize(actor_id, &workspace)?;

        let mut chat = tx
            .find_chat_by_ticket_id(ticket_id)
            .await?
            .filter(|chat| chat.workspace_id == workspace_id)
            .ok_or_else(|| InboxError::not_found("ticket", ticket_id))?;

        let status = TicketStatus::parse(new_status).ok_or_else(|| {
            InboxError::invalid_state(format!(
                "unknown ticket status {new_status:?}, expected open, pending or closed"
            ))
        })?;

        let ticket = chat
            .ticket_mut(ticket_id)
            .ok_or_else(|| InboxError::not_found("ticket", ticket_id))?;
        let previous = ticket.status;
        ticket.status = status;

        tx.update_chat(&chat).await?;

        Ok(StatusChange {
            ticket_id: ticket_id.to_string(),
            chat_id: chat.chat_id,
            previous,
            status,
        })
    }
}
