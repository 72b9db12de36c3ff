//! Moves a ticket from its current chat to the chat of another assignee.
//!
//! The whole move runs in one store transaction: the ticket leaves its
//! source chat (which is deleted once empty) and joins the destination chat
//! for the same external contact, creating that chat when needed. A failure
//! at any step rolls everything back.

use std::sync::Arc;

use frontdesk_database::{Chat, InboxStore, InboxTransaction};
use serde::Serialize;
use tracing::{debug, info};

use crate::services::balancer::{select_least_busy, TransactionTicketCounter};
use crate::services::{finish, membership};
use crate::types::{InboxError, InboxResult};

/// Where a reassignment sends the ticket.
#[derive(Debug, Clone, Copy)]
enum Destination<'a> {
    Team { name: &'a str },
    User { email: &'a str },
}

/// What a committed reassignment changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReassignmentOutcome {
    pub ticket_id: String,
    pub workspace_id: String,
    pub source_chat_id: String,
    pub source_chat_deleted: bool,
    pub destination_chat_id: String,
    pub destination_created: bool,
    pub assignee_user_id: String,
    pub team_id: Option<String>,
}

impl ReassignmentOutcome {
    /// True when the ticket already sat in the destination chat.
    pub fn is_noop(&self) -> bool {
        self.source_chat_id == self.destination_chat_id
    }
}

pub struct ReassignmentService<S> {
    store: Arc<S>,
}

impl<S> Clone for ReassignmentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: InboxStore> ReassignmentService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Hand the ticket to the least busy member of `team_name`.
    pub async fn reassign_to_team(
        &self,
        actor_id: &str,
        ticket_id: &str,
        workspace_id: &str,
        team_name: &str,
    ) -> InboxResult<ReassignmentOutcome> {
        self.reassign(
            actor_id,
            ticket_id,
            workspace_id,
            Destination::Team { name: team_name },
        )
        .await
    }

    /// Hand the ticket to the user registered under `email`.
    pub async fn reassign_to_user(
        &self,
        actor_id: &str,
        ticket_id: &str,
        workspace_id: &str,
        email: &str,
    ) -> InboxResult<ReassignmentOutcome> {
        self.reassign(
            actor_id,
            ticket_id,
            workspace_id,
            Destination::User { email },
        )
        .await
    }

    async fn reassign(
        &self,
        actor_id: &str,
        ticket_id: &str,
        workspace_id: &str,
        destination: Destination<'_>,
    ) -> InboxResult<ReassignmentOutcome> {
        let mut tx = self.store.begin().await?;
        let outcome = self
            .move_ticket(&mut tx, actor_id, ticket_id, workspace_id, destination)
            .await;
        let outcome = finish(tx, outcome).await?;

        info!(
            ticket_id,
            workspace_id,
            actor_id,
            from = %outcome.source_chat_id,
            to = %outcome.destination_chat_id,
            assignee = %outcome.assignee_user_id,
            source_deleted = outcome.source_chat_deleted,
            created = outcome.destination_created,
            "ticket reassigned"
        );
        Ok(outcome)
    }

    async fn move_ticket(
        &self,
        tx: &mut S::Tx,
        actor_id: &str,
        ticket_id: &str,
        workspace_id: &str,
        destination: Destination<'_>,
    ) -> InboxResult<ReassignmentOutcome> {
        let mut source = tx
            .find_chat_by_ticket_id(ticket_id)
            .await?
            .filter(|chat| chat.workspace_id == workspace_id)
            .ok_or_else(|| InboxError::not_found("ticket", ticket_id))?;

        let ticket = source.take_ticket(ticket_id).ok_or_else(|| {
            InboxError::invalid_state(format!(
                "ticket {ticket_id} is indexed to chat {} but not held by it",
                source.chat_id
            ))
        })?;

        let workspace = tx
            .find_workspace_by_workspace_id(workspace_id)
            .await?
            .ok_or_else(|| InboxError::not_found("workspace", workspace_id))?;
        membership::authorize(actor_id, &workspace)?;

        let (assignee_user_id, team_id) = match destination {
            Destination::Team { name } => {
                let team_id = workspace
                    .team_id_for(name)
                    .ok_or_else(|| InboxError::not_found("team", name))?
                    .to_string();
                let members = tx.find_team_members(&team_id).await?;
                let mut counter = TransactionTicketCounter::new(&mut *tx);
                let assignee = select_least_busy(&mut counter, name, &members).await?;
                (assignee, Some(team_id))
            }
            Destination::User { email } => {
                let user = tx
                    .find_user_by_email(email)
                    .await?
                    .ok_or_else(|| InboxError::not_found("user", email))?;
                (user.id, None)
            }
        };

        // A failed lookup aborts through `?`; only a definite miss creates a chat.
        let existing = tx
            .find_chat_by_user_id(&source.source_client_id, workspace_id, &assignee_user_id)
            .await?;

        if let Some(chat) = &existing {
            if chat.chat_id == source.chat_id {
                debug!(ticket_id, chat_id = %chat.chat_id, "ticket already with assignee");
                return Ok(ReassignmentOutcome {
                    ticket_id: ticket_id.to_string(),
                    workspace_id: workspace_id.to_string(),
                    source_chat_id: source.chat_id.clone(),
                    source_chat_deleted: false,
                    destination_chat_id: chat.chat_id.clone(),
                    destination_created: false,
                    assignee_user_id,
                    team_id: chat.team_id.clone(),
                });
            }
        }

        let source_chat_deleted = source.tickets.is_empty();
        if source_chat_deleted {
            tx.delete_chat(&source.chat_id).await?;
        } else {
            tx.update_chat(&source).await?;
        }

        let (destination_chat_id, destination_created, team_id) = match existing {
            Some(mut chat) => {
                chat.tickets.push(ticket);
                if team_id.is_some() {
                    chat.team_id = team_id;
                }
                tx.update_chat(&chat).await?;
                (chat.chat_id, false, chat.team_id)
            }
            None => {
                let mut chat = Chat::seeded(
                    workspace_id,
                    source.source_client_id.clone(),
                    source.source.clone(),
                    Some(assignee_user_id.clone()),
                    ticket,
                );
                chat.team_id = team_id;
                tx.insert_new_chat(&chat).await?;
                (chat.chat_id, true, chat.team_id)
            }
        };

        Ok(ReassignmentOutcome {
            ticket_id: ticket_id.to_string(),
            workspace_id: workspace_id.to_string(),
            source_chat_id: source.chat_id,
            source_chat_deleted,
            destination_chat_id,
            destination_created,
            assignee_user_id,
            team_id,
        })
    }
}
