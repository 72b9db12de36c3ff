//! Chat and ticket notes, chat tags, and single-chat reads.

use std::collections::BTreeSet;
use std::sync::Arc;

use frontdesk_database::{Chat, InboxStore, InboxTransaction, Note};
use tracing::info;

use crate::services::{finish, membership};
use crate::types::{EventKind, InboxError, InboxEvent, InboxResult};

/// Which aggregate an inbound note is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Chat,
    Ticket,
}

impl NoteKind {
    pub fn parse(value: &str) -> InboxResult<Self> {
        match value {
            "chat_note" => Ok(NoteKind::Chat),
            "ticket_note" => Ok(NoteKind::Ticket),
            other => Err(InboxError::invalid_state(format!(
                "unknown message type {other:?}"
            ))),
        }
    }

    fn event_kind(self) -> EventKind {
        match self {
            NoteKind::Chat => EventKind::ChatNote,
            NoteKind::Ticket => EventKind::TicketNote,
        }
    }
}

pub struct NoteService<S> {
    store: Arc<S>,
}

impl<S> Clone for NoteService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: InboxStore> NoteService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append a note from `actor_id` and return the event to fan out.
    pub async fn handle_message(
        &self,
        actor_id: &str,
        workspace_id: &str,
        chat_id: &str,
        ticket_id: Option<&str>,
        message_type: &str,
        message: &str,
    ) -> InboxResult<InboxEvent> {
        let mut tx = self.store.begin().await?;
        let outcome = Self::append_note(
            &mut tx,
            actor_id,
            workspace_id,
            chat_id,
            ticket_id,
            message_type,
            message,
        )
        .await;
        let event = finish(tx, outcome).await?;

        info!(
            workspace_id,
            chat_id,
            ticket_id = ?ticket_id,
            actor_id,
            kind = event.kind.as_str(),
            "note added"
        );
        Ok(event)
    }

    async fn append_note(
        tx: &mut S::Tx,
        actor_id: &str,
        workspace_id: &str,
        chat_id: &str,
        ticket_id: Option<&str>,
        message_type: &str,
        message: &str,
    ) -> InboxResult<InboxEvent> {
        let mut chat = authorized_chat(tx, actor_id, workspace_id, chat_id).await?;
        let kind = NoteKind::parse(message_type)?;

        if message.trim().is_empty() {
            return Err(InboxError::invalid_state("note text must not be empty"));
        }
        let note = Note::new(actor_id, message);
        let created_at = note.created_at.clone();

        match kind {
            NoteKind::Chat => chat.notes.push(note),
            NoteKind::Ticket => {
                let ticket_id = ticket_id
                    .ok_or_else(|| InboxError::invalid_state("ticket_note requires a ticket_id"))?;
                chat.ticket_mut(ticket_id)
                    .ok_or_else(|| InboxError::not_found("ticket", ticket_id))?
                    .notes
                    .push(note);
            }
        }

        tx.update_chat(&chat).await?;

        Ok(InboxEvent {
            ticket_id: ticket_id.map(str::to_string),
            chat_id: chat.chat_id,
            message: message.to_string(),
            kind: kind.event_kind(),
            created_at,
        })
    }

    /// Replace a chat's tags. Blank tags are dropped and the rest trimmed.
    pub async fn update_chat_tags(
        &self,
        actor_id: &str,
        workspace_id: &str,
        chat_id: &str,
        tags: &[String],
    ) -> InboxResult<Chat> {
        let mut tx = self.store.begin().await?;
        let outcome = async {
            let mut chat = authorized_chat(&mut tx, actor_id, workspace_id, chat_id).await?;
            chat.tags = tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect::<BTreeSet<_>>();
            tx.update_chat(&chat).await?;
            Ok::<_, InboxError>(chat)
        }
        .await;
        let chat = finish(tx, outcome).await?;

        info!(workspace_id, chat_id, tags = chat.tags.len(), "chat tags updated");
        Ok(chat)
    }

    pub async fn get_chat(&self, actor_id: &str, workspace_id: &str, chat_id: &str) -> InboxResult<Chat> {
        let mut tx = self.store.begin().await?;
        let outcome = authorized_chat(&mut tx, actor_id, workspace_id, chat_id).await;
        // Read-only; nothing to keep.
        if let Err(err) = tx.rollback().await {
            tracing::warn!(error = %err, "rollback failed");
        }
        outcome
    }
}

async fn authorized_chat<Tx: InboxTransaction>(
    tx: &mut Tx,
    actor_id: &str,
    workspace_id: &str,
    chat_id: &str,
) -> InboxResult<Chat> {
    let workspace = tx
        .find_workspace_by_workspace_id(workspace_id)
        .await?
        .ok_or_else(|| InboxError::not_found("workspace", workspace_id))?;
    membership::authorize(actor_id, &workspace)?;

    tx.find_chat_by_workspace_and_chat_id(workspace_id, chat_id)
        .await?
        .ok_or_else(|| InboxError::not_found("chat", chat_id))
}
