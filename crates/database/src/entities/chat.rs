//! Chat, ticket and note entity definitions

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A conversation between one external contact and one assignee.
///
/// A persisted chat always holds at least one ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: String,
    pub workspace_id: String,
    pub source_client_id: String,
    pub assignee_user_id: Option<String>,
    pub team_id: Option<String>,
    pub source: String,
    pub tags: BTreeSet<String>,
    pub notes: Vec<Note>,
    pub tickets: Vec<Ticket>,
    pub created_at: String,
}

impl Chat {
    /// Start a fresh chat for `source_client_id` seeded with a single ticket.
    pub fn seeded(
        workspace_id: impl Into<String>,
        source_client_id: impl Into<String>,
        source: impl Into<String>,
        assignee_user_id: Option<String>,
        ticket: Ticket,
    ) -> Self {
        Self {
            chat_id: uuid::Uuid::new_v4().to_string(),
            workspace_id: workspace_id.into(),
            source_client_id: source_client_id.into(),
            assignee_user_id,
            team_id: None,
            source: source.into(),
            tags: BTreeSet::new(),
            notes: Vec::new(),
            tickets: vec![ticket],
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn contains_ticket(&self, ticket_id: &str) -> bool {
        self.tickets.iter().any(|ticket| ticket.ticket_id == ticket_id)
    }

    pub fn ticket(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|ticket| ticket.ticket_id == ticket_id)
    }

    pub fn ticket_mut(&mut self, ticket_id: &str) -> Option<&mut Ticket> {
        self.tickets
            .iter_mut()
            .find(|ticket| ticket.ticket_id == ticket_id)
    }

    /// Remove a ticket, keeping the order of the rest.
    pub fn take_ticket(&mut self, ticket_id: &str) -> Option<Ticket> {
        let index = self
            .tickets
            .iter()
            .position(|ticket| ticket.ticket_id == ticket_id)?;
        Some(self.tickets.remove(index))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub status: TicketStatus,
    pub notes: Vec<Note>,
    pub created_at: String,
}

impl Ticket {
    pub fn open(ticket_id: impl Into<String>) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            status: TicketStatus::Open,
            notes: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Append-only annotation attached to a chat or a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub note_id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: String,
}

impl Note {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            note_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            text: text.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Pending,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Closed => "closed",
        }
    }

    /// Strict parse; anything outside the three known states is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(TicketStatus::Open),
            "pending" => Some(TicketStatus::Pending),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_with(ids: &[&str]) -> Chat {
        let mut chat = Chat::seeded("acme-support", "tg-1", "telegram", None, Ticket::open(ids[0]));
        for id in &ids[1..] {
            chat.tickets.push(Ticket::open(*id));
        }
        chat
    }

    #[test]
    fn take_ticket_preserves_remaining_order() {
        let mut chat = chat_with(&["t1", "t2", "t3"]);
        let taken = chat.take_ticket("t2").unwrap();

        assert_eq!(taken.ticket_id, "t2");
        let remaining: Vec<_> = chat.tickets.iter().map(|t| t.ticket_id.as_str()).collect();
        assert_eq!(remaining, vec!["t1", "t3"]);
        assert!(chat.take_ticket("t2").is_none());
    }

    #[test]
    fn ticket_status_parse_is_strict() {
        assert_eq!(TicketStatus::parse("open"), Some(TicketStatus::Open));
        assert_eq!(TicketStatus::parse("pending"), Some(TicketStatus::Pending));
        assert_eq!(TicketStatus::parse("closed"), Some(TicketStatus::Closed));
        assert_eq!(TicketStatus::parse("archived"), None);
        assert_eq!(TicketStatus::parse("Open"), None);
    }

    #[test]
    fn seeded_chat_starts_empty_apart_from_ticket() {
        let chat = chat_with(&["t1"]);
        assert!(chat.notes.is_empty());
        assert!(chat.tags.is_empty());
        assert!(chat.contains_ticket("t1"));
        assert!(!chat.chat_id.is_empty());
    }
}
