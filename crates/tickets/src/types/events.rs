//! Payloads fanned out to every agent connected to a workspace.

use serde::{Deserialize, Serialize};

use crate::services::reassignment_service::ReassignmentOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ChatNote,
    TicketNote,
    TicketReassigned,
    TicketStatus,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ChatNote => "chat_note",
            EventKind::TicketNote => "ticket_note",
            EventKind::TicketReassigned => "ticket_reassigned",
            EventKind::TicketStatus => "ticket_status",
        }
    }
}

/// Outbound frame: `{ticket_id, chat_id, message, type, created_at}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxEvent {
    pub ticket_id: Option<String>,
    pub chat_id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub created_at: String,
}

impl InboxEvent {
    pub fn new(
        kind: EventKind,
        ticket_id: Option<String>,
        chat_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ticket_id,
            chat_id: chat_id.into(),
            message: message.into(),
            kind,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Announces where a ticket landed. The message names the new assignee.
    pub fn reassigned(outcome: &ReassignmentOutcome) -> Self {
        Self::new(
            EventKind::TicketReassigned,
            Some(outcome.ticket_id.clone()),
            outcome.destination_chat_id.clone(),
            outcome.assignee_user_id.clone(),
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_field() {
        let event = InboxEvent::new(EventKind::TicketNote, Some("t1".into()), "c1", "hello");
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "ticket_note");
        assert_eq!(value["ticket_id"], "t1");
        assert_eq!(value["chat_id"], "c1");
        assert_eq!(value["message"], "hello");
        assert!(value["created_at"].is_string());
    }
}
