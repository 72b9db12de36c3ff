//! # Frontdesk Tickets Crate
//!
//! Business logic of the support inbox: moving tickets between chats,
//! picking the least busy team member, ticket status changes, and notes.
//! Every mutating operation runs inside one store transaction and returns
//! the data the caller needs to notify connected agents.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use frontdesk_tickets::ReassignmentService;
//!
//! let service = ReassignmentService::new(store);
//! let outcome = service
//!     .reassign_to_team(actor_id, ticket_id, workspace_id, "Billing")
//!     .await?;
//! ```

pub mod services;
pub mod types;

pub use services::{
    membership, select_least_busy, ActiveTicketCounter, NoteKind, NoteService,
    ReassignmentOutcome, ReassignmentService, StatusChange, TransactionTicketCounter,
    TicketStatusService,
};
pub use types::{EventKind, InboxError, InboxEvent, InboxResult};
