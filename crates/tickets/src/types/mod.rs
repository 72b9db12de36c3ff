//! Shared types for the inbox services.

pub mod errors;
pub mod events;

pub use errors::{InboxError, InboxResult};
pub use events::{EventKind, InboxEvent};
