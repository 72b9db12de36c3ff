//! Domain entities shared by the store and the inbox services

pub mod chat;
pub mod user;
pub mod workspace;

pub use chat::{Chat, Note, Ticket, TicketStatus};
pub use user::{User, UserStatus};
pub use workspace::{validate_workspace_id, Role, Team, TeamMember, Workspace};
