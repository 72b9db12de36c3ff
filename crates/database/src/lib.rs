//! Frontdesk Database Crate
//!
//! Connection management, migrations, the inbox entities, and the
//! transactional store the ticket services run against.

use frontdesk_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod store;
pub mod types;

pub use connection::prepare_database;
pub use migrations::{run_migrations, MIGRATOR};

pub use repos::{DirectoryRepository, SqliteInboxStore, SqliteInboxTransaction};

pub use store::{InboxStore, InboxTransaction};

pub use entities::{
    validate_workspace_id, Chat, Note, Role, Team, TeamMember, Ticket, TicketStatus, User,
    UserStatus, Workspace,
};

pub use types::{DatabaseError, DatabaseResult, StoreError, StoreResult};

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    Ok(pool)
}
