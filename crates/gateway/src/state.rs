//! Shared application state for the gateway

use std::sync::Arc;

use frontdesk_config::AppConfig;
use frontdesk_database::SqliteInboxStore;
use frontdesk_tickets::{NoteService, ReassignmentService, TicketStatusService};
use sqlx::SqlitePool;

use crate::error::GatewayResult;
use crate::token::TokenIssuer;
use crate::websocket::ConnectionRegistry;

/// Shared application state containing all services
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<SqliteInboxStore>,
    pub reassignment: ReassignmentService<SqliteInboxStore>,
    pub status: TicketStatusService<SqliteInboxStore>,
    pub notes: NoteService<SqliteInboxStore>,
    pub notifier: ConnectionRegistry,
    pub tokens: TokenIssuer,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        let store = Arc::new(SqliteInboxStore::new(pool));

        Self {
            reassignment: ReassignmentService::new(Arc::clone(&store)),
            status: TicketStatusService::new(Arc::clone(&store)),
            notes: NoteService::new(Arc::clone(&store)),
            notifier: ConnectionRegistry::new(config.realtime.connection_buffer),
            tokens: TokenIssuer::from_config(&config.auth),
            store,
        }
    }

    /// Open the database, run migrations and build the state.
    pub async fn from_config(config: &AppConfig) -> GatewayResult<Self> {
        let pool = frontdesk_database::initialize_database(&config.database).await?;
        Ok(Self::new(pool, config))
    }
}
