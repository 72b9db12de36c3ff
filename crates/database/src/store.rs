//! The store contract the inbox services depend on.
//!
//! A store hands out transactions. Everything a reassignment reads or writes
//! goes through one [`InboxTransaction`], so either every write lands or none
//! does. A transaction never needs a second pooled connection.

use async_trait::async_trait;

use crate::entities::{Chat, TeamMember, User, Workspace};
use crate::types::StoreResult;

#[async_trait]
pub trait InboxStore: Send + Sync {
    type Tx: InboxTransaction;

    /// Acquire a session and open a transaction on it.
    async fn begin(&self) -> StoreResult<Self::Tx>;

    /// Non-transactional workspace read, used for connection-level checks.
    async fn find_workspace_by_workspace_id(
        &self,
        workspace_id: &str,
    ) -> StoreResult<Option<Workspace>>;
}

/// One open unit of work. Dropping it without `commit` rolls back.
#[async_trait]
pub trait InboxTransaction: Send {
    // ─────────────────────────────── Chats ───────────────────────────────

    async fn find_chat_by_ticket_id(&mut self, ticket_id: &str) -> StoreResult<Option<Chat>>;

    /// The chat between `source_client_id` and `assignee_user_id` inside a workspace.
    async fn find_chat_by_user_id(
        &mut self,
        source_client_id: &str,
        workspace_id: &str,
        assignee_user_id: &str,
    ) -> StoreResult<Option<Chat>>;

    async fn find_chat_by_workspace_and_chat_id(
        &mut self,
        workspace_id: &str,
        chat_id: &str,
    ) -> StoreResult<Option<Chat>>;

    async fn insert_new_chat(&mut self, chat: &Chat) -> StoreResult<()>;

    /// Replace the stored chat, including its ticket list, with `chat`.
    async fn update_chat(&mut self, chat: &Chat) -> StoreResult<()>;

    async fn delete_chat(&mut self, chat_id: &str) -> StoreResult<()>;

    // ───────────────────────────── Directory ─────────────────────────────

    async fn find_workspace_by_workspace_id(
        &mut self,
        workspace_id: &str,
    ) -> StoreResult<Option<Workspace>>;

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;

    async fn find_team_members(&mut self, team_id: &str) -> StoreResult<Vec<TeamMember>>;

    /// Number of non-closed tickets in chats assigned to `user_id`.
    async fn count_active_tickets(&mut self, user_id: &str) -> StoreResult<i64>;

    // ───────────────────────────── Lifecycle ─────────────────────────────

    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}
