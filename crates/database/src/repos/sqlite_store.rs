//! SQLite implementation of the inbox store.
//!
//! Chats are stored across `chats`, `tickets`, `chat_notes` and
//! `ticket_notes`; these helpers assemble and persist the whole aggregate.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use crate::entities::{Chat, Note, Role, TeamMember, Ticket, TicketStatus, User, UserStatus, Workspace};
use crate::store::{InboxStore, InboxTransaction};
use crate::types::{StoreError, StoreResult};

const CHAT_COLUMNS: &str =
    "chat_id, workspace_id, source_client_id, assignee_user_id, team_id, source, tags, created_at";

/// Store backed by a SQLite pool
#[derive(Clone)]
pub struct SqliteInboxStore {
    pool: SqlitePool,
}

impl SqliteInboxStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// A transaction on one pooled SQLite connection
pub struct SqliteInboxTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl InboxStore for SqliteInboxStore {
    type Tx = SqliteInboxTransaction;

    async fn begin(&self) -> StoreResult<Self::Tx> {
        let tx = self.pool.begin().await?;
        Ok(SqliteInboxTransaction { tx })
    }

    async fn find_workspace_by_workspace_id(
        &self,
        workspace_id: &str,
    ) -> StoreResult<Option<Workspace>> {
        let mut conn = self.pool.acquire().await?;
        fetch_workspace(&mut conn, workspace_id).await
    }
}

#[async_trait]
impl InboxTransaction for SqliteInboxTransaction {
    async fn find_chat_by_ticket_id(&mut self, ticket_id: &str) -> StoreResult<Option<Chat>> {
        fetch_chat(
            &mut self.tx,
            "chat_id = (SELECT chat_id FROM tickets WHERE ticket_id = ?)",
            &[ticket_id],
        )
        .await
    }

    async fn find_chat_by_user_id(
        &mut self,
        source_client_id: &str,
        workspace_id: &str,
        assignee_user_id: &str,
    ) -> StoreResult<Option<Chat>> {
        fetch_chat(
            &mut self.tx,
            "source_client_id = ? AND workspace_id = ? AND assignee_user_id = ?",
            &[source_client_id, workspace_id, assignee_user_id],
        )
        .await
    }

    async fn find_chat_by_workspace_and_chat_id(
        &mut self,
        workspace_id: &str,
        chat_id: &str,
    ) -> StoreResult<Option<Chat>> {
        fetch_chat(
            &mut self.tx,
            "workspace_id = ? AND chat_id = ?",
            &[workspace_id, chat_id],
        )
        .await
    }

    async fn insert_new_chat(&mut self, chat: &Chat) -> StoreResult<()> {
        insert_chat(&mut self.tx, chat).await
    }

    async fn update_chat(&mut self, chat: &Chat) -> StoreResult<()> {
        ensure_has_tickets(chat)?;

        let tags = serde_json::to_string(&chat.tags)?;
        let result = sqlx::query(
            r#"
            UPDATE chats
            SET source_client_id = ?, assignee_user_id = ?, team_id = ?, source = ?, tags = ?
            WHERE chat_id = ? AND workspace_id = ?
            "#,
        )
        .bind(&chat.source_client_id)
        .bind(&chat.assignee_user_id)
        .bind(&chat.team_id)
        .bind(&chat.source)
        .bind(tags)
        .bind(&chat.chat_id)
        .bind(&chat.workspace_id)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("chat", &chat.chat_id));
        }

        // Ticket rows are rewritten from the aggregate; their notes cascade
        // and are written back below.
        sqlx::query("DELETE FROM tickets WHERE chat_id = ?")
            .bind(&chat.chat_id)
            .execute(&mut *self.tx)
            .await?;

        write_chat_contents(&mut self.tx, chat).await?;
        debug!(chat_id = %chat.chat_id, tickets = chat.tickets.len(), "chat updated");
        Ok(())
    }

    async fn delete_chat(&mut self, chat_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM folder_chats WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&mut *self.tx)
            .await?;

        let result = sqlx::query("DELETE FROM chats WHERE chat_id = ?")
            .bind(chat_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("chat", chat_id));
        }

        debug!(chat_id, "chat deleted");
        Ok(())
    }

    async fn find_workspace_by_workspace_id(
        &mut self,
        workspace_id: &str,
    ) -> StoreResult<Option<Workspace>> {
        fetch_workspace(&mut self.tx, workspace_id).await
    }

    async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, full_name, status, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    async fn find_team_members(&mut self, team_id: &str) -> StoreResult<Vec<TeamMember>> {
        let rows = sqlx::query(
            r#"
            SELECT tm.user_id, u.status
            FROM team_members tm
            JOIN users u ON u.id = tm.user_id
            WHERE tm.team_id = ?
            ORDER BY tm.user_id
            "#,
        )
        .bind(team_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| -> StoreResult<TeamMember> {
                let status: String = row.try_get("status")?;
                Ok(TeamMember {
                    user_id: row.try_get("user_id")?,
                    status: UserStatus::from(status.as_str()),
                })
            })
            .collect()
    }

    async fn count_active_tickets(&mut self, user_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tickets t
            JOIN chats c ON c.chat_id = t.chat_id
            WHERE c.assignee_user_id = ? AND t.status != 'closed'
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        debug!(user_id, count, "counted active tickets");
        Ok(count)
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn ensure_has_tickets(chat: &Chat) -> StoreResult<()> {
    if chat.tickets.is_empty() {
        return Err(StoreError::Validation(format!(
            "chat {} must hold at least one ticket",
            chat.chat_id
        )));
    }
    Ok(())
}

pub(crate) async fn insert_chat(conn: &mut SqliteConnection, chat: &Chat) -> StoreResult<()> {
    ensure_has_tickets(chat)?;

    let tags = serde_json::to_string(&chat.tags)?;
    sqlx::query(&format!(
        "INSERT INTO chats ({CHAT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&chat.chat_id)
    .bind(&chat.workspace_id)
    .bind(&chat.source_client_id)
    .bind(&chat.assignee_user_id)
    .bind(&chat.team_id)
    .bind(&chat.source)
    .bind(tags)
    .bind(&chat.created_at)
    .execute(&mut *conn)
    .await?;

    write_chat_contents(conn, chat).await?;
    debug!(chat_id = %chat.chat_id, workspace_id = %chat.workspace_id, "chat inserted");
    Ok(())
}

async fn write_chat_contents(conn: &mut SqliteConnection, chat: &Chat) -> StoreResult<()> {
    for (position, note) in chat.notes.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO chat_notes (note_id, chat_id, position, user_id, text, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.note_id)
        .bind(&chat.chat_id)
        .bind(position as i64)
        .bind(&note.user_id)
        .bind(&note.text)
        .bind(&note.created_at)
        .execute(&mut *conn)
        .await?;
    }

    for (position, ticket) in chat.tickets.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO tickets (ticket_id, chat_id, position, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ticket.ticket_id)
        .bind(&chat.chat_id)
        .bind(position as i64)
        .bind(ticket.status.as_str())
        .bind(&ticket.created_at)
        .execute(&mut *conn)
        .await?;

        for (note_position, note) in ticket.notes.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO ticket_notes (note_id, ticket_id, position, user_id, text, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&note.note_id)
            .bind(&ticket.ticket_id)
            .bind(note_position as i64)
            .bind(&note.user_id)
            .bind(&note.text)
            .bind(&note.created_at)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

pub(crate) async fn fetch_chat(
    conn: &mut SqliteConnection,
    filter: &str,
    binds: &[&str],
) -> StoreResult<Option<Chat>> {
    let sql = format!("SELECT {CHAT_COLUMNS} FROM chats WHERE {filter}");
    let mut query = sqlx::query(&sql);
    for value in binds {
        query = query.bind(*value);
    }

    let Some(row) = query.fetch_optional(&mut *conn).await? else {
        return Ok(None);
    };

    let mut chat = chat_from_row(&row)?;
    chat.notes = fetch_notes(conn, "chat_notes", "chat_id", &chat.chat_id).await?;
    chat.tickets = fetch_tickets(conn, &chat.chat_id).await?;
    Ok(Some(chat))
}

fn chat_from_row(row: &SqliteRow) -> StoreResult<Chat> {
    let tags: String = row.try_get("tags")?;
    let tags: BTreeSet<String> = serde_json::from_str(&tags)?;

    Ok(Chat {
        chat_id: row.try_get("chat_id")?,
        workspace_id: row.try_get("workspace_id")?,
        source_client_id: row.try_get("source_client_id")?,
        assignee_user_id: row.try_get("assignee_user_id")?,
        team_id: row.try_get("team_id")?,
        source: row.try_get("source")?,
        tags,
        notes: Vec::new(),
        tickets: Vec::new(),
        created_at: row.try_get("created_at")?,
    })
}

async fn fetch_tickets(conn: &mut SqliteConnection, chat_id: &str) -> StoreResult<Vec<Ticket>> {
    let rows = sqlx::query(
        "SELECT ticket_id, status, created_at FROM tickets WHERE chat_id = ? ORDER BY position",
    )
    .bind(chat_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut tickets = Vec::with_capacity(rows.len());
    for row in rows {
        let ticket_id: String = row.try_get("ticket_id")?;
        let status: String = row.try_get("status")?;
        let status = TicketStatus::parse(&status).ok_or_else(|| {
            StoreError::Backend(format!("ticket {ticket_id} has unknown status {status}"))
        })?;
        let notes = fetch_notes(conn, "ticket_notes", "ticket_id", &ticket_id).await?;

        tickets.push(Ticket {
            ticket_id,
            status,
            notes,
            created_at: row.try_get("created_at")?,
        });
    }

    Ok(tickets)
}

async fn fetch_notes(
    conn: &mut SqliteConnection,
    table: &str,
    owner_column: &str,
    owner_id: &str,
) -> StoreResult<Vec<Note>> {
    let sql = format!(
        "SELECT note_id, user_id, text, created_at FROM {table} WHERE {owner_column} = ? ORDER BY position"
    );
    let rows = sqlx::query(&sql)
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| -> StoreResult<Note> {
            Ok(Note {
                note_id: row.try_get("note_id")?,
                user_id: row.try_get("user_id")?,
                text: row.try_get("text")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .collect()
}

pub(crate) async fn fetch_workspace(
    conn: &mut SqliteConnection,
    workspace_id: &str,
) -> StoreResult<Option<Workspace>> {
    let Some(row) = sqlx::query(
        "SELECT workspace_id, name, logo, created_at FROM workspaces WHERE workspace_id = ?",
    )
    .bind(workspace_id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let mut workspace = Workspace {
        workspace_id: row.try_get("workspace_id")?,
        name: row.try_get("name")?,
        logo: row.try_get("logo")?,
        created_at: row.try_get("created_at")?,
        ..Workspace::default()
    };

    let members = sqlx::query("SELECT user_id, role FROM workspace_members WHERE workspace_id = ?")
        .bind(workspace_id)
        .fetch_all(&mut *conn)
        .await?;
    for member in members {
        let role: String = member.try_get("role")?;
        workspace
            .team
            .insert(member.try_get("user_id")?, Role::from(role.as_str()));
    }

    let pending =
        sqlx::query("SELECT email, role FROM workspace_pending_members WHERE workspace_id = ?")
            .bind(workspace_id)
            .fetch_all(&mut *conn)
            .await?;
    for invite in pending {
        let role: String = invite.try_get("role")?;
        workspace
            .pending_team
            .insert(invite.try_get("email")?, Role::from(role.as_str()));
    }

    let teams = sqlx::query("SELECT name, team_id FROM teams WHERE workspace_id = ?")
        .bind(workspace_id)
        .fetch_all(&mut *conn)
        .await?;
    for team in teams {
        workspace
            .internal_teams
            .insert(team.try_get("name")?, team.try_get("team_id")?);
    }

    let folder_rows = sqlx::query(
        r#"
        SELECT folder_name, chat_id
        FROM folder_chats
        WHERE workspace_id = ?
        ORDER BY folder_name, position
        "#,
    )
    .bind(workspace_id)
    .fetch_all(&mut *conn)
    .await?;
    let mut folders: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in folder_rows {
        folders
            .entry(entry.try_get("folder_name")?)
            .or_default()
            .push(entry.try_get("chat_id")?);
    }
    workspace.folders = folders;

    Ok(Some(workspace))
}

pub(crate) fn user_from_row(row: &SqliteRow) -> StoreResult<User> {
    let status: String = row.try_get("status")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        status: UserStatus::from(status.as_str()),
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Role;
    use crate::repos::DirectoryRepository;
    use crate::{connection::prepare_database, migrations::run_migrations};
    use frontdesk_config::DatabaseConfig;
    use tempfile::TempDir;

    async fn create_test_store() -> (SqliteInboxStore, DirectoryRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("store.db").display()),
            max_connections: 2,
        };
        let pool = prepare_database(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let directory = DirectoryRepository::new(pool.clone());
        directory
            .create_workspace("acme-support", "Acme Support")
            .await
            .unwrap();

        (SqliteInboxStore::new(pool), directory, temp_dir)
    }

    fn chat_for(contact: &str, assignee: Option<&str>, tickets: &[&str]) -> Chat {
        let mut chat = Chat::seeded(
            "acme-support",
            contact,
            "telegram",
            assignee.map(str::to_string),
            Ticket::open(tickets[0]),
        );
        for ticket_id in &tickets[1..] {
            chat.tickets.push(Ticket::open(*ticket_id));
        }
        chat
    }

    #[tokio::test]
    async fn test_insert_and_find_by_ticket_round_trips_aggregate() {
        let (store, _directory, _temp_dir) = create_test_store().await;

        let mut chat = chat_for("tg-100", Some("agent-a"), &["t1", "t2"]);
        chat.tags.insert("vip".to_string());
        chat.notes.push(Note::new("agent-a", "first contact"));
        chat.tickets[1].notes.push(Note::new("agent-a", "needs refund"));
        chat.tickets[1].status = TicketStatus::Pending;

        let mut tx = store.begin().await.unwrap();
        tx.insert_new_chat(&chat).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = tx.find_chat_by_ticket_id("t2").await.unwrap().unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(found, chat);
    }

    #[tokio::test]
    async fn test_ticket_cannot_live_in_two_chats() {
        let (store, _directory, _temp_dir) = create_test_store().await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_new_chat(&chat_for("tg-1", Some("agent-a"), &["t1"]))
            .await
            .unwrap();
        let err = tx
            .insert_new_chat(&chat_for("tg-2", Some("agent-a"), &["t1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_one_chat_per_contact_and_assignee() {
        let (store, _directory, _temp_dir) = create_test_store().await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_new_chat(&chat_for("tg-1", Some("agent-a"), &["t1"]))
            .await
            .unwrap();
        let err = tx
            .insert_new_chat(&chat_for("tg-1", Some("agent-a"), &["t2"]))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let (store, _directory, _temp_dir) = create_test_store().await;

        let mut tx = store.begin().await.unwrap();
        tx.insert_new_chat(&chat_for("tg-1", Some("agent-a"), &["t1"]))
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_chat_by_ticket_id("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_rewrites_ticket_list_and_delete_cascades() {
        let (store, _directory, _temp_dir) = create_test_store().await;
        let mut chat = chat_for("tg-1", Some("agent-a"), &["t1", "t2"]);
        chat.tickets[0].notes.push(Note::new("agent-a", "kept"));

        let mut tx = store.begin().await.unwrap();
        tx.insert_new_chat(&chat).await.unwrap();

        chat.take_ticket("t2").unwrap();
        tx.update_chat(&chat).await.unwrap();
        assert!(tx.find_chat_by_ticket_id("t2").await.unwrap().is_none());
        let reloaded = tx
            .find_chat_by_workspace_and_chat_id("acme-support", &chat.chat_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.tickets.len(), 1);
        assert_eq!(reloaded.tickets[0].notes[0].text, "kept");

        tx.delete_chat(&chat.chat_id).await.unwrap();
        assert!(tx.find_chat_by_ticket_id("t1").await.unwrap().is_none());
        let err = tx.delete_chat(&chat.chat_id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_chats_are_rejected() {
        let (store, _directory, _temp_dir) = create_test_store().await;
        let mut chat = chat_for("tg-1", Some("agent-a"), &["t1"]);

        let mut tx = store.begin().await.unwrap();
        tx.insert_new_chat(&chat).await.unwrap();
        chat.tickets.clear();

        let err = tx.update_chat(&chat).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_count_active_tickets_ignores_closed() {
        let (store, _directory, _temp_dir) = create_test_store().await;
        let mut chat = chat_for("tg-1", Some("agent-a"), &["t1", "t2", "t3"]);
        chat.tickets[2].status = TicketStatus::Closed;

        let mut tx = store.begin().await.unwrap();
        tx.insert_new_chat(&chat).await.unwrap();
        tx.insert_new_chat(&chat_for("tg-2", Some("agent-b"), &["t4"]))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_active_tickets("agent-a").await.unwrap(), 2);
        assert_eq!(tx.count_active_tickets("agent-b").await.unwrap(), 1);
        assert_eq!(tx.count_active_tickets("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_workspace_and_team_lookups() {
        let (store, directory, _temp_dir) = create_test_store().await;
        let alice = directory
            .create_user("alice@acme.test", "Alice", UserStatus::Busy)
            .await
            .unwrap();
        directory
            .add_member("acme-support", &alice.id, Role::Owner)
            .await
            .unwrap();
        let team = directory
            .create_team("acme-support", "Billing", true)
            .await
            .unwrap();
        directory.add_team_member(&team.team_id, &alice.id).await.unwrap();

        let workspace = store
            .find_workspace_by_workspace_id("acme-support")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(workspace.team.get(&alice.id), Some(&Role::Owner));
        assert_eq!(workspace.team_id_for("Billing"), Some(team.team_id.as_str()));
        assert!(workspace.folders.is_empty());

        let mut tx = store.begin().await.unwrap();
        let members = tx.find_team_members(&team.team_id).await.unwrap();
        assert_eq!(
            members,
            vec![TeamMember {
                user_id: alice.id.clone(),
                status: UserStatus::Busy
            }]
        );
        let user = tx.find_user_by_email("alice@acme.test").await.unwrap().unwrap();
        assert_eq!(user.id, alice.id);
        assert!(tx.find_user_by_email("nobody@acme.test").await.unwrap().is_none());
        assert!(tx
            .find_workspace_by_workspace_id("missing-ws")
            .await
            .unwrap()
            .is_none());
    }
}
