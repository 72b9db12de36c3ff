//! Repository for the workspace directory: users, workspaces, teams and
//! folders. Used by seeding and administrative tooling; the inbox services
//! only read this data through the store.

use std::collections::BTreeSet;

use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::entities::{validate_workspace_id, Chat, Role, Team, User, UserStatus, Workspace};
use crate::repos::sqlite_store::{fetch_chat, fetch_workspace, insert_chat, user_from_row};
use crate::types::{StoreError, StoreResult};

/// Repository for directory database operations
#[derive(Clone)]
pub struct DirectoryRepository {
    pool: SqlitePool,
}

impl DirectoryRepository {
    /// Create a new directory repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        status: UserStatus,
    ) -> StoreResult<User> {
        let user = User {
            id: cuid2::create_id(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            status,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO users (id, email, full_name, status, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.status.as_str())
        .bind(&user.created_at)
        .execute(&self.pool)
        .await?;

        info!(user_id = %user.id, email = %user.email, "user created");
        Ok(user)
    }

    pub async fn find_user_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT id, email, full_name, status, created_at FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    pub async fn set_user_status(&self, user_id: &str, status: UserStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("user", user_id));
        }
        Ok(())
    }

    pub async fn create_workspace(&self, workspace_id: &str, name: &str) -> StoreResult<Workspace> {
        if !validate_workspace_id(workspace_id) {
            return Err(StoreError::Validation(format!(
                "workspace id {workspace_id:?} must be 6-30 characters of a-z, 0-9 or '-'"
            )));
        }

        let created_at = chrono::Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO workspaces (workspace_id, name, logo, created_at) VALUES (?, ?, NULL, ?)")
            .bind(workspace_id)
            .bind(name)
            .bind(&created_at)
            .execute(&self.pool)
            .await?;

        info!(workspace_id, "workspace created");
        Ok(Workspace {
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
            created_at,
            ..Workspace::default()
        })
    }

    pub async fn find_workspace(&self, workspace_id: &str) -> StoreResult<Option<Workspace>> {
        let mut conn = self.pool.acquire().await?;
        fetch_workspace(&mut conn, workspace_id).await
    }

    pub async fn list_workspace_ids(&self) -> StoreResult<Vec<String>> {
        let ids = sqlx::query_scalar("SELECT workspace_id FROM workspaces ORDER BY workspace_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn add_member(&self, workspace_id: &str, user_id: &str, role: Role) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workspace_members (workspace_id, user_id, role) VALUES (?, ?, ?)
            ON CONFLICT (workspace_id, user_id) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn add_pending_member(&self, workspace_id: &str, email: &str, role: Role) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workspace_pending_members (workspace_id, email, role) VALUES (?, ?, ?)
            ON CONFLICT (workspace_id, email) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(workspace_id)
        .bind(email)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn create_team(&self, workspace_id: &str, name: &str, is_first_team: bool) -> StoreResult<Team> {
        let team = Team {
            team_id: cuid2::create_id(),
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
            members: BTreeSet::new(),
            pending_members: BTreeSet::new(),
            is_first_team,
        };

        sqlx::query(
            "INSERT INTO teams (team_id, workspace_id, name, is_first_team, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&team.team_id)
        .bind(workspace_id)
        .bind(name)
        .bind(is_first_team)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        info!(workspace_id, team_id = %team.team_id, team = name, "team created");
        Ok(team)
    }

    pub async fn add_team_member(&self, team_id: &str, user_id: &str) -> StoreResult<()> {
        sqlx::query("INSERT OR IGNORE INTO team_members (team_id, user_id) VALUES (?, ?)")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn add_pending_team_member(&self, team_id: &str, email: &str) -> StoreResult<()> {
        sqlx::query("INSERT OR IGNORE INTO team_pending_members (team_id, email) VALUES (?, ?)")
            .bind(team_id)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn find_team(&self, workspace_id: &str, name: &str) -> StoreResult<Option<Team>> {
        let Some(row) = sqlx::query(
            "SELECT team_id, workspace_id, name, is_first_team FROM teams WHERE workspace_id = ? AND name = ?",
        )
        .bind(workspace_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let team_id: String = row.try_get("team_id")?;
        let members: Vec<String> =
            sqlx::query_scalar("SELECT user_id FROM team_members WHERE team_id = ?")
                .bind(&team_id)
                .fetch_all(&self.pool)
                .await?;
        let pending_members: Vec<String> =
            sqlx::query_scalar("SELECT email FROM team_pending_members WHERE team_id = ?")
                .bind(&team_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(Team {
            team_id,
            workspace_id: row.try_get("workspace_id")?,
            name: row.try_get("name")?,
            members: members.into_iter().collect(),
            pending_members: pending_members.into_iter().collect(),
            is_first_team: row.try_get("is_first_team")?,
        }))
    }

    /// Clear the team reference on every chat that points at `team_id`.
    pub async fn detach_team_from_chats(&self, team_id: &str) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE chats SET team_id = NULL WHERE team_id = ?")
            .bind(team_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete a team after detaching its chats, in one transaction.
    pub async fn delete_team(&self, team_id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE chats SET team_id = NULL WHERE team_id = ?")
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM teams WHERE team_id = ?")
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("team", team_id));
        }

        tx.commit().await?;
        info!(team_id, "team deleted");
        Ok(())
    }

    /// Persist a chat outside the routing flow, e.g. when seeding.
    pub async fn create_chat(&self, chat: &Chat) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_chat(&mut tx, chat).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn add_chat_to_folder(&self, workspace_id: &str, folder_name: &str, chat_id: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO folder_chats (workspace_id, folder_name, chat_id, position)
            VALUES (?, ?, ?, (SELECT COUNT(*) FROM folder_chats WHERE workspace_id = ? AND folder_name = ?))
            "#,
        )
        .bind(workspace_id)
        .bind(folder_name)
        .bind(chat_id)
        .bind(workspace_id)
        .bind(folder_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All chats of a workspace, oldest first.
    pub async fn list_chats(&self, workspace_id: &str) -> StoreResult<Vec<Chat>> {
        let chat_ids: Vec<String> = sqlx::query_scalar(
            "SELECT chat_id FROM chats WHERE workspace_id = ? ORDER BY created_at, chat_id",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let mut chats = Vec::with_capacity(chat_ids.len());
        for chat_id in chat_ids {
            if let Some(chat) = fetch_chat(&mut conn, "chat_id = ?", &[chat_id.as_str()]).await? {
                chats.push(chat);
            }
        }
        Ok(chats)
    }
}
