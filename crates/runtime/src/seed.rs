//! Demo data for local development.

use anyhow::{Context, Result};
use frontdesk_database::{Chat, DirectoryRepository, Role, Ticket, UserStatus};
use tracing::info;

pub const DEMO_WORKSPACE: &str = "acme-support";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: bool,
    pub users: usize,
    pub teams: usize,
    pub chats: usize,
}

/// Create the demo workspace unless it already exists.
pub async fn seed_demo_data(directory: &DirectoryRepository) -> Result<SeedSummary> {
    if directory
        .find_workspace(DEMO_WORKSPACE)
        .await
        .context("failed to look up demo workspace")?
        .is_some()
    {
        info!(workspace_id = DEMO_WORKSPACE, "demo workspace already present");
        return Ok(SeedSummary {
            created: false,
            users: 0,
            teams: 0,
            chats: 0,
        });
    }

    directory
        .create_workspace(DEMO_WORKSPACE, "Acme Support")
        .await
        .context("failed to create demo workspace")?;

    let people = [
        ("owner@acme.test", "Olivia Owner", UserStatus::Available, Role::Owner),
        ("alice@acme.test", "Alice Agent", UserStatus::Available, Role::Agent),
        ("bob@acme.test", "Bob Agent", UserStatus::Busy, Role::Agent),
        ("carol@acme.test", "Carol Admin", UserStatus::Offline, Role::Admin),
    ];
    let mut users = Vec::with_capacity(people.len());
    for (email, name, status, role) in people {
        let user = directory
            .create_user(email, name, status)
            .await
            .with_context(|| format!("failed to create user {email}"))?;
        directory
            .add_member(DEMO_WORKSPACE, &user.id, role)
            .await
            .with_context(|| format!("failed to add {email} to workspace"))?;
        users.push(user);
    }
    directory
        .add_pending_member(DEMO_WORKSPACE, "dave@acme.test", Role::Agent)
        .await
        .context("failed to invite pending member")?;

    let support = directory
        .create_team(DEMO_WORKSPACE, "Support", true)
        .await
        .context("failed to create Support team")?;
    for user in &users[1..] {
        directory
            .add_team_member(&support.team_id, &user.id)
            .await
            .context("failed to add Support member")?;
    }
    let billing = directory
        .create_team(DEMO_WORKSPACE, "Billing", false)
        .await
        .context("failed to create Billing team")?;
    directory
        .add_team_member(&billing.team_id, &users[3].id)
        .await
        .context("failed to add Billing member")?;
    directory
        .add_pending_team_member(&billing.team_id, "dave@acme.test")
        .await
        .context("failed to invite Billing member")?;

    let owner = &users[0];
    let mut first = Chat::seeded(
        DEMO_WORKSPACE,
        "tg-1001",
        "telegram",
        Some(owner.id.clone()),
        Ticket::open("T-1001"),
    );
    first.tickets.push(Ticket::open("T-1002"));
    let second = Chat::seeded(
        DEMO_WORKSPACE,
        "wa-2002",
        "whatsapp",
        Some(users[1].id.clone()),
        Ticket::open("T-2001"),
    );

    for chat in [&first, &second] {
        directory
            .create_chat(chat)
            .await
            .with_context(|| format!("failed to create chat for {}", chat.source_client_id))?;
        directory
            .add_chat_to_folder(DEMO_WORKSPACE, "Inbox", &chat.chat_id)
            .await
            .context("failed to file chat")?;
    }

    info!(workspace_id = DEMO_WORKSPACE, "demo data seeded");
    Ok(SeedSummary {
        created: true,
        users: users.len(),
        teams: 2,
        chats: 2,
    })
}
