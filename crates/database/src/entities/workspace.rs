//! Workspace and team entity definitions

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::user::UserStatus;

/// A tenant. Every mapping is present even when empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workspace {
    pub workspace_id: String,
    pub name: String,
    pub logo: Option<String>,
    /// user id -> role
    pub team: BTreeMap<String, Role>,
    /// email -> role
    pub pending_team: BTreeMap<String, Role>,
    /// team name -> team id
    pub internal_teams: BTreeMap<String, String>,
    /// folder name -> ordered chat ids
    pub folders: BTreeMap<String, Vec<String>>,
    pub created_at: String,
}

impl Workspace {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.team.contains_key(user_id)
    }

    pub fn team_id_for(&self, team_name: &str) -> Option<&str> {
        self.internal_teams.get(team_name).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Agent => "agent",
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "owner" => Role::Owner,
            "admin" => Role::Admin,
            _ => Role::Agent,
        }
    }
}

/// A named group of agents inside one workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: String,
    pub workspace_id: String,
    pub name: String,
    pub members: BTreeSet<String>,
    pub pending_members: BTreeSet<String>,
    pub is_first_team: bool,
}

/// A team member together with their current availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub status: UserStatus,
}

/// Workspace ids are slugs: 6-30 characters of `a-z`, `0-9` or `-`.
pub fn validate_workspace_id(workspace_id: &str) -> bool {
    (6..=30).contains(&workspace_id.len())
        && workspace_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
