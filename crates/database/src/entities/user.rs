//! User entity definitions

use serde::{Deserialize, Serialize};

/// An agent that can be a workspace member and a ticket assignee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub status: UserStatus,
    pub created_at: String,
}

/// Availability as reported by the agent's client.
///
/// Declaration order is the order the load balancer walks the tiers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Available,
    Busy,
    Offline,
}

impl UserStatus {
    pub const TIERS: [UserStatus; 3] = [UserStatus::Available, UserStatus::Busy, UserStatus::Offline];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Available => "available",
            UserStatus::Busy => "busy",
            UserStatus::Offline => "offline",
        }
    }
}

impl From<&str> for UserStatus {
    fn from(s: &str) -> Self {
        match s {
            "available" => UserStatus::Available,
            "busy" => UserStatus::Busy,
            _ => UserStatus::Offline,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
