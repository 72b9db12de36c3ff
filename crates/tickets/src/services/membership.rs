//! Workspace membership checks.
//!
//! Membership is presence in the workspace's `team` mapping; roles are
//! recorded there but every member may route tickets and write notes.

use frontdesk_database::{InboxStore, Workspace};

use crate::types::{InboxError, InboxResult};

pub fn authorize(user_id: &str, workspace: &Workspace) -> InboxResult<()> {
    if workspace.is_member(user_id) {
        Ok(())
    } else {
        Err(InboxError::unauthorized(user_id, &workspace.workspace_id))
    }
}

/// Resolve the workspace outside any transaction and authorize against it.
pub async fn authorize_by_id<S: InboxStore + ?Sized>(
    store: &S,
    user_id: &str,
    workspace_id: &str,
) -> InboxResult<Workspace> {
    let workspace = store
        .find_workspace_by_workspace_id(workspace_id)
        .await?
        .ok_or_else(|| InboxError::not_found("workspace", workspace_id))?;
    authorize(user_id, &workspace)?;
    Ok(workspace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_database::Role;

    fn workspace_with(members: &[(&str, Role)]) -> Workspace {
        let mut workspace = Workspace {
            workspace_id: "acme-support".into(),
            ..Workspace::default()
        };
        for (user_id, role) in members {
            workspace.team.insert(user_id.to_string(), *role);
        }
        workspace
    }

    #[test]
    fn every_role_is_authorized() {
        let workspace = workspace_with(&[
            ("owner", Role::Owner),
            ("admin", Role::Admin),
            ("agent", Role::Agent),
        ]);

        for user in ["owner", "admin", "agent"] {
            assert!(authorize(user, &workspace).is_ok());
        }
    }

    #[test]
    fn non_members_are_rejected() {
        let mut workspace = workspace_with(&[("agent", Role::Agent)]);
        workspace
            .pending_team
            .insert("invited@acme.test".into(), Role::Agent);

        let err = authorize("stranger", &workspace).unwrap_err();
        assert!(matches!(err, InboxError::Unauthorized { .. }));
        assert!(authorize("invited@acme.test", &workspace).is_err());
    }
}
