//! Inbox services.

pub mod balancer;
pub mod membership;
pub mod note_service;
pub mod reassignment_service;
pub mod status_service;

pub use balancer::{select_least_busy, ActiveTicketCounter, TransactionTicketCounter};
pub use note_service::{NoteKind, NoteService};
pub use reassignment_service::{ReassignmentOutcome, ReassignmentService};
pub use status_service::{StatusChange, TicketStatusService};

use frontdesk_database::InboxTransaction;
use tracing::warn;

use crate::types::InboxResult;

/// Commit `tx` if `outcome` succeeded, otherwise roll it back and hand the
/// original error back.
pub(crate) async fn finish<Tx, T>(tx: Tx, outcome: InboxResult<T>) -> InboxResult<T>
where
    Tx: InboxTransaction,
{
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
