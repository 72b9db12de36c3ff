//! Least-busy assignee selection for team reassignments.
//!
//! Members are considered tier by tier (available, then busy, then offline).
//! Inside the first tier that yields a candidate, the member with the fewest
//! non-closed tickets wins; ties go to the lexicographically smallest user id.

use async_trait::async_trait;
use frontdesk_database::{InboxTransaction, StoreResult, TeamMember, UserStatus};
use tracing::{debug, warn};

use crate::types::{InboxError, InboxResult};

/// Source of active-ticket counts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActiveTicketCounter: Send {
    async fn count_active_tickets(&mut self, user_id: &str) -> StoreResult<i64>;
}

/// Counts tickets on the connection of an open reassignment transaction,
/// so selecting an assignee never waits for another pooled connection.
pub struct TransactionTicketCounter<'a, T: ?Sized> {
    tx: &'a mut T,
}

impl<'a, T: InboxTransaction + ?Sized> TransactionTicketCounter<'a, T> {
    pub fn new(tx: &'a mut T) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl<'a, T: InboxTransaction + ?Sized> ActiveTicketCounter for TransactionTicketCounter<'a, T> {
    async fn count_active_tickets(&mut self, user_id: &str) -> StoreResult<i64> {
        self.tx.count_active_tickets(user_id).await
    }
}

pub async fn select_least_busy<C>(
    counter: &mut C,
    team_name: &str,
    members: &[TeamMember],
) -> InboxResult<String>
where
    C: ActiveTicketCounter + ?Sized,
{
    for tier in UserStatus::TIERS {
        let mut candidates: Vec<&str> = members
            .iter()
            .filter(|member| member.status == tier)
            .map(|member| member.user_id.as_str())
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let mut best: Option<(&str, i64)> = None;
        for user_id in candidates {
            match counter.count_active_tickets(user_id).await {
                Ok(count) => {
                    if best.map_or(true, |(_, lowest)| count < lowest) {
                        best = Some((user_id, count));
                    }
                }
                Err(err) => {
                    warn!(user_id, team = team_name, error = %err, "skipping member, ticket count unavailable");
                }
            }
        }

        if let Some((user_id, count)) = best {
            debug!(user_id, count, tier = %tier, team = team_name, "least busy member selected");
            return Ok(user_id.to_string());
        }
    }

    Err(InboxError::NoEligibleAssignee {
        team: team_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_database::StoreError;

    fn member(user_id: &str, status: UserStatus) -> TeamMember {
        TeamMember {
            user_id: user_id.to_string(),
            status,
        }
    }

    fn counter_with(counts: &'static [(&'static str, Option<i64>)]) -> MockActiveTicketCounter {
        let mut counter = MockActiveTicketCounter::new();
        counter
            .expect_count_active_tickets()
            .returning(move |user_id| lookup(counts, user_id));
        counter
    }

    fn lookup(counts: &[(&str, Option<i64>)], user_id: &str) -> StoreResult<i64> {
        match counts.iter().find(|(id, _)| *id == user_id) {
            Some((_, Some(count))) => Ok(*count),
            _ => Err(StoreError::Backend(format!("no count for {user_id}"))),
        }
    }

    #[tokio::test]
    async fn available_tier_wins_even_when_busier() {
        let mut counter = counter_with(&[("a", Some(5)), ("b", Some(0))]);
        let members = [member("a", UserStatus::Available), member("b", UserStatus::Busy)];

        let chosen = select_least_busy(&mut counter, "Support", &members).await.unwrap();
        assert_eq!(chosen, "a");
    }

    #[tokio::test]
    async fn minimum_count_wins_within_tier() {
        let mut counter = counter_with(&[("a", Some(3)), ("b", Some(1))]);
        let members = [member("a", UserStatus::Available), member("b", UserStatus::Available)];

        let chosen = select_least_busy(&mut counter, "Support", &members).await.unwrap();
        assert_eq!(chosen, "b");
    }

    #[tokio::test]
    async fn ties_go_to_smallest_user_id() {
        let mut counter = counter_with(&[("zed", Some(2)), ("amy", Some(2)), ("kim", Some(2))]);
        let members = [
            member("zed", UserStatus::Busy),
            member("kim", UserStatus::Busy),
            member("amy", UserStatus::Busy),
        ];

        let chosen = select_least_busy(&mut counter, "Support", &members).await.unwrap();
        assert_eq!(chosen, "amy");
    }

    #[tokio::test]
    async fn failed_counts_fall_through_to_next_tier() {
        let mut counter = counter_with(&[("a", None), ("b", Some(9))]);
        let members = [member("a", UserStatus::Available), member("b", UserStatus::Offline)];

        let chosen = select_least_busy(&mut counter, "Support", &members).await.unwrap();
        assert_eq!(chosen, "b");
    }

    #[tokio::test]
    async fn failed_count_skips_only_that_member() {
        let mut counter = counter_with(&[("a", None), ("b", Some(4))]);
        let members = [member("a", UserStatus::Available), member("b", UserStatus::Available)];

        let chosen = select_least_busy(&mut counter, "Support", &members).await.unwrap();
        assert_eq!(chosen, "b");
    }

    #[tokio::test]
    async fn empty_team_has_no_eligible_assignee() {
        let mut counter = MockActiveTicketCounter::new();
        counter.expect_count_active_tickets().never();

        let err = select_least_busy(&mut counter, "Ghosts", &[]).await.unwrap_err();
        assert!(matches!(err, InboxError::NoEligibleAssignee { ref team } if team == "Ghosts"));
    }

    #[tokio::test]
    async fn exhausted_tiers_have_no_eligible_assignee() {
        let mut counter = counter_with(&[]);
        let members = [member("a", UserStatus::Available), member("b", UserStatus::Offline)];

        let err = select_least_busy(&mut counter, "Support", &members).await.unwrap_err();
        assert!(matches!(err, InboxError::NoEligibleAssignee { .. }));
    }
}
