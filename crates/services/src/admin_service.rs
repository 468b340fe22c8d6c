use std::sync::Arc;

use quiz_core::model::User;
use quiz_core::stats::rank_students;
use storage::repository::{ResultRepository, ResultRow, UserRepository};

use crate::config::DEFAULT_LEADERBOARD_LIMIT;
use crate::error::StatsError;

/// Default number of rows in the activity feed.
pub const RECENT_ACTIVITY_LIMIT: u32 = 5;

/// Counts from a statistics reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetReport {
    pub results_removed: u64,
    pub users_reset: u64,
}

/// Admin panel queries and maintenance.
#[derive(Clone)]
pub struct AdminService {
    users: Arc<dyn UserRepository>,
    results: Arc<dyn ResultRepository>,
    participant_limit: u32,
}

impl AdminService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, results: Arc<dyn ResultRepository>) -> Self {
        Self {
            users,
            results,
            participant_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }

    #[must_use]
    pub fn with_participant_limit(mut self, limit: u32) -> Self {
        self.participant_limit = limit;
        self
    }

    /// Students ranked by points, admins excluded.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn participants(&self) -> Result<Vec<User>, StatsError> {
        let users = self
            .users
            .list_users_by_points(self.participant_limit)
            .await?;
        Ok(rank_students(users))
    }

    /// Latest results across all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn recent_activity(&self, limit: u32) -> Result<Vec<ResultRow>, StatsError> {
        Ok(self.results.list_recent_results(limit).await?)
    }

    /// Delete every result and zero every user's points.
    ///
    /// Not atomic across the two stores: a failure after clearing results
    /// leaves points untouched, and running the reset again completes it.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if either step fails.
    pub async fn reset_statistics(&self) -> Result<ResetReport, StatsError> {
        let results_removed = self.results.clear_results().await?;
        let users_reset = self.users.reset_points().await?;
        tracing::warn!(results_removed, users_reset, "statistics reset");
        Ok(ResetReport {
            results_removed,
            users_reset,
        })
    }
}
