use std::sync::Arc;

use serde::Serialize;

use quiz_core::model::{User, UserId};
use quiz_core::stats::rank_students;
use storage::repository::UserRepository;

use crate::config::DEFAULT_LEADERBOARD_LIMIT;
use crate::error::StatsError;

/// Number of students shown on the home screen.
pub const HOME_LEADERBOARD_SIZE: usize = 5;

/// One ranked row. `rank` starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
    pub grade: Option<u32>,
    pub points: u32,
}

impl LeaderboardEntry {
    fn from_user(rank: usize, user: &User) -> Self {
        Self {
            rank,
            user_id: user.id(),
            display_name: user.display_name().to_owned(),
            avatar: user.avatar().map(str::to_owned),
            grade: user.grade(),
            points: user.points(),
        }
    }
}

/// Student rankings by accumulated points. Admins are never ranked.
#[derive(Clone)]
pub struct LeaderboardService {
    users: Arc<dyn UserRepository>,
    fetch_limit: u32,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            fetch_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }

    #[must_use]
    pub fn with_fetch_limit(mut self, limit: u32) -> Self {
        self.fetch_limit = limit;
        self
    }

    /// Ranked students, at most `fetch_limit` users read from the store.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn ranked(&self) -> Result<Vec<LeaderboardEntry>, StatsError> {
        let users = self.users.list_users_by_points(self.fetch_limit).await?;
        Ok(rank_students(users)
            .iter()
            .enumerate()
            .map(|(i, user)| LeaderboardEntry::from_user(i + 1, user))
            .collect())
    }

    /// The first `n` ranked students.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn top(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StatsError> {
        let mut entries = self.ranked().await?;
        entries.truncate(n);
        Ok(entries)
    }

    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn home(&self) -> Result<Vec<LeaderboardEntry>, StatsError> {
        self.top(HOME_LEADERBOARD_SIZE).await
    }

    /// 1-based rank of one student, `None` for admins or users outside the
    /// fetched window.
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn rank_of(&self, user_id: UserId) -> Result<Option<usize>, StatsError> {
        Ok(self
            .ranked()
            .await?
            .into_iter()
            .find(|e| e.user_id == user_id)
            .map(|e| e.rank))
    }
}
