use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::admin_service::AdminService;
use crate::catalog_service::CatalogService;
use crate::config::QuizConfig;
use crate::dashboard_service::DashboardService;
use crate::error::AppServicesError;
use crate::leaderboard_service::LeaderboardService;
use crate::profile_service::ProfileService;
use crate::sessions::SessionLoopService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    session_loop: Arc<SessionLoopService>,
    catalog: Arc<CatalogService>,
    leaderboard: Arc<LeaderboardService>,
    dashboard: Arc<DashboardService>,
    admin: Arc<AdminService>,
    profiles: Arc<ProfileService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage at `config.db_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(config: &QuizConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.db_url).await?;
        Ok(Self::from_storage(&storage, config, clock))
    }

    /// Build services from the environment (`QUIZ_*` variables).
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` for invalid configuration or storage failures.
    pub async fn from_env(clock: Clock) -> Result<Self, AppServicesError> {
        let config = QuizConfig::from_env()?;
        Self::new_sqlite(&config, clock).await
    }

    /// Services over the in-memory store (offline mode and tests).
    #[must_use]
    pub fn in_memory(config: &QuizConfig, clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), config, clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, config: &QuizConfig, clock: Clock) -> Self {
        let session_loop = Arc::new(
            SessionLoopService::new(
                clock,
                Arc::clone(&storage.tests),
                Arc::clone(&storage.results),
                Arc::clone(&storage.users),
            )
            .with_expiry_policy(config.expiry_policy),
        );
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.tests)));
        let leaderboard = Arc::new(
            LeaderboardService::new(Arc::clone(&storage.users))
                .with_fetch_limit(config.leaderboard_limit),
        );
        let dashboard = Arc::new(DashboardService::new(
            Arc::clone(&storage.users),
            Arc::clone(&storage.results),
        ));
        let admin = Arc::new(
            AdminService::new(Arc::clone(&storage.users), Arc::clone(&storage.results))
                .with_participant_limit(config.leaderboard_limit),
        );
        let profiles = Arc::new(ProfileService::new(Arc::clone(&storage.users)));

        tracing::debug!(
            expiry_policy = ?config.expiry_policy,
            leaderboard_limit = config.leaderboard_limit,
            "app services assembled"
        );

        Self {
            session_loop,
            catalog,
            leaderboard,
            dashboard,
            admin,
            profiles,
        }
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn admin(&self) -> Arc<AdminService> {
        Arc::clone(&self.admin)
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfileService> {
        Arc::clone(&self.profiles)
    }
}
