#![forbid(unsafe_code)]

pub mod admin_service;
pub mod app_services;
pub mod catalog_service;
pub mod config;
pub mod dashboard_service;
pub mod error;
pub mod leaderboard_service;
pub mod profile_service;
pub mod sessions;
pub mod shuffle;

pub use quiz_core::Clock;
pub use sessions as session;

pub use admin_service::{AdminService, ResetReport};
pub use app_services::AppServices;
pub use catalog_service::{CatalogService, TestFilter};
pub use config::{ExpiryPolicy, QuizConfig};
pub use dashboard_service::{DashboardService, StudentDashboard};
pub use error::{
    AppServicesError, CatalogError, ConfigError, ProfileError, SessionError, StatsError,
};
pub use leaderboard_service::{LeaderboardEntry, LeaderboardService};
pub use profile_service::{ProfileService, ProfileUpdate};

pub use sessions::{
    FinishOutcome, SessionEvent, SessionIntent, SessionLoopService, SessionState, SessionView,
    TestSession, TickOutcome,
};
