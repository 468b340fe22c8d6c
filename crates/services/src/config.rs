use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_DB_URL: &str = "sqlite:quiz.sqlite3";
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 50;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// What happens when the countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpiryPolicy {
    /// Finish the session on the tick that expires it.
    #[default]
    AutoSubmit,
    /// Keep accepting answers; the countdown stays at zero.
    AllowOvertime,
}

impl FromStr for ExpiryPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "submit" | "auto-submit" => Ok(Self::AutoSubmit),
            "overtime" | "allow-overtime" => Ok(Self::AllowOvertime),
            _ => Err(ConfigError::Invalid {
                key: "QUIZ_ON_TIMEOUT",
                value: s.to_owned(),
            }),
        }
    }
}

/// Runtime settings for the quiz services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizConfig {
    pub db_url: String,
    pub expiry_policy: ExpiryPolicy,
    pub leaderboard_limit: u32,
    pub log_filter: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_owned(),
            expiry_policy: ExpiryPolicy::default(),
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl QuizConfig {
    /// Load `.env` if present, then read `QUIZ_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys use defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a value is empty or cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("QUIZ_DB_URL") {
            if url.trim().is_empty() {
                return Err(ConfigError::Empty { key: "QUIZ_DB_URL" });
            }
            config.db_url = url;
        }

        if let Some(raw) = lookup("QUIZ_ON_TIMEOUT") {
            config.expiry_policy = raw.parse()?;
        }

        if let Some(raw) = lookup("QUIZ_LEADERBOARD_LIMIT") {
            config.leaderboard_limit = match raw.trim().parse::<u32>() {
                Ok(limit) if limit > 0 => limit,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "QUIZ_LEADERBOARD_LIMIT",
                        value: raw,
                    });
                }
            };
        }

        if let Some(filter) = lookup("QUIZ_LOG").filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }

        Ok(config)
    }
}
