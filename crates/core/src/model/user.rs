use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("display name cannot be empty")]
    EmptyDisplayName,

    #[error("grade must be > 0")]
    InvalidGrade,

    #[error("invalid user role: {0}")]
    InvalidRole(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[serde(rename = "user")]
    Student,
    Admin,
}

impl UserRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Student => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::Student),
            "admin" => Ok(UserRole::Admin),
            other => Err(UserError::InvalidRole(other.to_owned())),
        }
    }
}

/// A participant profile with accumulated points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    role: UserRole,
    display_name: String,
    grade: Option<u32>,
    avatar: Option<String>,
    points: u32,
}

impl User {
    /// Creates a profile with zero points.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if the display name is blank or the grade is zero.
    pub fn new(
        id: UserId,
        role: UserRole,
        display_name: impl Into<String>,
        grade: Option<u32>,
        avatar: Option<String>,
    ) -> Result<Self, UserError> {
        Self::from_persisted(id, role, display_name, grade, avatar, 0)
    }

    /// Rehydrate a profile from storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError` on the same conditions as [`User::new`].
    pub fn from_persisted(
        id: UserId,
        role: UserRole,
        display_name: impl Into<String>,
        grade: Option<u32>,
        avatar: Option<String>,
        points: u32,
    ) -> Result<Self, UserError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(UserError::EmptyDisplayName);
        }
        if grade == Some(0) {
            return Err(UserError::InvalidGrade);
        }
        Ok(Self {
            id,
            role,
            display_name,
            grade,
            avatar,
            points,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn role(&self) -> UserRole {
        self.role
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn grade(&self) -> Option<u32> {
        self.grade
    }

    #[must_use]
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Copy of this profile with new editable fields. Id, role and points
    /// carry over.
    ///
    /// # Errors
    ///
    /// Returns `UserError` on the same conditions as [`User::new`].
    pub fn with_profile(
        &self,
        display_name: impl Into<String>,
        grade: Option<u32>,
        avatar: Option<String>,
    ) -> Result<Self, UserError> {
        Self::from_persisted(
            self.id,
            self.role,
            display_name,
            grade,
            avatar,
            self.points,
        )
    }

    /// Adds earned points. Saturates instead of wrapping.
    pub fn credit(&mut self, delta: u32) -> u32 {
        self.points = self.points.saturating_add(delta);
        self.points
    }

    /// Maintenance-only: zero the accumulated points.
    pub fn reset_points(&mut self) {
        self.points = 0;
    }
}
