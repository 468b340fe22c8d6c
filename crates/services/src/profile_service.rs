use std::sync::Arc;

use quiz_core::model::{User, UserId, UserRole};
use storage::repository::{StorageError, UserRepository};

use crate::error::ProfileError;

/// Editable profile fields. Points and role are not part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: String,
    pub grade: Option<u32>,
    pub avatar: Option<String>,
}

/// Registration and self-service profile edits.
#[derive(Clone)]
pub struct ProfileService {
    users: Arc<dyn UserRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Create a student profile with zero points.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::AlreadyRegistered` if the id is taken and
    /// `ProfileError::Invalid` for a blank name or a zero grade.
    pub async fn register(
        &self,
        id: UserId,
        profile: ProfileUpdate,
    ) -> Result<User, ProfileError> {
        let user = User::new(
            id,
            UserRole::Student,
            profile.display_name,
            profile.grade,
            profile.avatar,
        )
        .map_err(quiz_core::Error::from)?;

        match self.users.insert_new_user(&user).await {
            Ok(()) => {}
            Err(StorageError::Conflict) => return Err(ProfileError::AlreadyRegistered(id)),
            Err(err) => return Err(err.into()),
        }
        tracing::info!(user_id = %id, "user registered");
        Ok(user)
    }

    /// Replace name, grade and avatar. Accumulated points are untouched even
    /// if they changed since the caller last read the profile.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::UserNotFound` if the user does not exist and
    /// `ProfileError::Invalid` for a blank name or a zero grade.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, ProfileError> {
        let current = self.load(id).await?;
        let edited = current
            .with_profile(update.display_name, update.grade, update.avatar)
            .map_err(quiz_core::Error::from)?;

        match self.users.update_profile(&edited).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(ProfileError::UserNotFound(id)),
            Err(err) => return Err(err.into()),
        }
        tracing::info!(user_id = %id, "profile updated");

        // Re-read so the returned points are the stored ones.
        self.load(id).await
    }

    /// # Errors
    ///
    /// Returns `ProfileError::UserNotFound` if the user does not exist.
    pub async fn profile(&self, id: UserId) -> Result<User, ProfileError> {
        self.load(id).await
    }

    async fn load(&self, id: UserId) -> Result<User, ProfileError> {
        self.users
            .get_user(id)
            .await?
            .ok_or(ProfileError::UserNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    fn update(name: &str, grade: Option<u32>, avatar: Option<&str>) -> ProfileUpdate {
        ProfileUpdate {
            display_name: name.into(),
            grade,
            avatar: avatar.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn registration_starts_a_student_at_zero_points() {
        let repo = InMemoryRepository::new();
        let svc = ProfileService::new(Arc::new(repo));

        let user = svc
            .register(UserId::new(8), update("Ali", Some(6), Some("👦")))
            .await
            .unwrap();
        assert_eq!(user.points(), 0);
        assert!(!user.is_admin());

        let err = svc
            .register(UserId::new(8), update("Ali", Some(6), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::AlreadyRegistered(id) if id == UserId::new(8)));

        let err = svc
            .register(UserId::new(9), update(" ", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::Invalid(_)));
    }

    #[tokio::test]
    async fn profile_edit_after_credit_keeps_points() {
        let repo = InMemoryRepository::new();
        let svc = ProfileService::new(Arc::new(repo.clone()));
        let id = UserId::new(3);
        svc.register(id, update("Guli", Some(1), None))
            .await
            .unwrap();

        repo.credit_points(id, 10).await.unwrap();

        let edited = svc
            .update_profile(id, update("Gulnora", Some(2), Some("👧")))
            .await
            .unwrap();
        assert_eq!(edited.display_name(), "Gulnora");
        assert_eq!(edited.grade(), Some(2));
        assert_eq!(edited.avatar(), Some("👧"));
        assert_eq!(edited.points(), 10);
        assert_eq!(svc.profile(id).await.unwrap().points(), 10);
    }

    #[tokio::test]
    async fn editing_an_unknown_user_is_not_found() {
        let svc = ProfileService::new(Arc::new(InMemoryRepository::new()));
        let err = svc
            .update_profile(UserId::new(1), update("X", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::UserNotFound(_)));
    }
}
