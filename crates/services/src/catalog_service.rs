use std::sync::Arc;

use quiz_core::model::{Subject, Test, TestDraft, TestId};
use storage::repository::{StorageError, TestRepository};

use crate::error::CatalogError;

/// Optional filters for browsing tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestFilter {
    pub subject: Option<Subject>,
    pub grade: Option<u32>,
}

impl TestFilter {
    #[must_use]
    pub fn matches(&self, test: &Test) -> bool {
        self.subject.is_none_or(|s| s == test.subject())
            && self.grade.is_none_or(|g| g == test.grade())
    }
}

/// Browsing and authoring of tests.
#[derive(Clone)]
pub struct CatalogService {
    tests: Arc<dyn TestRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(tests: Arc<dyn TestRepository>) -> Self {
        Self { tests }
    }

    /// Tests matching `filter`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_tests(&self, filter: TestFilter) -> Result<Vec<Test>, CatalogError> {
        let tests = self.tests.list_tests().await?;
        Ok(tests.into_iter().filter(|t| filter.matches(t)).collect())
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the test does not exist.
    pub async fn get_test(&self, id: TestId) -> Result<Test, CatalogError> {
        self.tests
            .get_test(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Validate and store a new test.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` for validation failures.
    /// Returns `CatalogError::Storage` if persistence fails.
    pub async fn create_test(&self, draft: TestDraft) -> Result<TestId, CatalogError> {
        draft.validate().map_err(quiz_core::Error::from)?;
        let id = self.tests.insert_new_test(&draft).await?;
        tracing::info!(test_id = %id, subject = %draft.subject, "test created");
        Ok(id)
    }

    /// Replace an existing test wholesale.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the test does not exist.
    /// Returns `CatalogError::Invalid` for validation failures.
    pub async fn update_test(&self, id: TestId, draft: TestDraft) -> Result<Test, CatalogError> {
        let test = Test::new(id, draft).map_err(quiz_core::Error::from)?;
        if self.tests.get_test(id).await?.is_none() {
            return Err(CatalogError::NotFound(id));
        }
        self.tests.upsert_test(&test).await?;
        tracing::info!(test_id = %id, "test updated");
        Ok(test)
    }

    /// Create when `id` is `None`, otherwise update.
    ///
    /// # Errors
    ///
    /// See [`Self::create_test`] and [`Self::update_test`].
    pub async fn save_test(
        &self,
        id: Option<TestId>,
        draft: TestDraft,
    ) -> Result<TestId, CatalogError> {
        match id {
            Some(id) => Ok(self.update_test(id, draft).await?.id()),
            None => self.create_test(draft).await,
        }
    }

    /// Delete a test. Results already recorded against it are kept.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the test does not exist.
    pub async fn delete_test(&self, id: TestId) -> Result<(), CatalogError> {
        match self.tests.delete_test(id).await {
            Ok(()) => {
                tracing::info!(test_id = %id, "test deleted");
                Ok(())
            }
            Err(StorageError::NotFound) => Err(CatalogError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }
}
