use async_trait::async_trait;
use quiz_core::model::{
    ResultId, SubmissionKey, Test, TestDraft, TestId, TestResult, User, UserId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted result together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub id: ResultId,
    pub result: TestResult,
}

impl ResultRow {
    #[must_use]
    pub fn new(id: ResultId, result: TestResult) -> Self {
        Self { id, result }
    }
}

/// Repository contract for test definitions.
#[async_trait]
pub trait TestRepository: Send + Sync {
    /// Point lookup of a test.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing test is `Ok(None)`.
    async fn get_test(&self, id: TestId) -> Result<Option<Test>, StorageError>;

    /// All tests, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_tests(&self) -> Result<Vec<Test>, StorageError>;

    /// Store a new test and return its assigned id. Ids of deleted tests are
    /// never handed out again.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the test cannot be stored.
    async fn insert_new_test(&self, draft: &TestDraft) -> Result<TestId, StorageError>;

    /// Persist or replace a test.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the test cannot be stored.
    async fn upsert_test(&self, test: &Test) -> Result<(), StorageError>;

    /// Delete a test. Results referencing it are kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the test does not exist.
    async fn delete_test(&self, id: TestId) -> Result<(), StorageError>;
}

/// Repository contract for finished attempts.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a result and return its id.
    ///
    /// Idempotent per `key`: replaying a key returns the id stored by the
    /// first append and leaves the store unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(
        &self,
        key: SubmissionKey,
        result: &TestResult,
    ) -> Result<ResultId, StorageError>;

    /// Results of one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_user_results(&self, user_id: UserId) -> Result<Vec<ResultRow>, StorageError>;

    /// Latest results across all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_recent_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError>;

    /// Remove every result. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn clear_results(&self) -> Result<u64, StorageError>;
}

/// Repository contract for user profiles and points.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing user is `Ok(None)`.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Persist or replace a whole profile, points included. Used for seeding;
    /// profile edits go through [`UserRepository::update_profile`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_user(&self, user: &User) -> Result<(), StorageError>;

    /// Store a profile under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is taken.
    async fn insert_new_user(&self, user: &User) -> Result<(), StorageError>;

    /// Overwrite the editable fields (display name, grade, avatar). Role and
    /// points are left as stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn update_profile(&self, user: &User) -> Result<(), StorageError>;

    /// Add `delta` points to a user and return the new total.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist.
    async fn credit_points(&self, id: UserId, delta: u32) -> Result<u32, StorageError>;

    /// Users ordered by points descending (ties by id), at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_users_by_points(&self, limit: u32) -> Result<Vec<User>, StorageError>;

    /// Set every user's points to zero. Returns how many users were touched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn reset_points(&self) -> Result<u64, StorageError>;
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn limit_to_usize(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

fn newest_first(rows: &mut [ResultRow]) {
    rows.sort_by(|a, b| {
        b.result
            .completed_at()
            .cmp(&a.result.completed_at())
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[derive(Default)]
struct TestTable {
    rows: BTreeMap<TestId, Test>,
    // Highest id ever stored; survives deletes.
    last_id: u64,
}

#[derive(Default)]
struct ResultLog {
    rows: Vec<ResultRow>,
    last_id: u64,
    by_key: HashMap<SubmissionKey, ResultId>,
}

/// In-memory store standing in for the hosted document store.
///
/// Used by tests and by the offline variant of the app.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tests: Arc<Mutex<TestTable>>,
    results: Arc<Mutex<ResultLog>>,
    users: Arc<Mutex<BTreeMap<UserId, User>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TestRepository for InMemoryRepository {
    async fn get_test(&self, id: TestId) -> Result<Option<Test>, StorageError> {
        let guard = self.tests.lock().map_err(poisoned)?;
        Ok(guard.rows.get(&id).cloned())
    }

    async fn list_tests(&self) -> Result<Vec<Test>, StorageError> {
        let guard = self.tests.lock().map_err(poisoned)?;
        Ok(guard.rows.values().cloned().collect())
    }

    async fn insert_new_test(&self, draft: &TestDraft) -> Result<TestId, StorageError> {
        let mut guard = self.tests.lock().map_err(poisoned)?;
        let id = TestId::new(guard.last_id + 1);
        let test = Test::new(id, draft.clone())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.last_id = id.value();
        guard.rows.insert(id, test);
        Ok(id)
    }

    async fn upsert_test(&self, test: &Test) -> Result<(), StorageError> {
        let mut guard = self.tests.lock().map_err(poisoned)?;
        guard.last_id = guard.last_id.max(test.id().value());
        guard.rows.insert(test.id(), test.clone());
        Ok(())
    }

    async fn delete_test(&self, id: TestId) -> Result<(), StorageError> {
        let mut guard = self.tests.lock().map_err(poisoned)?;
        guard.rows.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(
        &self,
        key: SubmissionKey,
        result: &TestResult,
    ) -> Result<ResultId, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        if let Some(id) = guard.by_key.get(&key) {
            return Ok(*id);
        }
        guard.last_id += 1;
        let id = ResultId::new(guard.last_id);
        guard.rows.push(ResultRow::new(id, result.clone()));
        guard.by_key.insert(key, id);
        Ok(id)
    }

    async fn list_user_results(&self, user_id: UserId) -> Result<Vec<ResultRow>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let mut rows: Vec<ResultRow> = guard
            .rows
            .iter()
            .filter(|row| row.result.user_id() == user_id)
            .cloned()
            .collect();
        newest_first(&mut rows);
        Ok(rows)
    }

    async fn list_recent_results(&self, limit: u32) -> Result<Vec<ResultRow>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let mut rows = guard.rows.clone();
        newest_first(&mut rows);
        rows.truncate(limit_to_usize(limit));
        Ok(rows)
    }

    async fn clear_results(&self) -> Result<u64, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        let removed = guard.rows.len() as u64;
        guard.rows.clear();
        guard.by_key.clear();
        Ok(removed)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        guard.insert(user.id(), user.clone());
        Ok(())
    }

    async fn insert_new_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        if guard.contains_key(&user.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(user.id(), user.clone());
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        let stored = guard.get_mut(&user.id()).ok_or(StorageError::NotFound)?;
        *stored = stored
            .with_profile(
                user.display_name(),
                user.grade(),
                user.avatar().map(str::to_owned),
            )
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(())
    }

    async fn credit_points(&self, id: UserId, delta: u32) -> Result<u32, StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        let user = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        Ok(user.credit(delta))
    }

    async fn list_users_by_points(&self, limit: u32) -> Result<Vec<User>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        let mut users: Vec<User> = guard.values().cloned().collect();
        users.sort_by(|a, b| b.points().cmp(&a.points()));
        users.truncate(limit_to_usize(limit));
        Ok(users)
    }

    async fn reset_points(&self) -> Result<u64, StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        for user in guard.values_mut() {
            user.reset_points();
        }
        Ok(guard.len() as u64)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub tests: Arc<dyn TestRepository>,
    pub results: Arc<dyn ResultRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            tests: Arc::new(repo.clone()),
            results: Arc::new(repo.clone()),
            users: Arc::new(repo),
        }
    }
}
