use std::sync::Arc;

use rand::Rng;

use quiz_core::model::{TestId, UserId};
use storage::repository::{ResultRepository, TestRepository, UserRepository};

use super::service::{FinishOutcome, TestSession, TickOutcome};
use super::view::{SessionEvent, SessionIntent};
use crate::Clock;
use crate::config::ExpiryPolicy;
use crate::error::SessionError;

/// Orchestrates session start, intent dispatch and the finish protocol.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    tests: Arc<dyn TestRepository>,
    results: Arc<dyn ResultRepository>,
    users: Arc<dyn UserRepository>,
    expiry_policy: ExpiryPolicy,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        tests: Arc<dyn TestRepository>,
        results: Arc<dyn ResultRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            clock,
            tests,
            results,
            users,
            expiry_policy: ExpiryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    #[must_use]
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry_policy
    }

    /// Load a test and start a shuffled session for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TestNotFound` if the test does not exist and
    /// `SessionError::Storage` if the lookup fails.
    pub async fn start_session(
        &self,
        test_id: TestId,
        user_id: UserId,
    ) -> Result<TestSession, SessionError> {
        let test = self.load_test(test_id).await?;
        let session = {
            let mut rng = rand::rng();
            TestSession::start(test, user_id, &mut rng, self.clock.now())?
        };
        tracing::info!(test_id = %test_id, user_id = %user_id, "session started");
        Ok(session)
    }

    /// Same as [`Self::start_session`] with a caller-provided random source.
    ///
    /// # Errors
    ///
    /// See [`Self::start_session`].
    pub async fn start_session_with_rng<R: Rng + ?Sized>(
        &self,
        test_id: TestId,
        user_id: UserId,
        rng: &mut R,
    ) -> Result<TestSession, SessionError> {
        let test = self.load_test(test_id).await?;
        TestSession::start(test, user_id, rng, self.clock.now())
    }

    async fn load_test(&self, test_id: TestId) -> Result<quiz_core::model::Test, SessionError> {
        self.tests
            .get_test(test_id)
            .await?
            .ok_or(SessionError::TestNotFound(test_id))
    }

    /// Score, persist and credit the session. Safe to call repeatedly.
    ///
    /// A finished session returns its stored outcome without touching the
    /// store. After a failed credit the retry reuses the stored result id.
    /// If a previous call was dropped mid-append the session is still
    /// submitting, and the retry replays the same submission key, so the
    /// store keeps a single result.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PersistResult` (session back to active) or
    /// `SessionError::CreditPoints` (session stays submitting); both are
    /// retryable.
    pub async fn finish(&self, session: &mut TestSession) -> Result<FinishOutcome, SessionError> {
        if let Some(outcome) = session.outcome() {
            return Ok(outcome.clone());
        }

        let pending = session.begin_submission(self.clock.now())?;

        let result_id = match pending.result_id {
            Some(id) => id,
            None => match self
                .results
                .append_result(pending.key, &pending.result)
                .await
            {
                Ok(id) => {
                    session.record_result_id(id);
                    id
                }
                Err(err) => {
                    tracing::warn!(
                        test_id = %pending.result.test_id(),
                        user_id = %pending.result.user_id(),
                        error = %err,
                        "result persist failed"
                    );
                    session.abort_submission();
                    return Err(SessionError::PersistResult(err));
                }
            },
        };

        let points = pending.result.points();
        let total_points = self
            .users
            .credit_points(pending.result.user_id(), points)
            .await
            .map_err(|err| {
                tracing::warn!(
                    result_id = %result_id,
                    user_id = %pending.result.user_id(),
                    error = %err,
                    "points credit failed"
                );
                SessionError::CreditPoints(err)
            })?;

        tracing::info!(
            result_id = %result_id,
            score = pending.result.score(),
            total = pending.result.total_questions(),
            points,
            "session finished"
        );

        let outcome = FinishOutcome {
            result_id,
            result: pending.result,
            points_awarded: points,
            total_points,
        };
        session.complete(outcome.clone());
        Ok(outcome)
    }

    /// Advance the countdown by one second, auto-submitting on expiry when
    /// configured to.
    ///
    /// # Errors
    ///
    /// Propagates `finish` errors under `ExpiryPolicy::AutoSubmit`.
    pub async fn tick(&self, session: &mut TestSession) -> Result<SessionEvent, SessionError> {
        match session.tick() {
            TickOutcome::Running => Ok(SessionEvent::Updated),
            TickOutcome::Stopped => Ok(SessionEvent::Unchanged),
            TickOutcome::Expired => match self.expiry_policy {
                ExpiryPolicy::AutoSubmit => {
                    tracing::debug!(test_id = %session.test().id(), "time expired, submitting");
                    Ok(SessionEvent::Finished(self.finish(session).await?))
                }
                ExpiryPolicy::AllowOvertime => Ok(SessionEvent::Overtime),
            },
        }
    }

    /// Route a presentation intent to the session.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying session operation.
    pub async fn dispatch(
        &self,
        session: &mut TestSession,
        intent: SessionIntent,
    ) -> Result<SessionEvent, SessionError> {
        let changed = |moved: bool| {
            if moved {
                SessionEvent::Updated
            } else {
                SessionEvent::Unchanged
            }
        };
        match intent {
            SessionIntent::SelectOption(index) => {
                session.select_option(index)?;
                Ok(SessionEvent::Updated)
            }
            SessionIntent::Next => Ok(changed(session.advance()?)),
            SessionIntent::Previous => Ok(changed(session.retreat()?)),
            SessionIntent::Submit => Ok(SessionEvent::Finished(self.finish(session).await?)),
            SessionIntent::Tick => self.tick(session).await,
        }
    }
}
