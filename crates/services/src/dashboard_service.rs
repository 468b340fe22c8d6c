use std::sync::Arc;

use quiz_core::model::{User, UserId};
use quiz_core::stats::{
    CertificateProgress, SubjectAverage, average_percent, certificate_progress, subject_averages,
};
use storage::repository::{ResultRepository, ResultRow, UserRepository};

use crate::error::StatsError;

/// Results shown in a student's recent history.
pub const RECENT_RESULTS: usize = 5;

/// Everything the student home screen needs in one read.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDashboard {
    pub user: User,
    pub tests_taken: usize,
    pub average_percent: u32,
    pub subject_averages: Vec<SubjectAverage>,
    pub recent: Vec<ResultRow>,
    pub certificate: CertificateProgress,
}

/// Per-student aggregation over stored results.
#[derive(Clone)]
pub struct DashboardService {
    users: Arc<dyn UserRepository>,
    results: Arc<dyn ResultRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, results: Arc<dyn ResultRepository>) -> Self {
        Self { users, results }
    }

    /// # Errors
    ///
    /// Returns `StatsError::UserNotFound` for an unknown user.
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn student_dashboard(&self, user_id: UserId) -> Result<StudentDashboard, StatsError> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(StatsError::UserNotFound(user_id))?;
        let rows = self.results.list_user_results(user_id).await?;
        let results: Vec<_> = rows.iter().map(|row| row.result.clone()).collect();

        Ok(StudentDashboard {
            tests_taken: results.len(),
            average_percent: average_percent(&results),
            subject_averages: subject_averages(&results),
            recent: rows.into_iter().take(RECENT_RESULTS).collect(),
            certificate: certificate_progress(user.points()),
            user,
        })
    }

    /// Per-subject averages for one user, subjects in first-seen order
    /// (newest result first).
    ///
    /// # Errors
    ///
    /// Returns `StatsError::Storage` if repository access fails.
    pub async fn subject_breakdown(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SubjectAverage>, StatsError> {
        let results: Vec<_> = self
            .results
            .list_user_results(user_id)
            .await?
            .into_iter()
            .map(|row| row.result)
            .collect();
        Ok(subject_averages(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Subject, SubmissionKey, TestId, TestResult, UserRole};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn result(subject: Subject, score: u32, total: u32, minutes: i64) -> TestResult {
        TestResult::from_persisted(
            UserId::new(1),
            TestId::new(1),
            subject,
            score,
            total,
            fixed_now() + Duration::minutes(minutes),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn aggregates_a_students_history() {
        let repo = InMemoryRepository::new();
        let user = User::from_persisted(
            UserId::new(1),
            UserRole::Student,
            "Ali",
            Some(6),
            None,
            40,
        )
        .unwrap();
        repo.upsert_user(&user).await.unwrap();
        for attempt in [
            result(Subject::Math, 4, 5, 0),
            result(Subject::Math, 5, 5, 1),
            result(Subject::English, 1, 2, 2),
        ] {
            repo.append_result(SubmissionKey::generate(), &attempt)
                .await
                .unwrap();
        }

        let svc = DashboardService::new(Arc::new(repo.clone()), Arc::new(repo));
        let dash = svc.student_dashboard(UserId::new(1)).await.unwrap();

        assert_eq!(dash.tests_taken, 3);
        // (80 + 100 + 50) / 3 = 76.67
        assert_eq!(dash.average_percent, 77);
        assert_eq!(dash.subject_averages.len(), 2);
        assert_eq!(dash.subject_averages[0].subject, Subject::English);
        assert_eq!(dash.subject_averages[1].average_percent, 90);
        assert_eq!(dash.recent[0].result.subject(), Subject::English);
        assert_eq!(dash.certificate.percent, 40);
        assert!(!dash.certificate.eligible);
    }

    #[tokio::test]
    async fn unknown_user_is_reported() {
        let repo = InMemoryRepository::new();
        let svc = DashboardService::new(Arc::new(repo.clone()), Arc::new(repo));
        assert!(matches!(
            svc.student_dashboard(UserId::new(9)).await,
            Err(StatsError::UserNotFound(_))
        ));
        assert!(svc.subject_breakdown(UserId::new(9)).await.unwrap().is_empty());
    }
}
