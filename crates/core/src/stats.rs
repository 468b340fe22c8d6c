//! Leaderboard ranking and per-user result aggregation.

use crate::model::{Subject, TestResult, User};

/// Points needed to unlock the completion certificate.
pub const CERTIFICATE_TARGET_POINTS: u32 = 100;

/// Rounds a non-negative value half-up to the nearest integer.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_half_up(value: f64) -> u32 {
    if value <= 0.0 {
        return 0;
    }
    let rounded = (value + 0.5).floor();
    if rounded >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    rounded as u32
}

/// Ranks students by accumulated points, highest first.
///
/// Admins are dropped. The sort is stable, so tied users keep their input order.
#[must_use]
pub fn rank_students(users: impl IntoIterator<Item = User>) -> Vec<User> {
    let mut ranked: Vec<User> = users.into_iter().filter(|u| !u.is_admin()).collect();
    ranked.sort_by(|a, b| b.points().cmp(&a.points()));
    ranked
}

/// Mean percentage for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectAverage {
    pub subject: Subject,
    pub attempts: u32,
    pub average_percent: u32,
}

/// Averages result percentages per subject, in order of first appearance.
#[must_use]
pub fn subject_averages(results: &[TestResult]) -> Vec<SubjectAverage> {
    let mut buckets: Vec<(Subject, f64, u32)> = Vec::new();
    for result in results {
        match buckets.iter_mut().find(|(s, _, _)| *s == result.subject()) {
            Some((_, sum, count)) => {
                *sum += result.percent();
                *count += 1;
            }
            None => buckets.push((result.subject(), result.percent(), 1)),
        }
    }

    buckets
        .into_iter()
        .map(|(subject, sum, count)| SubjectAverage {
            subject,
            attempts: count,
            average_percent: round_half_up(sum / f64::from(count)),
        })
        .collect()
}

/// Mean percentage across all results; 0 when there are none.
#[must_use]
pub fn average_percent(results: &[TestResult]) -> u32 {
    if results.is_empty() {
        return 0;
    }
    let sum: f64 = results.iter().map(TestResult::percent).sum();
    let count = u32::try_from(results.len()).unwrap_or(u32::MAX);
    round_half_up(sum / f64::from(count))
}

/// How far a user is towards the certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateProgress {
    pub points: u32,
    pub target: u32,
    /// Capped at 100.
    pub percent: u32,
    pub eligible: bool,
}

#[must_use]
pub fn certificate_progress(points: u32) -> CertificateProgress {
    let raw = f64::from(points) / f64::from(CERTIFICATE_TARGET_POINTS) * 100.0;
    CertificateProgress {
        points,
        target: CERTIFICATE_TARGET_POINTS,
        percent: round_half_up(raw.min(100.0)),
        eligible: points >= CERTIFICATE_TARGET_POINTS,
    }
}
