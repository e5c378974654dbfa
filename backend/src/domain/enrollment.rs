//! Course enrollments, progress tracking and guest enrollment requests.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::{EmailAddress, UserId};

/// Validation errors for enrollment payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentValidationError {
    /// Progress was above 100.
    #[error("progress must be between 0 and 100")]
    ProgressOutOfRange,
    /// Status string did not match a known state.
    #[error("status must be one of active, completed, cancelled")]
    UnknownStatus,
}

/// Lifecycle state of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    /// Learner is working through the course.
    Active,
    /// Progress reached 100.
    Completed,
    /// Enrollment was cancelled.
    Cancelled,
}

impl EnrollmentStatus {
    /// Parse the wire representation of a status.
    pub fn parse(value: &str) -> Result<Self, EnrollmentValidationError> {
        match value {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(EnrollmentValidationError::UnknownStatus),
        }
    }

    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion percentage clamped to `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "u8", into = "u8")]
pub struct Progress(u8);

impl Progress {
    /// Zero progress.
    pub const ZERO: Self = Self(0);
    /// Full completion.
    pub const COMPLETE: Self = Self(100);

    /// Validate a percentage value.
    pub const fn new(value: u8) -> Result<Self, EnrollmentValidationError> {
        if value > 100 {
            return Err(EnrollmentValidationError::ProgressOutOfRange);
        }
        Ok(Self(value))
    }

    /// The raw percentage.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<Progress> for u8 {
    fn from(value: Progress) -> Self {
        value.0
    }
}

impl TryFrom<u8> for Progress {
    type Error = EnrollmentValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A user's enrollment in a course.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    /// Stable identifier.
    pub id: Uuid,
    /// Enrolled user.
    pub user_id: UserId,
    /// Enrolled course.
    pub course_id: Uuid,
    /// Completion percentage.
    pub progress: Progress,
    /// Lifecycle state.
    pub status: EnrollmentStatus,
    /// Enrollment timestamp.
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    /// Start a fresh enrollment.
    #[must_use]
    pub fn start(user_id: UserId, course_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            progress: Progress::ZERO,
            status: EnrollmentStatus::Active,
            enrolled_at: now,
        }
    }

    /// Record new progress; reaching 100 completes the enrollment.
    ///
    /// Cancelled enrollments keep their status so stale clients cannot
    /// silently resurrect them.
    pub fn record_progress(&mut self, progress: Progress) {
        self.progress = progress;
        if self.status == EnrollmentStatus::Active && progress == Progress::COMPLETE {
            self.status = EnrollmentStatus::Completed;
        }
    }
}

/// A pre-account enrollment request captured from a guest, matched to an
/// account by email at first login.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestEnrollment {
    /// Stable identifier.
    pub id: Uuid,
    /// Email the guest supplied; matching is case-insensitive because
    /// [`EmailAddress`] normalises on construction.
    pub email: EmailAddress,
    /// Requested course.
    pub course_id: Uuid,
    /// Capture timestamp.
    pub requested_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn progress_rejects_values_above_one_hundred() {
        assert!(Progress::new(100).is_ok());
        assert_eq!(
            Progress::new(101),
            Err(EnrollmentValidationError::ProgressOutOfRange)
        );
    }

    #[rstest]
    fn full_progress_completes_an_active_enrollment() {
        let mut enrollment = Enrollment::start(UserId::random(), Uuid::new_v4(), Utc::now());
        enrollment.record_progress(Progress::new(40).expect("valid"));
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        enrollment.record_progress(Progress::COMPLETE);
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
    }

    #[rstest]
    fn cancelled_enrollments_stay_cancelled() {
        let mut enrollment = Enrollment::start(UserId::random(), Uuid::new_v4(), Utc::now());
        enrollment.status = EnrollmentStatus::Cancelled;
        enrollment.record_progress(Progress::COMPLETE);
        assert_eq!(enrollment.status, EnrollmentStatus::Cancelled);
    }

    #[rstest]
    #[case("active", EnrollmentStatus::Active)]
    #[case("completed", EnrollmentStatus::Completed)]
    #[case("cancelled", EnrollmentStatus::Cancelled)]
    fn statuses_parse_round_trip(#[case] raw: &str, #[case] expected: EnrollmentStatus) {
        assert_eq!(EnrollmentStatus::parse(raw), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }
}
