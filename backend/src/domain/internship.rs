//! Internship postings and applications.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Validation errors for internship payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternshipValidationError {
    /// Title was empty after trimming.
    #[error("title must not be empty")]
    EmptyTitle,
    /// Capacity was negative.
    #[error("spots available must not be negative")]
    NegativeCapacity,
    /// Status string did not match a known state.
    #[error("status must be one of submitted, reviewed, accepted, rejected")]
    UnknownStatus,
}

/// An internship posting with limited capacity.
///
/// `spots_available` is guarded by a conditional atomic decrement in the
/// repository; the domain type never decrements it through read-modify-write.
#[derive(Debug, Clone, PartialEq)]
pub struct Internship {
    /// Stable identifier.
    pub id: Uuid,
    /// Position title.
    pub title: String,
    /// Hiring company.
    pub company: String,
    /// Role description.
    pub description: String,
    /// Work location, if fixed.
    pub location: Option<String>,
    /// Remaining application capacity.
    pub spots_available: i32,
    /// Inactive postings are hidden from the public listing.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Internship {
    /// Build a new posting with validated title and capacity.
    pub fn new(
        title: &str,
        company: impl Into<String>,
        description: impl Into<String>,
        spots_available: i32,
        now: DateTime<Utc>,
    ) -> Result<Self, InternshipValidationError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(InternshipValidationError::EmptyTitle);
        }
        if spots_available < 0 {
            return Err(InternshipValidationError::NegativeCapacity);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title: trimmed.to_owned(),
            company: company.into(),
            description: description.into(),
            location: None,
            spots_available,
            is_active: true,
            created_at: now,
        })
    }
}

/// Review state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Received, not yet reviewed.
    Submitted,
    /// Reviewed by the posting owner.
    Reviewed,
    /// Accepted.
    Accepted,
    /// Rejected.
    Rejected,
}

impl SubmissionStatus {
    /// Parse the wire representation of a status.
    pub fn parse(value: &str) -> Result<Self, InternshipValidationError> {
        match value {
            "submitted" => Ok(Self::Submitted),
            "reviewed" => Ok(Self::Reviewed),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(InternshipValidationError::UnknownStatus),
        }
    }

    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Reviewed => "reviewed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's application to an internship. One per `(internship, user)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct InternshipSubmission {
    /// Stable identifier.
    pub id: Uuid,
    /// Target posting.
    pub internship_id: Uuid,
    /// Applying user.
    pub user_id: UserId,
    /// Free-form cover letter.
    pub cover_letter: Option<String>,
    /// Review state.
    pub status: SubmissionStatus,
    /// Application timestamp.
    pub submitted_at: DateTime<Utc>,
}

impl InternshipSubmission {
    /// Build a fresh application in the submitted state.
    #[must_use]
    pub fn new(
        internship_id: Uuid,
        user_id: UserId,
        cover_letter: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            internship_id,
            user_id,
            cover_letter,
            status: SubmissionStatus::Submitted,
            submitted_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn postings_validate_title_and_capacity() {
        assert!(Internship::new("Intern", "Acme", "desc", 3, Utc::now()).is_ok());
        assert_eq!(
            Internship::new(" ", "Acme", "desc", 3, Utc::now()),
            Err(InternshipValidationError::EmptyTitle)
        );
        assert_eq!(
            Internship::new("Intern", "Acme", "desc", -1, Utc::now()),
            Err(InternshipValidationError::NegativeCapacity)
        );
    }

    #[rstest]
    fn submissions_start_in_the_submitted_state() {
        let submission =
            InternshipSubmission::new(Uuid::new_v4(), UserId::random(), None, Utc::now());
        assert_eq!(submission.status, SubmissionStatus::Submitted);
    }
}
