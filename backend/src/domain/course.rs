//! Course catalogue entities: courses, assignments, certificates.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::user::UserId;

/// Validation errors for catalogue payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogueValidationError {
    /// Title was empty after trimming.
    #[error("title must not be empty")]
    EmptyTitle,
}

/// Validate a title for catalogue entities.
pub fn validated_title(value: &str) -> Result<String, CatalogueValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogueValidationError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

/// A course offered on the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    /// Stable identifier.
    pub id: Uuid,
    /// Course title.
    pub title: String,
    /// Course description.
    pub description: String,
    /// Free-form category label.
    pub category: Option<String>,
    /// Nominal duration in weeks.
    pub duration_weeks: Option<i32>,
    /// Inactive courses are hidden from the public listing.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Course {
    /// Build a new course with a validated title.
    pub fn new(
        title: &str,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, CatalogueValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            title: validated_title(title)?,
            description: description.into(),
            category: None,
            duration_weeks: None,
            is_active: true,
            created_at: now,
        })
    }
}

/// Coursework attached to a course.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Stable identifier.
    pub id: Uuid,
    /// Owning course.
    pub course_id: Uuid,
    /// Assignment title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Submission deadline, if any.
    pub due_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// Build a new assignment with a validated title.
    pub fn new(
        course_id: Uuid,
        title: &str,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, CatalogueValidationError> {
        Ok(Self {
            id: Uuid::new_v4(),
            course_id,
            title: validated_title(title)?,
            description: description.into(),
            due_at: None,
            created_at: now,
        })
    }
}

/// A completion certificate issued to a user for a course.
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    /// Stable identifier.
    pub id: Uuid,
    /// Receiving user.
    pub user_id: UserId,
    /// Completed course.
    pub course_id: Uuid,
    /// Certificate title.
    pub title: String,
    /// Issue timestamp.
    pub issued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn course_titles_are_trimmed_and_non_empty() {
        let course = Course::new("  Rust 101  ", "intro", Utc::now()).expect("valid course");
        assert_eq!(course.title, "Rust 101");
        assert!(course.is_active);
        assert!(Course::new("   ", "intro", Utc::now()).is_err());
    }

    #[rstest]
    fn assignments_validate_titles_too() {
        let err = Assignment::new(Uuid::new_v4(), "", "desc", Utc::now());
        assert_eq!(err, Err(CatalogueValidationError::EmptyTitle));
    }
}
