//! Calendar events shown on user dashboards.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::user::UserId;

/// Validation errors for calendar payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarValidationError {
    /// Title was empty after trimming.
    #[error("title must not be empty")]
    EmptyTitle,
    /// End time preceded the start time.
    #[error("end time must not precede the start time")]
    EndsBeforeStart,
}

/// A scheduled event.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    /// Stable identifier.
    pub id: Uuid,
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: Option<String>,
    /// Start time.
    pub starts_at: DateTime<Utc>,
    /// End time, when bounded.
    pub ends_at: Option<DateTime<Utc>>,
    /// Creating admin, when known.
    pub created_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl CalendarEvent {
    /// Validate and build an event.
    pub fn new(
        title: &str,
        starts_at: DateTime<Utc>,
        ends_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, CalendarValidationError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(CalendarValidationError::EmptyTitle);
        }
        if let Some(end) = ends_at {
            if end < starts_at {
                return Err(CalendarValidationError::EndsBeforeStart);
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title: trimmed.to_owned(),
            description: None,
            starts_at,
            ends_at,
            created_by: None,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn events_reject_inverted_ranges() {
        let now = Utc::now();
        let err = CalendarEvent::new("Demo day", now, Some(now - chrono::Duration::hours(1)), now);
        assert_eq!(err, Err(CalendarValidationError::EndsBeforeStart));
    }

    #[rstest]
    fn open_ended_events_are_fine() {
        let now = Utc::now();
        assert!(CalendarEvent::new("Demo day", now, None, now).is_ok());
    }
}
