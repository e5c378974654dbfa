//! Contact form messages.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::user::{EmailAddress, UserValidationError};

/// Validation errors for contact form payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactValidationError {
    /// Name was empty after trimming.
    #[error("name must not be empty")]
    EmptyName,
    /// Message body was empty after trimming.
    #[error("message must not be empty")]
    EmptyMessage,
    /// Email failed address validation.
    #[error("{0}")]
    Email(UserValidationError),
}

/// A message submitted through the public contact form.
///
/// No status column exists; triage state lives entirely with the operators.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMessage {
    /// Stable identifier.
    pub id: Uuid,
    /// Sender name.
    pub name: String,
    /// Sender email.
    pub email: EmailAddress,
    /// Optional subject line.
    pub subject: Option<String>,
    /// Message body.
    pub message: String,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    /// Validate and build a contact message.
    pub fn submit(
        name: &str,
        email: &str,
        subject: Option<String>,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ContactValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ContactValidationError::EmptyName);
        }
        let body = message.trim();
        if body.is_empty() {
            return Err(ContactValidationError::EmptyMessage);
        }
        let email = EmailAddress::new(email).map_err(ContactValidationError::Email)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            email,
            subject: subject.filter(|s| !s.trim().is_empty()),
            message: body.to_owned(),
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn blank_subjects_collapse_to_none() {
        let message =
            ContactMessage::submit("Ada", "ada@example.com", Some("  ".into()), "hi", Utc::now())
                .expect("valid message");
        assert_eq!(message.subject, None);
    }

    #[rstest]
    #[case("", "ada@example.com", "hi")]
    #[case("Ada", "not-an-email", "hi")]
    #[case("Ada", "ada@example.com", "   ")]
    fn invalid_submissions_are_rejected(
        #[case] name: &str,
        #[case] email: &str,
        #[case] body: &str,
    ) {
        assert!(ContactMessage::submit(name, email, None, body, Utc::now()).is_err());
    }
}
