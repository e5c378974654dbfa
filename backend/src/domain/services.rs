//! Services marketplace: category taxonomy and request workflow.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::{EmailAddress, UserId, UserValidationError};

/// Validation errors for marketplace payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServicesValidationError {
    /// Name was empty after trimming.
    #[error("name must not be empty")]
    EmptyName,
    /// Project details were empty after trimming.
    #[error("project details must not be empty")]
    EmptyDetails,
    /// Contact email failed address validation.
    #[error("{0}")]
    ContactEmail(UserValidationError),
    /// Status string did not match a known state.
    #[error("status must be one of pending, in-process, completed, cancelled")]
    UnknownStatus,
    /// The requested status transition is not allowed.
    #[error("cannot move a {from} request to {to}")]
    InvalidTransition {
        /// Current state.
        from: ServiceRequestStatus,
        /// Requested state.
        to: ServiceRequestStatus,
    },
}

/// Top level of the services taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCategory {
    /// Stable identifier.
    pub id: Uuid,
    /// Category name.
    pub name: String,
    /// Category description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Second level of the services taxonomy; requests target subcategories.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSubcategory {
    /// Stable identifier.
    pub id: Uuid,
    /// Owning category.
    pub category_id: Uuid,
    /// Subcategory name.
    pub name: String,
    /// Subcategory description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validate a taxonomy name.
pub fn validated_name(value: &str) -> Result<String, ServicesValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServicesValidationError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

/// Workflow state of a service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceRequestStatus {
    /// Awaiting triage.
    Pending,
    /// Being worked.
    InProcess,
    /// Finished; terminal.
    Completed,
    /// Abandoned; terminal.
    Cancelled,
}

impl ServiceRequestStatus {
    /// Parse the wire representation of a status.
    pub fn parse(value: &str) -> Result<Self, ServicesValidationError> {
        match value {
            "pending" => Ok(Self::Pending),
            "in-process" => Ok(Self::InProcess),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ServicesValidationError::UnknownStatus),
        }
    }

    /// Wire representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProcess => "in-process",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the workflow permits moving from `self` to `next`.
    ///
    /// Completed and cancelled are terminal; pending may skip straight to
    /// completed for trivially resolved requests.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::InProcess | Self::Completed | Self::Cancelled),
            Self::InProcess => matches!(next, Self::Completed | Self::Cancelled),
            Self::Completed | Self::Cancelled => false,
        }
    }
}

impl fmt::Display for ServiceRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project inquiry against a service subcategory.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    /// Stable identifier.
    pub id: Uuid,
    /// Target subcategory.
    pub subcategory_id: Uuid,
    /// Submitting account, when the requester was logged in.
    pub user_id: Option<UserId>,
    /// Contact name supplied on the form.
    pub contact_name: String,
    /// Contact email supplied on the form.
    pub contact_email: EmailAddress,
    /// Project description.
    pub project_details: String,
    /// Free-form budget indication.
    pub budget: Option<String>,
    /// Free-form timeline indication.
    pub timeline: Option<String>,
    /// Workflow state.
    pub status: ServiceRequestStatus,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// Validate and build a new pending request.
    pub fn submit(draft: ServiceRequestDraft) -> Result<Self, ServicesValidationError> {
        let contact_name = validated_name(&draft.contact_name)?;
        let details = draft.project_details.trim();
        if details.is_empty() {
            return Err(ServicesValidationError::EmptyDetails);
        }
        let contact_email = EmailAddress::new(&draft.contact_email)
            .map_err(ServicesValidationError::ContactEmail)?;
        Ok(Self {
            id: Uuid::new_v4(),
            subcategory_id: draft.subcategory_id,
            user_id: draft.user_id,
            contact_name,
            contact_email,
            project_details: details.to_owned(),
            budget: draft.budget,
            timeline: draft.timeline,
            status: ServiceRequestStatus::Pending,
            created_at: draft.now,
        })
    }

    /// Apply a workflow transition, rejecting moves out of terminal states.
    pub fn transition_to(
        &mut self,
        next: ServiceRequestStatus,
    ) -> Result<(), ServicesValidationError> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(ServicesValidationError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Raw inputs for [`ServiceRequest::submit`].
#[derive(Debug, Clone)]
pub struct ServiceRequestDraft {
    /// Target subcategory.
    pub subcategory_id: Uuid,
    /// Submitting account, if authenticated.
    pub user_id: Option<UserId>,
    /// Contact name as typed.
    pub contact_name: String,
    /// Contact email as typed.
    pub contact_email: String,
    /// Project description as typed.
    pub project_details: String,
    /// Budget indication.
    pub budget: Option<String>,
    /// Timeline indication.
    pub timeline: Option<String>,
    /// Submission timestamp.
    pub now: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn draft() -> ServiceRequestDraft {
        ServiceRequestDraft {
            subcategory_id: Uuid::new_v4(),
            user_id: None,
            contact_name: "Ada".into(),
            contact_email: "Ada@Example.com".into(),
            project_details: "Build a landing page".into(),
            budget: Some("1-2k".into()),
            timeline: None,
            now: Utc::now(),
        }
    }

    #[rstest]
    fn submitted_requests_start_pending_with_normalised_email() {
        let request = ServiceRequest::submit(draft()).expect("valid draft");
        assert_eq!(request.status, ServiceRequestStatus::Pending);
        assert_eq!(request.contact_email.as_str(), "ada@example.com");
    }

    #[rstest]
    fn blank_details_are_rejected() {
        let mut invalid = draft();
        invalid.project_details = "   ".into();
        assert_eq!(
            ServiceRequest::submit(invalid),
            Err(ServicesValidationError::EmptyDetails)
        );
    }

    #[rstest]
    #[case(ServiceRequestStatus::Pending, ServiceRequestStatus::InProcess, true)]
    #[case(ServiceRequestStatus::Pending, ServiceRequestStatus::Completed, true)]
    #[case(ServiceRequestStatus::InProcess, ServiceRequestStatus::Completed, true)]
    #[case(ServiceRequestStatus::InProcess, ServiceRequestStatus::Pending, false)]
    #[case(ServiceRequestStatus::Completed, ServiceRequestStatus::InProcess, false)]
    #[case(ServiceRequestStatus::Cancelled, ServiceRequestStatus::Pending, false)]
    fn workflow_transitions_are_enforced(
        #[case] from: ServiceRequestStatus,
        #[case] to: ServiceRequestStatus,
        #[case] allowed: bool,
    ) {
        let mut request = ServiceRequest::submit(draft()).expect("valid draft");
        request.status = from;
        assert_eq!(request.transition_to(to).is_ok(), allowed);
    }

    #[rstest]
    fn self_transition_is_a_no_op_even_when_terminal() {
        let mut request = ServiceRequest::submit(draft()).expect("valid draft");
        request.status = ServiceRequestStatus::Completed;
        assert!(request.transition_to(ServiceRequestStatus::Completed).is_ok());
    }

    #[rstest]
    #[case("pending", ServiceRequestStatus::Pending)]
    #[case("in-process", ServiceRequestStatus::InProcess)]
    fn statuses_parse_round_trip(#[case] raw: &str, #[case] expected: ServiceRequestStatus) {
        assert_eq!(ServiceRequestStatus::parse(raw), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }
}
