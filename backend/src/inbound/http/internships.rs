//! Internship API handlers.
//!
//! ```text
//! GET  /api/internships
//! POST /api/internships/{id}/apply   {"coverLetter":"..."}
//! GET  /api/users/{userId}/internship-submissions
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::internship::{Internship, InternshipSubmission, SubmissionStatus};
use crate::domain::ports::{ApplyOutcome, RepositoryError};
use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Public internship payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternshipResponse {
    /// Posting id.
    pub id: Uuid,
    /// Position title.
    pub title: String,
    /// Hiring company.
    pub company: String,
    /// Role description.
    pub description: String,
    /// Work location.
    pub location: Option<String>,
    /// Remaining capacity.
    pub spots_available: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl InternshipResponse {
    pub(crate) fn from_internship(internship: &Internship) -> Self {
        Self {
            id: internship.id,
            title: internship.title.clone(),
            company: internship.company.clone(),
            description: internship.description.clone(),
            location: internship.location.clone(),
            spots_available: internship.spots_available,
            created_at: internship.created_at,
        }
    }
}

/// Submission payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    /// Submission id.
    pub id: Uuid,
    /// Target posting.
    pub internship_id: Uuid,
    /// Applying user.
    pub user_id: UserId,
    /// Cover letter.
    pub cover_letter: Option<String>,
    /// Review state.
    pub status: SubmissionStatus,
    /// Application timestamp.
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionResponse {
    pub(crate) fn from_submission(submission: &InternshipSubmission) -> Self {
        Self {
            id: submission.id,
            internship_id: submission.internship_id,
            user_id: submission.user_id,
            cover_letter: submission.cover_letter.clone(),
            status: submission.status,
            submitted_at: submission.submitted_at,
        }
    }
}

/// Application body.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyBody {
    /// Free-form cover letter.
    #[serde(default)]
    pub cover_letter: Option<String>,
}

/// Active internship postings.
#[utoipa::path(
    get,
    path = "/api/internships",
    responses(
        (status = 200, description = "Active postings", body = [InternshipResponse])
    ),
    tags = ["internships"],
    operation_id = "listInternships",
    security([])
)]
#[get("/internships")]
pub async fn list_internships(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<InternshipResponse>>> {
    let postings = state.internships.list_active().await?;
    Ok(web::Json(
        postings
            .iter()
            .map(InternshipResponse::from_internship)
            .collect(),
    ))
}

/// Apply to an internship.
///
/// Capacity is reserved with a conditional atomic decrement; when the last
/// spot is taken concurrently the application is rejected rather than
/// overbooking the posting.
#[utoipa::path(
    post,
    path = "/api/internships/{id}/apply",
    params(("id" = String, Path, description = "Posting id")),
    request_body = ApplyBody,
    responses(
        (status = 201, description = "Application stored", body = SubmissionResponse),
        (status = 400, description = "No spots or duplicate application", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown posting", body = Error)
    ),
    tags = ["internships"],
    operation_id = "applyToInternship"
)]
#[post("/internships/{id}/apply")]
pub async fn apply_to_internship(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<ApplyBody>,
) -> ApiResult<HttpResponse> {
    let id = parse_uuid(&path.into_inner(), FieldName::new("internshipId"))?;
    let posting = state
        .internships
        .find(id)
        .await?
        .ok_or_else(|| Error::not_found("internship not found"))?;
    if !posting.is_active {
        return Err(Error::invalid_request("internship is not accepting applications")
            .with_details(json!({ "code": "internship_inactive" })));
    }

    let submission = InternshipSubmission::new(
        id,
        user.id(),
        payload.into_inner().cover_letter,
        Utc::now(),
    );
    let outcome = state
        .internships
        .apply(&submission)
        .await
        .map_err(|err| match err {
            RepositoryError::Duplicate { .. } => {
                Error::invalid_request("already applied to this internship")
                    .with_details(json!({ "code": "already_applied" }))
            }
            other => other.into(),
        })?;

    match outcome {
        ApplyOutcome::Accepted => {
            Ok(HttpResponse::Created().json(SubmissionResponse::from_submission(&submission)))
        }
        ApplyOutcome::NoSpotsAvailable => Err(Error::invalid_request(
            "no spots available for this internship",
        )
        .with_details(json!({ "code": "no_spots_available" }))),
    }
}

/// A user's applications, visible to that user and to admins.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/internship-submissions",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Applications", body = [SubmissionResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["internships"],
    operation_id = "listUserSubmissions"
)]
#[get("/users/{user_id}/internship-submissions")]
pub async fn list_user_submissions(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<SubmissionResponse>>> {
    let target = UserId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("userId"))?);
    user.require_self_or_admin(target)?;

    let submissions = state.internships.submissions_for_user(target).await?;
    Ok(web::Json(
        submissions
            .iter()
            .map(SubmissionResponse::from_submission)
            .collect(),
    ))
}
