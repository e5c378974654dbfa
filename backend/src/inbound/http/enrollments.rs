//! Enrollment API handlers.
//!
//! ```text
//! POST /api/enrollments                      {"courseId":"..."}
//! PUT  /api/enrollments/{id}/progress        {"progress":40}
//! GET  /api/users/{userId}/enrollments
//! POST /api/guest-enrollments                {"email":"a@b.co","courseId":"..."}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::enrollment::{
    Enrollment, EnrollmentStatus, EnrollmentValidationError, GuestEnrollment, Progress,
};
use crate::domain::ports::RepositoryError;
use crate::domain::user::EmailAddress;
use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Enrollment payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    /// Enrollment id.
    pub id: Uuid,
    /// Enrolled user.
    pub user_id: UserId,
    /// Enrolled course.
    pub course_id: Uuid,
    /// Completion percentage.
    pub progress: u8,
    /// Lifecycle state.
    pub status: EnrollmentStatus,
    /// Enrollment timestamp.
    pub enrolled_at: DateTime<Utc>,
}

impl EnrollmentResponse {
    pub(crate) fn from_enrollment(enrollment: &Enrollment) -> Self {
        Self {
            id: enrollment.id,
            user_id: enrollment.user_id,
            course_id: enrollment.course_id,
            progress: enrollment.progress.value(),
            status: enrollment.status,
            enrolled_at: enrollment.enrolled_at,
        }
    }
}

/// Self-enrollment body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollBody {
    /// Course to enroll in.
    pub course_id: String,
}

/// Progress update body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBody {
    /// New completion percentage, 0 to 100.
    pub progress: u8,
}

/// Guest enrollment capture body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestEnrollBody {
    /// Email the guest supplied.
    pub email: String,
    /// Requested course.
    pub course_id: String,
}

/// Enroll the caller in a course.
#[utoipa::path(
    post,
    path = "/api/enrollments",
    request_body = EnrollBody,
    responses(
        (status = 201, description = "Created enrollment", body = EnrollmentResponse),
        (status = 400, description = "Invalid course or duplicate enrollment", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown course", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "enroll"
)]
#[post("/enrollments")]
pub async fn enroll(
    state: web::Data<HttpState>,
    user: AuthedUser,
    payload: web::Json<EnrollBody>,
) -> ApiResult<HttpResponse> {
    let course_id = parse_uuid(&payload.course_id, FieldName::new("courseId"))?;
    let course = state
        .courses
        .find(course_id)
        .await?
        .ok_or_else(|| Error::not_found("course not found"))?;
    if !course.is_active {
        return Err(Error::invalid_request("course is not open for enrollment")
            .with_details(json!({ "code": "course_inactive" })));
    }

    let enrollment = Enrollment::start(user.id(), course_id, Utc::now());
    state
        .enrollments
        .insert(&enrollment)
        .await
        .map_err(|err| match err {
            RepositoryError::Duplicate { .. } => {
                Error::invalid_request("already enrolled in this course")
                    .with_details(json!({ "code": "already_enrolled" }))
            }
            other => other.into(),
        })?;
    Ok(HttpResponse::Created().json(EnrollmentResponse::from_enrollment(&enrollment)))
}

/// Record progress on the caller's enrollment.
#[utoipa::path(
    put,
    path = "/api/enrollments/{id}/progress",
    params(("id" = String, Path, description = "Enrollment id")),
    request_body = ProgressBody,
    responses(
        (status = 200, description = "Updated enrollment", body = EnrollmentResponse),
        (status = 400, description = "Invalid progress", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Unknown enrollment", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "recordProgress"
)]
#[put("/enrollments/{id}/progress")]
pub async fn record_progress(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<ProgressBody>,
) -> ApiResult<web::Json<EnrollmentResponse>> {
    let id = parse_uuid(&path.into_inner(), FieldName::new("enrollmentId"))?;
    let progress = Progress::new(payload.progress).map_err(
        |err: EnrollmentValidationError| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "progress", "code": "progress_out_of_range" }))
        },
    )?;

    let mut enrollment = state
        .enrollments
        .find(id)
        .await?
        .ok_or_else(|| Error::not_found("enrollment not found"))?;
    user.require_self_or_admin(enrollment.user_id)?;

    enrollment.record_progress(progress);
    state
        .enrollments
        .record_progress(id, enrollment.progress, enrollment.status)
        .await?;
    Ok(web::Json(EnrollmentResponse::from_enrollment(&enrollment)))
}

/// A user's enrollments, visible to that user and to admins.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/enrollments",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Enrollments", body = [EnrollmentResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "listUserEnrollments"
)]
#[get("/users/{user_id}/enrollments")]
pub async fn list_user_enrollments(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<EnrollmentResponse>>> {
    let target = UserId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("userId"))?);
    user.require_self_or_admin(target)?;

    let enrollments = state.enrollments.for_user(target).await?;
    Ok(web::Json(
        enrollments
            .iter()
            .map(EnrollmentResponse::from_enrollment)
            .collect(),
    ))
}

/// Capture an enrollment request from a guest, matched to an account by
/// email at first login.
#[utoipa::path(
    post,
    path = "/api/guest-enrollments",
    request_body = GuestEnrollBody,
    responses(
        (status = 202, description = "Request captured"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown course", body = Error)
    ),
    tags = ["enrollments"],
    operation_id = "captureGuestEnrollment",
    security([])
)]
#[post("/guest-enrollments")]
pub async fn capture_guest_enrollment(
    state: web::Data<HttpState>,
    payload: web::Json<GuestEnrollBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let email = EmailAddress::new(&body.email).map_err(|err| {
        Error::invalid_request(err.to_string())
            .with_details(json!({ "field": "email", "code": "invalid_email" }))
    })?;
    let course_id = parse_uuid(&body.course_id, FieldName::new("courseId"))?;
    if state.courses.find(course_id).await?.is_none() {
        return Err(Error::not_found("course not found"));
    }

    let guest = GuestEnrollment {
        id: Uuid::new_v4(),
        email,
        course_id,
        requested_at: Utc::now(),
    };
    state.enrollments.insert_guest(&guest).await?;
    Ok(HttpResponse::Accepted().finish())
}

#[cfg(test)]
mod tests {
    //! Enrollment endpoint coverage over the in-memory state.
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    use crate::domain::course::Course;
    use crate::inbound::http::users::{login, register};

    use super::*;

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api")
                .service(register)
                .service(login)
                .service(enroll)
                .service(record_progress)
                .service(list_user_enrollments)
                .service(capture_guest_enrollment),
        )
    }

    async fn seeded_course(state: &HttpState) -> Course {
        let course = Course::new("Rust 101", "intro", Utc::now()).expect("valid course");
        state.courses.insert(&course).await.expect("course stored");
        course
    }

    async fn register_user(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        email: &str,
    ) -> String {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/api/register")
                .set_json(serde_json::json!({
                    "email": email,
                    "password": "a strong password",
                    "displayName": "Test User",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        body.get("token")
            .and_then(Value::as_str)
            .expect("token present")
            .to_owned()
    }

    #[actix_web::test]
    async fn double_enrollment_is_rejected() {
        let state = HttpState::in_memory("http://x");
        let course = seeded_course(&state).await;
        let app = actix_test::init_service(test_app(state)).await;
        let token = register_user(&app, "ada@example.com").await;

        let body = serde_json::json!({ "courseId": course.id.to_string() });
        let first = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/enrollments")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .set_json(&body)
                .to_request(),
        )
        .await;
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/enrollments")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .set_json(&body)
                .to_request(),
        )
        .await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        let error: Value = actix_test::read_body_json(second).await;
        assert_eq!(
            error.pointer("/details/code").and_then(Value::as_str),
            Some("already_enrolled")
        );
    }

    #[actix_web::test]
    async fn full_progress_marks_the_enrollment_completed() {
        let state = HttpState::in_memory("http://x");
        let course = seeded_course(&state).await;
        let app = actix_test::init_service(test_app(state)).await;
        let token = register_user(&app, "ada@example.com").await;

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/enrollments")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .set_json(serde_json::json!({ "courseId": course.id.to_string() }))
                .to_request(),
        )
        .await;
        let enrollment: Value = actix_test::read_body_json(created).await;
        let id = enrollment.get("id").and_then(Value::as_str).expect("id");

        let updated = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/enrollments/{id}/progress"))
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .set_json(serde_json::json!({ "progress": 100 }))
                .to_request(),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(updated).await;
        assert_eq!(
            body.get("status").and_then(Value::as_str),
            Some("completed")
        );
    }

    #[actix_web::test]
    async fn users_cannot_read_other_users_enrollments() {
        let state = HttpState::in_memory("http://x");
        seeded_course(&state).await;
        let app = actix_test::init_service(test_app(state)).await;
        let _owner = register_user(&app, "owner@example.com").await;
        let other = register_user(&app, "other@example.com").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/users/{}/enrollments", Uuid::new_v4()))
                .insert_header((AUTHORIZATION, format!("Bearer {other}")))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn guest_enrollments_are_captured_for_known_courses() {
        let state = HttpState::in_memory("http://x");
        let course = seeded_course(&state).await;
        let app = actix_test::init_service(test_app(state)).await;

        let accepted = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/guest-enrollments")
                .set_json(serde_json::json!({
                    "email": "guest@example.com",
                    "courseId": course.id.to_string(),
                }))
                .to_request(),
        )
        .await;
        assert_eq!(accepted.status(), StatusCode::ACCEPTED);

        let unknown = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/guest-enrollments")
                .set_json(serde_json::json!({
                    "email": "guest@example.com",
                    "courseId": Uuid::new_v4().to_string(),
                }))
                .to_request(),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }
}
