//! Admin management of courses, assignments, certificates and enrollments.
//!
//! ```text
//! GET/POST          /api/admin/courses         PUT/DELETE /api/admin/courses/{id}
//! GET/POST          /api/admin/assignments     PUT/DELETE /api/admin/assignments/{id}
//! GET/POST          /api/admin/certificates    DELETE     /api/admin/certificates/{id}
//! GET               /api/admin/enrollments     PUT/DELETE /api/admin/enrollments/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::course::{Assignment, CatalogueValidationError, Certificate, Course};
use crate::domain::enrollment::{EnrollmentStatus, Progress};
use crate::domain::ports::{CourseListFilter, EnrollmentListFilter};
use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::admin::PagedResponse;
use crate::inbound::http::auth::AuthedUser;
use crate::inbound::http::courses::CourseResponse;
use crate::inbound::http::enrollments::EnrollmentResponse;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_params, parse_uuid};

fn map_catalogue_error(err: &CatalogueValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": "title", "code": "empty_title" }))
}

/// Assignment payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    /// Assignment id.
    pub id: Uuid,
    /// Owning course.
    pub course_id: Uuid,
    /// Title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Submission deadline.
    pub due_at: Option<DateTime<Utc>>,
}

impl AssignmentResponse {
    fn from_assignment(assignment: &Assignment) -> Self {
        Self {
            id: assignment.id,
            course_id: assignment.course_id,
            title: assignment.title.clone(),
            description: assignment.description.clone(),
            due_at: assignment.due_at,
        }
    }
}

/// Certificate payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    /// Certificate id.
    pub id: Uuid,
    /// Receiving user.
    pub user_id: UserId,
    /// Completed course.
    pub course_id: Uuid,
    /// Title.
    pub title: String,
    /// Issue timestamp.
    pub issued_at: DateTime<Utc>,
}

impl CertificateResponse {
    fn from_certificate(certificate: &Certificate) -> Self {
        Self {
            id: certificate.id,
            user_id: certificate.user_id,
            course_id: certificate.course_id,
            title: certificate.title.clone(),
            issued_at: certificate.issued_at,
        }
    }
}

/// Course listing query.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CourseListQuery {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Substring match against title or category.
    pub search: Option<String>,
}

/// Course creation body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseCreateBody {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Category label.
    #[serde(default)]
    pub category: Option<String>,
    /// Nominal duration in weeks.
    #[serde(default)]
    pub duration_weeks: Option<i32>,
}

/// Course update body; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseUpdateBody {
    /// Replacement title.
    #[serde(default)]
    pub title: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement category.
    #[serde(default)]
    pub category: Option<String>,
    /// Replacement duration.
    #[serde(default)]
    pub duration_weeks: Option<i32>,
    /// Replacement active flag.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// List courses with pagination and search.
#[utoipa::path(
    get,
    path = "/api/admin/courses",
    params(CourseListQuery),
    responses(
        (status = 200, description = "Paged courses"),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListCourses"
)]
#[get("/courses")]
pub async fn list_courses(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    query: web::Query<CourseListQuery>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let query = query.into_inner();
    let params = page_params(query.page, query.limit)?;
    let filter = CourseListFilter {
        search: query.search,
    };
    let (courses, total) = state.courses.list(&filter, params).await?;
    let items: Vec<CourseResponse> = courses.iter().map(CourseResponse::from_course).collect();
    Ok(HttpResponse::Ok().json(PagedResponse::new(items, params, total)))
}

/// Create a course.
#[utoipa::path(
    post,
    path = "/api/admin/courses",
    request_body = CourseCreateBody,
    responses(
        (status = 201, description = "Created course", body = CourseResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminCreateCourse"
)]
#[post("/courses")]
pub async fn create_course(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    payload: web::Json<CourseCreateBody>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let body = payload.into_inner();
    let mut course = Course::new(&body.title, body.description, Utc::now())
        .map_err(|err| map_catalogue_error(&err))?;
    course.category = body.category;
    course.duration_weeks = body.duration_weeks;

    state.courses.insert(&course).await?;
    Ok(HttpResponse::Created().json(CourseResponse::from_course(&course)))
}

/// Update a course.
#[utoipa::path(
    put,
    path = "/api/admin/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    request_body = CourseUpdateBody,
    responses(
        (status = 200, description = "Updated course", body = CourseResponse),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown course", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateCourse"
)]
#[put("/courses/{id}")]
pub async fn update_course(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<CourseUpdateBody>,
) -> ApiResult<web::Json<CourseResponse>> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("courseId"))?;
    let mut course = state
        .courses
        .find(id)
        .await?
        .ok_or_else(|| Error::not_found("course not found"))?;

    let body = payload.into_inner();
    if let Some(title) = body.title {
        course.title =
            crate::domain::course::validated_title(&title).map_err(|err| map_catalogue_error(&err))?;
    }
    if let Some(description) = body.description {
        course.description = description;
    }
    if let Some(category) = body.category {
        course.category = Some(category);
    }
    if let Some(duration_weeks) = body.duration_weeks {
        course.duration_weeks = Some(duration_weeks);
    }
    if let Some(is_active) = body.is_active {
        course.is_active = is_active;
    }

    if !state.courses.update(&course).await? {
        return Err(Error::not_found("course not found"));
    }
    Ok(web::Json(CourseResponse::from_course(&course)))
}

/// Delete a course.
#[utoipa::path(
    delete,
    path = "/api/admin/courses/{id}",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown course", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteCourse"
)]
#[delete("/courses/{id}")]
pub async fn delete_course(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("courseId"))?;
    if !state.courses.delete(id).await? {
        return Err(Error::not_found("course not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Assignment listing query.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentListQuery {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Restrict to one course.
    pub course_id: Option<String>,
}

/// Assignment creation body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentCreateBody {
    /// Owning course.
    pub course_id: String,
    /// Title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Submission deadline.
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}

/// Assignment update body.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentUpdateBody {
    /// Replacement title.
    #[serde(default)]
    pub title: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement deadline.
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}

/// List assignments, optionally scoped to a course.
#[utoipa::path(
    get,
    path = "/api/admin/assignments",
    params(AssignmentListQuery),
    responses(
        (status = 200, description = "Paged assignments"),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListAssignments"
)]
#[get("/assignments")]
pub async fn list_assignments(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    query: web::Query<AssignmentListQuery>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let query = query.into_inner();
    let params = page_params(query.page, query.limit)?;
    let course_id = query
        .course_id
        .as_deref()
        .map(|raw| parse_uuid(raw, FieldName::new("courseId")))
        .transpose()?;

    let (assignments, total) = state.assignments.list(course_id, params).await?;
    let items: Vec<AssignmentResponse> = assignments
        .iter()
        .map(AssignmentResponse::from_assignment)
        .collect();
    Ok(HttpResponse::Ok().json(PagedResponse::new(items, params, total)))
}

/// Create an assignment.
#[utoipa::path(
    post,
    path = "/api/admin/assignments",
    request_body = AssignmentCreateBody,
    responses(
        (status = 201, description = "Created assignment", body = AssignmentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown course", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminCreateAssignment"
)]
#[post("/assignments")]
pub async fn create_assignment(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    payload: web::Json<AssignmentCreateBody>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let body = payload.into_inner();
    let course_id = parse_uuid(&body.course_id, FieldName::new("courseId"))?;
    if state.courses.find(course_id).await?.is_none() {
        return Err(Error::not_found("course not found"));
    }

    let mut assignment = Assignment::new(course_id, &body.title, body.description, Utc::now())
        .map_err(|err| map_catalogue_error(&err))?;
    assignment.due_at = body.due_at;

    state.assignments.insert(&assignment).await?;
    Ok(HttpResponse::Created().json(AssignmentResponse::from_assignment(&assignment)))
}

/// Update an assignment.
#[utoipa::path(
    put,
    path = "/api/admin/assignments/{id}",
    params(("id" = String, Path, description = "Assignment id")),
    request_body = AssignmentUpdateBody,
    responses(
        (status = 200, description = "Updated assignment", body = AssignmentResponse),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown assignment", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateAssignment"
)]
#[put("/assignments/{id}")]
pub async fn update_assignment(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<AssignmentUpdateBody>,
) -> ApiResult<web::Json<AssignmentResponse>> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("assignmentId"))?;
    let mut assignment = state
        .assignments
        .find(id)
        .await?
        .ok_or_else(|| Error::not_found("assignment not found"))?;

    let body = payload.into_inner();
    if let Some(title) = body.title {
        assignment.title =
            crate::domain::course::validated_title(&title).map_err(|err| map_catalogue_error(&err))?;
    }
    if let Some(description) = body.description {
        assignment.description = description;
    }
    if let Some(due_at) = body.due_at {
        assignment.due_at = Some(due_at);
    }

    if !state.assignments.update(&assignment).await? {
        return Err(Error::not_found("assignment not found"));
    }
    Ok(web::Json(AssignmentResponse::from_assignment(&assignment)))
}

/// Delete an assignment.
#[utoipa::path(
    delete,
    path = "/api/admin/assignments/{id}",
    params(("id" = String, Path, description = "Assignment id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown assignment", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteAssignment"
)]
#[delete("/assignments/{id}")]
pub async fn delete_assignment(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("assignmentId"))?;
    if !state.assignments.delete(id).await? {
        return Err(Error::not_found("assignment not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Certificate listing query.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CertificateListQuery {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

/// Certificate creation body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateCreateBody {
    /// Receiving user.
    pub user_id: String,
    /// Completed course.
    pub course_id: String,
    /// Title.
    pub title: String,
}

/// List certificates.
#[utoipa::path(
    get,
    path = "/api/admin/certificates",
    params(CertificateListQuery),
    responses(
        (status = 200, description = "Paged certificates"),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListCertificates"
)]
#[get("/certificates")]
pub async fn list_certificates(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    query: web::Query<CertificateListQuery>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let params = page_params(query.page, query.limit)?;
    let (certificates, total) = state.certificates.list(params).await?;
    let items: Vec<CertificateResponse> = certificates
        .iter()
        .map(CertificateResponse::from_certificate)
        .collect();
    Ok(HttpResponse::Ok().json(PagedResponse::new(items, params, total)))
}

/// Issue a certificate.
#[utoipa::path(
    post,
    path = "/api/admin/certificates",
    request_body = CertificateCreateBody,
    responses(
        (status = 201, description = "Issued certificate", body = CertificateResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown user or course", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminIssueCertificate"
)]
#[post("/certificates")]
pub async fn issue_certificate(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    payload: web::Json<CertificateCreateBody>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let body = payload.into_inner();
    let user_id = UserId::from_uuid(parse_uuid(&body.user_id, FieldName::new("userId"))?);
    let course_id = parse_uuid(&body.course_id, FieldName::new("courseId"))?;
    if state.users.find_by_id(user_id).await?.is_none() {
        return Err(Error::not_found("user not found"));
    }
    if state.courses.find(course_id).await?.is_none() {
        return Err(Error::not_found("course not found"));
    }
    if body.title.trim().is_empty() {
        return Err(Error::invalid_request("title must not be empty")
            .with_details(json!({ "field": "title", "code": "empty_title" })));
    }

    let certificate = Certificate {
        id: Uuid::new_v4(),
        user_id,
        course_id,
        title: body.title.trim().to_owned(),
        issued_at: Utc::now(),
    };
    state.certificates.insert(&certificate).await?;
    Ok(HttpResponse::Created().json(CertificateResponse::from_certificate(&certificate)))
}

/// Revoke a certificate.
#[utoipa::path(
    delete,
    path = "/api/admin/certificates/{id}",
    params(("id" = String, Path, description = "Certificate id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown certificate", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteCertificate"
)]
#[delete("/certificates/{id}")]
pub async fn delete_certificate(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("certificateId"))?;
    if !state.certificates.delete(id).await? {
        return Err(Error::not_found("certificate not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Enrollment listing query.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentListQuery {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Restrict to one user.
    pub user_id: Option<String>,
    /// Restrict to one status.
    pub status: Option<String>,
}

/// Admin enrollment update body.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentUpdateBody {
    /// Replacement progress percentage.
    #[serde(default)]
    pub progress: Option<u8>,
    /// Replacement status.
    #[serde(default)]
    pub status: Option<String>,
}

/// List enrollments with filtering.
#[utoipa::path(
    get,
    path = "/api/admin/enrollments",
    params(EnrollmentListQuery),
    responses(
        (status = 200, description = "Paged enrollments"),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListEnrollments"
)]
#[get("/enrollments")]
pub async fn list_enrollments(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    query: web::Query<EnrollmentListQuery>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let query = query.into_inner();
    let params = page_params(query.page, query.limit)?;
    let user_id = query
        .user_id
        .as_deref()
        .map(|raw| parse_uuid(raw, FieldName::new("userId")).map(UserId::from_uuid))
        .transpose()?;
    let status = query
        .status
        .as_deref()
        .map(EnrollmentStatus::parse)
        .transpose()
        .map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "status", "code": "unknown_status" }))
        })?;
    let filter = EnrollmentListFilter { user_id, status };

    let (enrollments, total) = state.enrollments.list(&filter, params).await?;
    let items: Vec<EnrollmentResponse> = enrollments
        .iter()
        .map(EnrollmentResponse::from_enrollment)
        .collect();
    Ok(HttpResponse::Ok().json(PagedResponse::new(items, params, total)))
}

/// Update an enrollment's progress or status.
#[utoipa::path(
    put,
    path = "/api/admin/enrollments/{id}",
    params(("id" = String, Path, description = "Enrollment id")),
    request_body = EnrollmentUpdateBody,
    responses(
        (status = 200, description = "Updated enrollment", body = EnrollmentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown enrollment", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateEnrollment"
)]
#[put("/enrollments/{id}")]
pub async fn update_enrollment(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<EnrollmentUpdateBody>,
) -> ApiResult<web::Json<EnrollmentResponse>> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("enrollmentId"))?;
    let mut enrollment = state
        .enrollments
        .find(id)
        .await?
        .ok_or_else(|| Error::not_found("enrollment not found"))?;

    let body = payload.into_inner();
    if let Some(progress) = body.progress {
        let progress = Progress::new(progress).map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "progress", "code": "progress_out_of_range" }))
        })?;
        enrollment.record_progress(progress);
    }
    if let Some(status) = body.status {
        enrollment.status = EnrollmentStatus::parse(&status).map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "status", "code": "unknown_status" }))
        })?;
    }

    if !state.enrollments.update(&enrollment).await? {
        return Err(Error::not_found("enrollment not found"));
    }
    Ok(web::Json(EnrollmentResponse::from_enrollment(&enrollment)))
}

/// Delete an enrollment.
#[utoipa::path(
    delete,
    path = "/api/admin/enrollments/{id}",
    params(("id" = String, Path, description = "Enrollment id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown enrollment", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteEnrollment"
)]
#[delete("/enrollments/{id}")]
pub async fn delete_enrollment(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("enrollmentId"))?;
    if !state.enrollments.delete(id).await? {
        return Err(Error::not_found("enrollment not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    //! Course CRUD round trip through the admin surface.
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    use crate::domain::AccountType;
    use crate::domain::ports::AdminUserUpdate;
    use crate::inbound::http::users::register;

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
            web::scope("/api").service(register).service(
                web::scope("/admin")
                    .service(list_courses)
                    .service(create_course)
                    .service(update_course)
                    .service(delete_course)
                    .service(list_assignments)
                    .service(create_assignment),
            ),
        )
    }

    async fn admin_token(
        state: &HttpState,
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
    ) -> String {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/api/register")
                .set_json(serde_json::json!({
                    "email": "admin@example.com",
                    "password": "a strong password",
                    "displayName": "Admin",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        let id = UserId::new(
            body.pointer("/user/id")
                .and_then(Value::as_str)
                .expect("id present"),
        )
        .expect("valid id");
        state
            .users
            .admin_update(
                id,
                &AdminUserUpdate {
                    account_type: Some(AccountType::Admin),
                    ..AdminUserUpdate::default()
                },
            )
            .await
            .expect("promotion succeeds");
        body.get("token")
            .and_then(Value::as_str)
            .expect("token present")
            .to_owned()
    }

    #[actix_web::test]
    async fn course_crud_round_trips() {
        let state = HttpState::in_memory("http://x");
        let app = actix_test::init_service(test_app(state.clone())).await;
        let token = admin_token(&state, &app).await;

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/admin/courses")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .set_json(serde_json::json!({
                    "title": "Rust 101",
                    "description": "intro",
                    "category": "engineering",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let course: Value = actix_test::read_body_json(created).await;
        let id = course.get("id").and_then(Value::as_str).expect("course id");

        let updated = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/admin/courses/{id}"))
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .set_json(serde_json::json!({ "title": "Rust 201" }))
                .to_request(),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(updated).await;
        assert_eq!(body.get("title").and_then(Value::as_str), Some("Rust 201"));

        let listed = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/admin/courses?search=rust")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        let body: Value = actix_test::read_body_json(listed).await;
        assert_eq!(
            body.get("items").and_then(Value::as_array).map(Vec::len),
            Some(1)
        );

        let deleted = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/admin/courses/{id}"))
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn assignments_require_an_existing_course() {
        let state = HttpState::in_memory("http://x");
        let app = actix_test::init_service(test_app(state.clone())).await;
        let token = admin_token(&state, &app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/admin/assignments")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .set_json(serde_json::json!({
                    "courseId": Uuid::new_v4().to_string(),
                    "title": "Homework",
                    "description": "do it",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
