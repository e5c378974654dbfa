//! Services marketplace API handlers.
//!
//! ```text
//! GET  /api/services/categories
//! GET  /api/services/categories/{id}/subcategories
//! POST /api/services/requests        guest or authenticated
//! GET  /api/users/{userId}/service-requests
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::services::{
    ServiceCategory, ServiceRequest, ServiceRequestDraft, ServiceRequestStatus,
    ServiceSubcategory, ServicesValidationError,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AuthedUser, MaybeAuthed};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Category payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Category id.
    pub id: Uuid,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

impl CategoryResponse {
    pub(crate) fn from_category(category: &ServiceCategory) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            description: category.description.clone(),
        }
    }
}

/// Subcategory payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryResponse {
    /// Subcategory id.
    pub id: Uuid,
    /// Owning category.
    pub category_id: Uuid,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
}

impl SubcategoryResponse {
    pub(crate) fn from_subcategory(subcategory: &ServiceSubcategory) -> Self {
        Self {
            id: subcategory.id,
            category_id: subcategory.category_id,
            name: subcategory.name.clone(),
            description: subcategory.description.clone(),
        }
    }
}

/// Service request payload.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestResponse {
    /// Request id.
    pub id: Uuid,
    /// Target subcategory.
    pub subcategory_id: Uuid,
    /// Submitting account, when authenticated.
    pub user_id: Option<UserId>,
    /// Contact name.
    pub contact_name: String,
    /// Contact email.
    pub contact_email: String,
    /// Project description.
    pub project_details: String,
    /// Budget indication.
    pub budget: Option<String>,
    /// Timeline indication.
    pub timeline: Option<String>,
    /// Workflow state.
    pub status: ServiceRequestStatus,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

impl ServiceRequestResponse {
    pub(crate) fn from_request(request: &ServiceRequest) -> Self {
        Self {
            id: request.id,
            subcategory_id: request.subcategory_id,
            user_id: request.user_id,
            contact_name: request.contact_name.clone(),
            contact_email: request.contact_email.as_str().to_owned(),
            project_details: request.project_details.clone(),
            budget: request.budget.clone(),
            timeline: request.timeline.clone(),
            status: request.status,
            created_at: request.created_at,
        }
    }
}

/// Service request submission body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequestBody {
    /// Target subcategory.
    pub subcategory_id: String,
    /// Contact name.
    pub contact_name: String,
    /// Contact email.
    pub contact_email: String,
    /// Project description.
    pub project_details: String,
    /// Budget indication.
    #[serde(default)]
    pub budget: Option<String>,
    /// Timeline indication.
    #[serde(default)]
    pub timeline: Option<String>,
}

pub(crate) fn map_services_validation_error(err: &ServicesValidationError) -> Error {
    let code = match err {
        ServicesValidationError::EmptyName => "empty_name",
        ServicesValidationError::EmptyDetails => "empty_details",
        ServicesValidationError::ContactEmail(_) => "invalid_email",
        ServicesValidationError::UnknownStatus => "unknown_status",
        ServicesValidationError::InvalidTransition { .. } => "invalid_transition",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "code": code }))
}

/// The services taxonomy, top level.
#[utoipa::path(
    get,
    path = "/api/services/categories",
    responses(
        (status = 200, description = "Categories", body = [CategoryResponse])
    ),
    tags = ["services"],
    operation_id = "listServiceCategories",
    security([])
)]
#[get("/services/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<CategoryResponse>>> {
    let categories = state.service_catalog.categories().await?;
    Ok(web::Json(
        categories
            .iter()
            .map(CategoryResponse::from_category)
            .collect(),
    ))
}

/// Subcategories under one category.
#[utoipa::path(
    get,
    path = "/api/services/categories/{id}/subcategories",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Subcategories", body = [SubcategoryResponse])
    ),
    tags = ["services"],
    operation_id = "listServiceSubcategories",
    security([])
)]
#[get("/services/categories/{id}/subcategories")]
pub async fn list_subcategories(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<SubcategoryResponse>>> {
    let category = parse_uuid(&path.into_inner(), FieldName::new("categoryId"))?;
    let subcategories = state.service_catalog.subcategories(Some(category)).await?;
    Ok(web::Json(
        subcategories
            .iter()
            .map(SubcategoryResponse::from_subcategory)
            .collect(),
    ))
}

/// Submit a service request. Guests supply contact details; authenticated
/// requests are linked to the account as well.
#[utoipa::path(
    post,
    path = "/api/services/requests",
    request_body = SubmitRequestBody,
    responses(
        (status = 201, description = "Request stored", body = ServiceRequestResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown subcategory", body = Error)
    ),
    tags = ["services"],
    operation_id = "submitServiceRequest",
    security([])
)]
#[post("/services/requests")]
pub async fn submit_request(
    state: web::Data<HttpState>,
    requester: MaybeAuthed,
    payload: web::Json<SubmitRequestBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let subcategory_id = parse_uuid(&body.subcategory_id, FieldName::new("subcategoryId"))?;
    if state
        .service_catalog
        .find_subcategory(subcategory_id)
        .await?
        .is_none()
    {
        return Err(Error::not_found("service subcategory not found"));
    }

    let request = ServiceRequest::submit(ServiceRequestDraft {
        subcategory_id,
        user_id: requester.0.map(|user| user.id),
        contact_name: body.contact_name,
        contact_email: body.contact_email,
        project_details: body.project_details,
        budget: body.budget,
        timeline: body.timeline,
        now: Utc::now(),
    })
    .map_err(|err| map_services_validation_error(&err))?;

    state.service_requests.insert(&request).await?;
    Ok(HttpResponse::Created().json(ServiceRequestResponse::from_request(&request)))
}

/// A user's service requests, visible to that user and to admins.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/service-requests",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Requests", body = [ServiceRequestResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["services"],
    operation_id = "listUserServiceRequests"
)]
#[get("/users/{user_id}/service-requests")]
pub async fn list_user_requests(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ServiceRequestResponse>>> {
    let target = UserId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("userId"))?);
    user.require_self_or_admin(target)?;

    let requests = state.service_requests.for_user(target).await?;
    Ok(web::Json(
        requests
            .iter()
            .map(ServiceRequestResponse::from_request)
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    //! Marketplace endpoint coverage over the in-memory state.
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

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
                .service(list_categories)
                .service(list_subcategories)
                .service(submit_request)
                .service(list_user_requests),
        )
    }

    async fn seeded_subcategory(state: &HttpState) -> ServiceSubcategory {
        let category = ServiceCategory {
            id: Uuid::new_v4(),
            name: "Design".into(),
            description: None,
            created_at: Utc::now(),
        };
        state
            .service_catalog
            .insert_category(&category)
            .await
            .expect("category stored");
        let subcategory = ServiceSubcategory {
            id: Uuid::new_v4(),
            category_id: category.id,
            name: "Branding".into(),
            description: None,
            created_at: Utc::now(),
        };
        state
            .service_catalog
            .insert_subcategory(&subcategory)
            .await
            .expect("subcategory stored");
        subcategory
    }

    #[actix_web::test]
    async fn guests_submit_requests_that_start_pending() {
        let state = HttpState::in_memory("http://x");
        let subcategory = seeded_subcategory(&state).await;
        let app = actix_test::init_service(test_app(state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/services/requests")
                .set_json(serde_json::json!({
                    "subcategoryId": subcategory.id.to_string(),
                    "contactName": "Ada",
                    "contactEmail": "Ada@Example.com",
                    "projectDetails": "Need a brand refresh",
                    "budget": "1-2k",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.get("status").and_then(Value::as_str), Some("pending"));
        assert_eq!(
            body.get("contactEmail").and_then(Value::as_str),
            Some("ada@example.com")
        );
        assert!(body.get("userId").expect("field present").is_null());
    }

    #[actix_web::test]
    async fn requests_against_unknown_subcategories_404() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/services/requests")
                .set_json(serde_json::json!({
                    "subcategoryId": Uuid::new_v4().to_string(),
                    "contactName": "Ada",
                    "contactEmail": "ada@example.com",
                    "projectDetails": "anything",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn taxonomy_reads_are_public() {
        let state = HttpState::in_memory("http://x");
        let subcategory = seeded_subcategory(&state).await;
        let app = actix_test::init_service(test_app(state)).await;

        let categories = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/services/categories")
                .to_request(),
        )
        .await;
        assert_eq!(categories.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(categories).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let subcategories = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!(
                    "/api/services/categories/{}/subcategories",
                    subcategory.category_id
                ))
                .to_request(),
        )
        .await;
        assert_eq!(subcategories.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(subcategories).await;
        assert_eq!(
            body.pointer("/0/name").and_then(Value::as_str),
            Some("Branding")
        );
    }
}
