//! Admin management of the services taxonomy and request workflow.
//!
//! ```text
//! GET/POST   /api/admin/service-categories      PUT/DELETE /api/admin/service-categories/{id}
//! GET/POST   /api/admin/service-subcategories   PUT/DELETE /api/admin/service-subcategories/{id}
//! GET        /api/admin/service-requests        PUT/DELETE /api/admin/service-requests/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::RequestListFilter;
use crate::domain::services::{
    ServiceCategory, ServiceRequestStatus, ServiceSubcategory, validated_name,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::admin::PagedResponse;
use crate::inbound::http::auth::AuthedUser;
use crate::inbound::http::services::{
    CategoryResponse, ServiceRequestResponse, SubcategoryResponse, map_services_validation_error,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, page_params, parse_uuid};

/// Category create/update body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBody {
    /// Category name.
    pub name: String,
    /// Category description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Subcategory creation body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryBody {
    /// Owning category.
    pub category_id: String,
    /// Subcategory name.
    pub name: String,
    /// Subcategory description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Request listing query.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RequestListQuery {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Restrict to one workflow status.
    pub status: Option<String>,
    /// Substring match against contact name or email.
    pub search: Option<String>,
}

/// Request status update body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatusBody {
    /// Target workflow status.
    pub status: String,
}

/// All service categories.
#[utoipa::path(
    get,
    path = "/api/admin/service-categories",
    responses(
        (status = 200, description = "Categories", body = [CategoryResponse]),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListServiceCategories"
)]
#[get("/service-categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
    admin: AuthedUser,
) -> ApiResult<web::Json<Vec<CategoryResponse>>> {
    admin.require_admin()?;
    let categories = state.service_catalog.categories().await?;
    Ok(web::Json(
        categories
            .iter()
            .map(CategoryResponse::from_category)
            .collect(),
    ))
}

/// Create a category.
#[utoipa::path(
    post,
    path = "/api/admin/service-categories",
    request_body = CategoryBody,
    responses(
        (status = 201, description = "Created category", body = CategoryResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminCreateServiceCategory"
)]
#[post("/service-categories")]
pub async fn create_category(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    payload: web::Json<CategoryBody>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let body = payload.into_inner();
    let category = ServiceCategory {
        id: Uuid::new_v4(),
        name: validated_name(&body.name).map_err(|err| map_services_validation_error(&err))?,
        description: body.description,
        created_at: Utc::now(),
    };
    state.service_catalog.insert_category(&category).await?;
    Ok(HttpResponse::Created().json(CategoryResponse::from_category(&category)))
}

/// Rename or re-describe a category.
#[utoipa::path(
    put,
    path = "/api/admin/service-categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    request_body = CategoryBody,
    responses(
        (status = 200, description = "Updated category", body = CategoryResponse),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown category", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateServiceCategory"
)]
#[put("/service-categories/{id}")]
pub async fn update_category(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<CategoryBody>,
) -> ApiResult<web::Json<CategoryResponse>> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("categoryId"))?;
    let body = payload.into_inner();
    let categories = state.service_catalog.categories().await?;
    let mut category = categories
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| Error::not_found("service category not found"))?;

    category.name = validated_name(&body.name).map_err(|err| map_services_validation_error(&err))?;
    category.description = body.description;
    if !state.service_catalog.update_category(&category).await? {
        return Err(Error::not_found("service category not found"));
    }
    Ok(web::Json(CategoryResponse::from_category(&category)))
}

/// Delete a category and its subcategories.
#[utoipa::path(
    delete,
    path = "/api/admin/service-categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown category", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteServiceCategory"
)]
#[delete("/service-categories/{id}")]
pub async fn delete_category(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("categoryId"))?;
    if !state.service_catalog.delete_category(id).await? {
        return Err(Error::not_found("service category not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// All subcategories.
#[utoipa::path(
    get,
    path = "/api/admin/service-subcategories",
    responses(
        (status = 200, description = "Subcategories", body = [SubcategoryResponse]),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListServiceSubcategories"
)]
#[get("/service-subcategories")]
pub async fn list_subcategories(
    state: web::Data<HttpState>,
    admin: AuthedUser,
) -> ApiResult<web::Json<Vec<SubcategoryResponse>>> {
    admin.require_admin()?;
    let subcategories = state.service_catalog.subcategories(None).await?;
    Ok(web::Json(
        subcategories
            .iter()
            .map(SubcategoryResponse::from_subcategory)
            .collect(),
    ))
}

/// Create a subcategory under an existing category.
#[utoipa::path(
    post,
    path = "/api/admin/service-subcategories",
    request_body = SubcategoryBody,
    responses(
        (status = 201, description = "Created subcategory", body = SubcategoryResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown category", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminCreateServiceSubcategory"
)]
#[post("/service-subcategories")]
pub async fn create_subcategory(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    payload: web::Json<SubcategoryBody>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let body = payload.into_inner();
    let category_id = parse_uuid(&body.category_id, FieldName::new("categoryId"))?;
    let categories = state.service_catalog.categories().await?;
    if !categories.iter().any(|c| c.id == category_id) {
        return Err(Error::not_found("service category not found"));
    }

    let subcategory = ServiceSubcategory {
        id: Uuid::new_v4(),
        category_id,
        name: validated_name(&body.name).map_err(|err| map_services_validation_error(&err))?,
        description: body.description,
        created_at: Utc::now(),
    };
    state
        .service_catalog
        .insert_subcategory(&subcategory)
        .await?;
    Ok(HttpResponse::Created().json(SubcategoryResponse::from_subcategory(&subcategory)))
}

/// Rename or re-describe a subcategory.
#[utoipa::path(
    put,
    path = "/api/admin/service-subcategories/{id}",
    params(("id" = String, Path, description = "Subcategory id")),
    request_body = CategoryBody,
    responses(
        (status = 200, description = "Updated subcategory", body = SubcategoryResponse),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown subcategory", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateServiceSubcategory"
)]
#[put("/service-subcategories/{id}")]
pub async fn update_subcategory(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<CategoryBody>,
) -> ApiResult<web::Json<SubcategoryResponse>> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("subcategoryId"))?;
    let mut subcategory = state
        .service_catalog
        .find_subcategory(id)
        .await?
        .ok_or_else(|| Error::not_found("service subcategory not found"))?;

    let body = payload.into_inner();
    subcategory.name =
        validated_name(&body.name).map_err(|err| map_services_validation_error(&err))?;
    subcategory.description = body.description;
    if !state
        .service_catalog
        .update_subcategory(&subcategory)
        .await?
    {
        return Err(Error::not_found("service subcategory not found"));
    }
    Ok(web::Json(SubcategoryResponse::from_subcategory(
        &subcategory,
    )))
}

/// Delete a subcategory.
#[utoipa::path(
    delete,
    path = "/api/admin/service-subcategories/{id}",
    params(("id" = String, Path, description = "Subcategory id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown subcategory", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteServiceSubcategory"
)]
#[delete("/service-subcategories/{id}")]
pub async fn delete_subcategory(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("subcategoryId"))?;
    if !state.service_catalog.delete_subcategory(id).await? {
        return Err(Error::not_found("service subcategory not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}

/// List service requests with workflow and search filters.
#[utoipa::path(
    get,
    path = "/api/admin/service-requests",
    params(RequestListQuery),
    responses(
        (status = 200, description = "Paged requests"),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListServiceRequests"
)]
#[get("/service-requests")]
pub async fn list_requests(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    query: web::Query<RequestListQuery>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let query = query.into_inner();
    let params = page_params(query.page, query.limit)?;
    let status = query
        .status
        .as_deref()
        .map(ServiceRequestStatus::parse)
        .transpose()
        .map_err(|err| map_services_validation_error(&err))?;
    let filter = RequestListFilter {
        status,
        search: query.search,
    };

    let (requests, total) = state.service_requests.list(&filter, params).await?;
    let items: Vec<ServiceRequestResponse> = requests
        .iter()
        .map(ServiceRequestResponse::from_request)
        .collect();
    Ok(HttpResponse::Ok().json(PagedResponse::new(items, params, total)))
}

/// Move a request through its workflow.
///
/// Terminal states (completed, cancelled) reject further transitions with
/// `409 Conflict`.
#[utoipa::path(
    put,
    path = "/api/admin/service-requests/{id}",
    params(("id" = String, Path, description = "Request id")),
    request_body = RequestStatusBody,
    responses(
        (status = 200, description = "Updated request", body = ServiceRequestResponse),
        (status = 400, description = "Unknown status", body = Error),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown request", body = Error),
        (status = 409, description = "Transition out of a terminal state", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateServiceRequest"
)]
#[put("/service-requests/{id}")]
pub async fn update_request(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<RequestStatusBody>,
) -> ApiResult<web::Json<ServiceRequestResponse>> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("requestId"))?;
    let mut request = state
        .service_requests
        .find(id)
        .await?
        .ok_or_else(|| Error::not_found("service request not found"))?;

    let next = ServiceRequestStatus::parse(&payload.status)
        .map_err(|err| map_services_validation_error(&err))?;
    request.transition_to(next).map_err(|err| {
        Error::conflict(err.to_string()).with_details(json!({ "code": "invalid_transition" }))
    })?;

    if !state.service_requests.update(&request).await? {
        return Err(Error::not_found("service request not found"));
    }
    Ok(web::Json(ServiceRequestResponse::from_request(&request)))
}

/// Delete a request.
#[utoipa::path(
    delete,
    path = "/api/admin/service-requests/{id}",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown request", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDeleteServiceRequest"
)]
#[delete("/service-requests/{id}")]
pub async fn delete_request(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let id = parse_uuid(&path.into_inner(), FieldName::new("requestId"))?;
    if !state.service_requests.delete(id).await? {
        return Err(Error::not_found("service request not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}
