//! Admin user management.
//!
//! ```text
//! GET    /api/admin/users?page=1&limit=10&search=ada&accountType=student
//! PUT    /api/admin/users/{id}
//! DELETE /api/admin/users/{id}      soft delete (is_active = false)
//! ```

use actix_web::{HttpResponse, delete, get, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::{AdminUserUpdate, UserListFilter};
use crate::domain::user::{DisplayName, UserValidationError};
use crate::domain::{AccountType, Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::admin::PagedResponse;
use crate::inbound::http::auth::AuthedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::UserResponse;
use crate::inbound::http::validation::{FieldName, page_params, parse_uuid};

/// Admin user listing query.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Substring match against display name or email.
    pub search: Option<String>,
    /// Restrict to one role.
    pub account_type: Option<String>,
}

/// Admin user update body.
#[derive(Debug, Clone, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserUpdateBody {
    /// Replacement display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Replacement role.
    #[serde(default)]
    pub account_type: Option<String>,
    /// Replacement active flag.
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Replacement verified flag.
    #[serde(default)]
    pub is_verified: Option<bool>,
}

/// List accounts with pagination, search and role filtering.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Paged accounts"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminListUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    query: web::Query<UserListQuery>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let query = query.into_inner();
    let params = page_params(query.page, query.limit)?;
    let account_type = query
        .account_type
        .as_deref()
        .map(AccountType::parse)
        .transpose()
        .map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "accountType", "code": "invalid_account_type" }))
        })?;
    let filter = UserListFilter {
        search: query.search,
        account_type,
    };

    let (users, total) = state.users.list(&filter, params).await?;
    let items: Vec<UserResponse> = users
        .iter()
        .map(|user| UserResponse::from_user(&state, user))
        .collect();
    Ok(HttpResponse::Ok().json(PagedResponse::new(items, params, total)))
}

/// Update an account's profile, role and flags.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = AdminUserUpdateBody,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminUpdateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<AdminUserUpdateBody>,
) -> ApiResult<web::Json<UserResponse>> {
    admin.require_admin()?;
    let id = UserId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("userId"))?);
    let body = payload.into_inner();

    let display_name = body
        .display_name
        .map(DisplayName::new)
        .transpose()
        .map_err(|err: UserValidationError| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "displayName", "code": "invalid_display_name" }))
        })?;
    let account_type = body
        .account_type
        .as_deref()
        .map(AccountType::parse)
        .transpose()
        .map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "accountType", "code": "invalid_account_type" }))
        })?;

    let update = AdminUserUpdate {
        display_name,
        account_type,
        is_active: body.is_active,
        is_verified: body.is_verified,
    };
    let updated = state
        .users
        .admin_update(id, &update)
        .await?
        .ok_or_else(|| Error::not_found("user not found"))?;
    Ok(web::Json(UserResponse::from_user(&state, &updated)))
}

/// Soft-delete an account.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deactivated"),
        (status = 403, description = "Admin required", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["admin"],
    operation_id = "adminDeactivateUser"
)]
#[delete("/users/{id}")]
pub async fn deactivate_user(
    state: web::Data<HttpState>,
    admin: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    admin.require_admin()?;
    let id = UserId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("userId"))?);
    if !state.users.deactivate(id).await? {
        return Err(Error::not_found("user not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    //! Role gating and admin update coverage.
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

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
                    .service(list_users)
                    .service(update_user)
                    .service(deactivate_user),
            ),
        )
    }

    async fn register_user(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        email: &str,
    ) -> (String, UserId) {
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
        let token = body
            .get("token")
            .and_then(Value::as_str)
            .expect("token present")
            .to_owned();
        let id = UserId::new(
            body.pointer("/user/id")
                .and_then(Value::as_str)
                .expect("id present"),
        )
        .expect("valid id");
        (token, id)
    }

    async fn promote_to_admin(state: &HttpState, id: UserId) {
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
    }

    #[actix_web::test]
    async fn non_admins_are_forbidden() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let (token, _) = register_user(&app, "student@example.com").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/admin/users")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn admins_list_search_and_deactivate_users() {
        let state = HttpState::in_memory("http://x");
        let app = actix_test::init_service(test_app(state.clone())).await;
        let (admin_token, admin_id) = register_user(&app, "admin@example.com").await;
        promote_to_admin(&state, admin_id).await;
        let (_, student_id) = register_user(&app, "student@example.com").await;

        let list = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/admin/users?search=student")
                .insert_header((AUTHORIZATION, format!("Bearer {admin_token}")))
                .to_request(),
        )
        .await;
        assert_eq!(list.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(list).await;
        assert_eq!(
            body.get("items").and_then(Value::as_array).map(Vec::len),
            Some(1)
        );
        assert_eq!(
            body.pointer("/pagination/totalItems").and_then(Value::as_u64),
            Some(1)
        );

        let delete = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/admin/users/{student_id}"))
                .insert_header((AUTHORIZATION, format!("Bearer {admin_token}")))
                .to_request(),
        )
        .await;
        assert_eq!(delete.status(), StatusCode::NO_CONTENT);

        let stored = state
            .users
            .find_by_id(student_id)
            .await
            .expect("query runs")
            .expect("user still stored");
        assert!(!stored.is_active);
    }

    #[actix_web::test]
    async fn admins_change_roles_and_flags() {
        let state = HttpState::in_memory("http://x");
        let app = actix_test::init_service(test_app(state.clone())).await;
        let (admin_token, admin_id) = register_user(&app, "admin@example.com").await;
        promote_to_admin(&state, admin_id).await;
        let (_, student_id) = register_user(&app, "student@example.com").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/admin/users/{student_id}"))
                .insert_header((AUTHORIZATION, format!("Bearer {admin_token}")))
                .set_json(serde_json::json!({
                    "accountType": "professional",
                    "isVerified": true,
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body.get("accountType").and_then(Value::as_str),
            Some("professional")
        );
        assert_eq!(body.get("isVerified").and_then(Value::as_bool), Some(true));
    }
}
