//! Account API handlers.
//!
//! ```text
//! POST /api/register            {"email":"a@b.co","password":"...","displayName":"Ada"}
//! POST /api/login               {"email":"a@b.co","password":"..."}
//! GET  /auth/me
//! PUT  /auth/profile
//! POST /auth/avatar             multipart image upload
//! POST /auth/logout
//! POST /api/users/{id}/connect
//! ```

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::domain::user::{DisplayName, ProfileUpdate, User, UserValidationError};
use crate::domain::{
    AccountType, AuthValidationError, Error, LoginCredentials, RegistrationRequest, UserId,
};
use crate::domain::ports::ImageNamespace;
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{AuthedUser, BearerToken};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::uploads::read_image_field;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Public account payload returned by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Account id.
    pub id: UserId,
    /// Normalised email.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Account role.
    pub account_type: AccountType,
    /// Profile headline.
    pub headline: Option<String>,
    /// Profile biography.
    pub bio: Option<String>,
    /// Absolute avatar URL, when one is uploaded.
    pub avatar_url: Option<String>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Email verification flag.
    pub is_verified: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserResponse {
    pub(crate) fn from_user(state: &HttpState, user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            display_name: user.display_name.as_str().to_owned(),
            account_type: user.account_type,
            headline: user.headline.clone(),
            bio: user.bio.clone(),
            avatar_url: user
                .avatar_path
                .as_deref()
                .map(|path| state.absolute_media_url(path)),
            is_active: user.is_active,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

/// Token plus account payload returned by register and login.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The authenticated account.
    pub user: UserResponse,
}

/// Registration request body for `POST /api/register`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestBody {
    /// Login email.
    pub email: String,
    /// Plaintext password, hashed server-side.
    pub password: String,
    /// Public display name.
    pub display_name: String,
    /// Requested role; defaults to student.
    #[serde(default)]
    pub account_type: Option<String>,
}

/// Login request body for `POST /api/login`.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestBody {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Profile update body for `PUT /auth/profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateBody {
    /// Replacement display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Replacement headline.
    #[serde(default)]
    pub headline: Option<String>,
    /// Replacement biography.
    #[serde(default)]
    pub bio: Option<String>,
}

fn map_auth_validation_error(err: AuthValidationError) -> Error {
    let (field, code) = match &err {
        AuthValidationError::Email(_) => ("email", "invalid_email"),
        AuthValidationError::EmptyPassword | AuthValidationError::PasswordTooShort { .. } => {
            ("password", "invalid_password")
        }
        AuthValidationError::DisplayName(_) => ("displayName", "invalid_display_name"),
        AuthValidationError::ReservedAccountType | AuthValidationError::AccountType(_) => {
            ("accountType", "invalid_account_type")
        }
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequestBody,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request or duplicate email", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequestBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let account_type = body.account_type.as_deref().unwrap_or("student");
    let request = RegistrationRequest::try_from_parts(
        &body.email,
        &body.password,
        &body.display_name,
        account_type,
    )
    .map_err(map_auth_validation_error)?;

    let session = state.accounts.register(&request).await?;
    let response = AuthResponse {
        token: session.token.expose().to_owned(),
        user: UserResponse::from_user(&state, &session.user),
    };
    Ok(HttpResponse::Created().json(response))
}

/// Authenticate and issue a bearer token.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequestBody,
    responses(
        (status = 200, description = "Login success", body = AuthResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials or deactivated account", body = Error),
        (status = 500, description = "Internal server error")
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequestBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&body.email, &body.password)
        .map_err(map_auth_validation_error)?;

    let session = state.accounts.login(&credentials).await?;
    let response = AuthResponse {
        token: session.token.expose().to_owned(),
        user: UserResponse::from_user(&state, &session.user),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Current account behind the presented token.
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    user: AuthedUser,
) -> ApiResult<web::Json<UserResponse>> {
    Ok(web::Json(UserResponse::from_user(&state, user.user())))
}

/// Update the caller's profile fields.
#[utoipa::path(
    put,
    path = "/auth/profile",
    request_body = ProfileUpdateBody,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["auth"],
    operation_id = "updateProfile"
)]
#[put("/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    user: AuthedUser,
    payload: web::Json<ProfileUpdateBody>,
) -> ApiResult<web::Json<UserResponse>> {
    let body = payload.into_inner();
    let display_name = body
        .display_name
        .map(DisplayName::new)
        .transpose()
        .map_err(|err: UserValidationError| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "displayName", "code": "invalid_display_name" }))
        })?;
    let update = ProfileUpdate {
        display_name,
        headline: body.headline,
        bio: body.bio,
    };

    let updated = state
        .users
        .update_profile(user.id(), &update)
        .await?
        .ok_or_else(|| Error::not_found("account not found"))?;
    Ok(web::Json(UserResponse::from_user(&state, &updated)))
}

/// Upload the caller's avatar image.
#[utoipa::path(
    post,
    path = "/auth/avatar",
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid upload", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["auth"],
    operation_id = "uploadAvatar"
)]
#[post("/avatar")]
pub async fn upload_avatar(
    state: web::Data<HttpState>,
    user: AuthedUser,
    mut payload: Multipart,
) -> ApiResult<web::Json<UserResponse>> {
    let (filename, bytes) = read_image_field(&mut payload).await?;
    let path = state
        .images
        .save(ImageNamespace::Avatars, &filename, bytes)
        .await?;

    let previous = user.user().avatar_path.clone();
    let updated = state
        .users
        .set_avatar_path(user.id(), &path)
        .await?
        .ok_or_else(|| Error::not_found("account not found"))?;

    // Best-effort cleanup of the replaced image.
    if let Some(old) = previous {
        if let Err(error) = state.images.delete(&old).await {
            warn!(%error, path = %old, "failed to delete replaced avatar");
        }
    }
    Ok(web::Json(UserResponse::from_user(&state, &updated)))
}

/// Revoke the presented token.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    token: BearerToken,
) -> ApiResult<HttpResponse> {
    state.accounts.logout(&token.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Connect the caller with another user.
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/connect",
    params(("user_id" = String, Path, description = "Peer user id")),
    responses(
        (status = 204, description = "Connected"),
        (status = 400, description = "Already connected or self-connection", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["users"],
    operation_id = "connect"
)]
#[post("/users/{user_id}/connect")]
pub async fn connect(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let peer = UserId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("userId"))?);
    if peer == user.id() {
        return Err(Error::invalid_request("cannot connect to yourself")
            .with_details(json!({ "code": "self_connection" })));
    }
    if state.users.find_by_id(peer).await?.is_none() {
        return Err(Error::not_found("user not found"));
    }
    state
        .connections
        .connect(user.id(), peer)
        .await
        .map_err(|err| match err {
            crate::domain::ports::RepositoryError::Duplicate { .. } => {
                Error::invalid_request("already connected")
                    .with_details(json!({ "code": "already_connected" }))
            }
            other => other.into(),
        })?;
    Ok(HttpResponse::NoContent().finish())
}

/// Remove a connection.
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/connect",
    params(("user_id" = String, Path, description = "Peer user id")),
    responses(
        (status = 204, description = "Disconnected"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No such connection", body = Error)
    ),
    tags = ["users"],
    operation_id = "disconnect"
)]
#[delete("/users/{user_id}/connect")]
pub async fn disconnect(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let peer = UserId::from_uuid(parse_uuid(&path.into_inner(), FieldName::new("userId"))?);
    if !state.connections.disconnect(user.id(), peer).await? {
        return Err(Error::not_found("connection not found"));
    }
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    //! Account endpoint coverage over the in-memory state.
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test as actix_test};
    use serde_json::{Value, json};


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
        App::new()
            .app_data(web::Data::new(state))
            .service(
                web::scope("/api")
                    .service(register)
                    .service(login)
                    .service(connect)
                    .service(disconnect),
            )
            .service(
                web::scope("/auth")
                    .service(current_user)
                    .service(update_profile)
                    .service(upload_avatar)
                    .service(logout),
            )
    }

    fn register_body(email: &str) -> Value {
        json!({
            "email": email,
            "password": "a strong password",
            "displayName": "Ada Lovelace",
        })
    }

    async fn register_via_api(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        email: &str,
    ) -> (String, Value) {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/api/register")
                .set_json(register_body(email))
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
        (token, body)
    }

    #[actix_web::test]
    async fn register_returns_a_token_and_camel_case_user() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let (_, body) = register_via_api(&app, "Ada@Example.com").await;

        let user = body.get("user").expect("user present");
        assert_eq!(
            user.get("email").and_then(Value::as_str),
            Some("ada@example.com")
        );
        assert_eq!(
            user.get("displayName").and_then(Value::as_str),
            Some("Ada Lovelace")
        );
        assert_eq!(
            user.get("accountType").and_then(Value::as_str),
            Some("student")
        );
        assert!(user.get("display_name").is_none());
    }

    #[actix_web::test]
    async fn duplicate_email_registration_is_rejected_case_insensitively() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let _ = register_via_api(&app, "ada@example.com").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/register")
                .set_json(register_body("ADA@EXAMPLE.COM"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body.get("message").and_then(Value::as_str),
            Some("Email already exists")
        );
        assert_eq!(
            body.pointer("/details/code").and_then(Value::as_str),
            Some("duplicate_email")
        );
    }

    #[actix_web::test]
    async fn deactivated_accounts_cannot_login() {
        let state = HttpState::in_memory("http://x");
        let users = state.users.clone();
        let app = actix_test::init_service(test_app(state)).await;
        let (_, body) = register_via_api(&app, "ada@example.com").await;
        let id = UserId::new(
            body.pointer("/user/id")
                .and_then(Value::as_str)
                .expect("id present"),
        )
        .expect("valid id");
        users.deactivate(id).await.expect("deactivation succeeds");

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/login")
                .set_json(json!({ "email": "ada@example.com", "password": "a strong password" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn profile_round_trips_through_me() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let (token, _) = register_via_api(&app, "ada@example.com").await;

        let update = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri("/auth/profile")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .set_json(json!({ "headline": "Engineer", "displayName": "Ada L" }))
                .to_request(),
        )
        .await;
        assert_eq!(update.status(), StatusCode::OK);

        let me = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/auth/me")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(me.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(me).await;
        assert_eq!(
            body.get("displayName").and_then(Value::as_str),
            Some("Ada L")
        );
        assert_eq!(
            body.get("headline").and_then(Value::as_str),
            Some("Engineer")
        );
    }

    #[actix_web::test]
    async fn avatar_upload_rewrites_to_an_absolute_url() {
        let app =
            actix_test::init_service(test_app(HttpState::in_memory("http://localhost:8080/")))
                .await;
        let (token, _) = register_via_api(&app, "ada@example.com").await;

        let boundary = "AVATARBOUNDARY";
        let mut payload = Vec::new();
        payload.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        payload.extend_from_slice(&[0x89, 0x50, 0x4e, 0x47]);
        payload.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/auth/avatar")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .insert_header((
                    actix_web::http::header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                ))
                .set_payload(payload)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        let url = body
            .get("avatarUrl")
            .and_then(Value::as_str)
            .expect("avatar url present");
        assert!(url.starts_with("http://localhost:8080/uploads/avatars/"));
        assert!(url.ends_with(".png"));
    }

    #[actix_web::test]
    async fn logout_revokes_the_token() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let (token, _) = register_via_api(&app, "ada@example.com").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/auth/logout")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let me = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/auth/me")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn connecting_twice_is_rejected() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let (token, _) = register_via_api(&app, "ada@example.com").await;
        let (_, peer_body) = register_via_api(&app, "grace@example.com").await;
        let peer_id = peer_body
            .pointer("/user/id")
            .and_then(Value::as_str)
            .expect("peer id")
            .to_owned();

        let uri = format!("/api/users/{peer_id}/connect");
        let first = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&uri)
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(first.status(), StatusCode::NO_CONTENT);

        let second = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&uri)
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    }
}
