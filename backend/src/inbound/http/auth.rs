//! Bearer-token extractors for HTTP handlers.
//!
//! The token-verify-and-lookup step lives here: an extractor reads the
//! `Authorization: Bearer` header, fingerprints the token, resolves it to an
//! active account through the [`AccountService`], and hands handlers a typed
//! [`AuthedUser`] so they never touch raw headers.

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::user::User;
use crate::domain::{AccessToken, AccountService, Error, UserId};
use crate::inbound::http::state::HttpState;

/// The authenticated account behind the request's bearer token.
#[derive(Clone)]
pub struct AuthedUser(User);

impl AuthedUser {
    /// Borrow the authenticated account.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.0
    }

    /// The authenticated account's id.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.0.id
    }

    /// Consume the extractor, yielding the account.
    #[must_use]
    pub fn into_user(self) -> User {
        self.0
    }

    /// Require the admin role, or fail with `403 Forbidden`.
    pub fn require_admin(&self) -> Result<(), Error> {
        if self.0.account_type.is_admin() {
            Ok(())
        } else {
            Err(Error::forbidden("admin access required"))
        }
    }

    /// Require that the request targets the caller's own resources, or that
    /// the caller is an admin.
    pub fn require_self_or_admin(&self, target: UserId) -> Result<(), Error> {
        if self.0.id == target || self.0.account_type.is_admin() {
            Ok(())
        } else {
            Err(Error::forbidden("cannot access another user's resources"))
        }
    }
}

/// An optionally authenticated request. Used where guests are allowed but an
/// account, when present, should be linked (e.g. service requests).
#[derive(Clone)]
pub struct MaybeAuthed(pub Option<User>);

/// The raw parsed bearer token, for endpoints that operate on the token
/// itself (logout).
#[derive(Clone)]
pub struct BearerToken(pub AccessToken);

fn bearer_token(req: &HttpRequest) -> Result<Option<AccessToken>, Error> {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let raw = header
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let token = raw
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::unauthorized("malformed authorization header"))?;
    AccessToken::parse(token.trim())
        .map(Some)
        .map_err(|_| Error::unauthorized("invalid or expired token"))
}

fn accounts_from(req: &HttpRequest) -> Result<AccountService, Error> {
    req.app_data::<web::Data<HttpState>>()
        .map(|state| state.accounts.clone())
        .ok_or_else(|| Error::internal("http state not configured"))
}

impl FromRequest for AuthedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let accounts = accounts_from(req);
        Box::pin(async move {
            let token = token?.ok_or_else(|| Error::unauthorized("missing bearer token"))?;
            let user = accounts?.authenticate(&token).await?;
            Ok(Self(user))
        })
    }
}

impl FromRequest for BearerToken {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        Box::pin(async move {
            let token = token?.ok_or_else(|| Error::unauthorized("missing bearer token"))?;
            Ok(Self(token))
        })
    }
}

impl FromRequest for MaybeAuthed {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let accounts = accounts_from(req);
        Box::pin(async move {
            match token? {
                // A presented-but-invalid token is an error; only absence
                // falls through to the guest path.
                Some(token) => {
                    let user = accounts?.authenticate(&token).await?;
                    Ok(Self(Some(user)))
                }
                None => Ok(Self(None)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    //! Extractor behaviour over a minimal echo route.
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test, web};

    use crate::domain::RegistrationRequest;
    use crate::inbound::http::ApiResult;

    use super::*;

    async fn whoami(user: AuthedUser) -> ApiResult<HttpResponse> {
        Ok(HttpResponse::Ok().body(user.id().to_string()))
    }

    async fn guest_ok(maybe: MaybeAuthed) -> ApiResult<HttpResponse> {
        Ok(HttpResponse::Ok().body(match maybe.0 {
            Some(user) => user.id.to_string(),
            None => "guest".to_owned(),
        }))
    }

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
            .route("/whoami", web::get().to(whoami))
            .route("/guest-ok", web::get().to(guest_ok))
    }

    async fn register(state: &HttpState) -> (UserId, AccessToken) {
        let request = RegistrationRequest::try_from_parts(
            "ada@example.com",
            "a strong password",
            "Ada",
            "student",
        )
        .expect("valid registration");
        let session = state
            .accounts
            .register(&request)
            .await
            .expect("registration succeeds");
        (session.user.id, session.token)
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/whoami").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_token_resolves_the_account() {
        let state = HttpState::in_memory("http://x");
        let (user_id, token) = register(&state).await;
        let app = actix_test::init_service(test_app(state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/whoami")
                .insert_header((AUTHORIZATION, format!("Bearer {}", token.expose())))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn garbage_tokens_are_unauthorized() {
        let state = HttpState::in_memory("http://x");
        let _ = register(&state).await;
        let app = actix_test::init_service(test_app(state)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/whoami")
                .insert_header((AUTHORIZATION, "Bearer not-hex"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn optional_auth_allows_guests_but_rejects_bad_tokens() {
        let state = HttpState::in_memory("http://x");
        let app = actix_test::init_service(test_app(state)).await;

        let guest = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/guest-ok").to_request(),
        )
        .await;
        assert_eq!(guest.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(guest).await, "guest".as_bytes());

        let bad = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/guest-ok")
                .insert_header((AUTHORIZATION, "Bearer zz"))
                .to_request(),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
    }
}
