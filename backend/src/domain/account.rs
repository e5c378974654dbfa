//! Account service: registration, login, token verification.
//!
//! Login also performs guest-enrollment auto-linking: enrollment requests
//! captured from guests before they had an account are matched by normalised
//! email and converted into real enrollments.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::warn;

use super::auth::{LoginCredentials, RegistrationRequest, hash_password, verify_password};
use super::enrollment::Enrollment;
use super::ports::{EnrollmentRepository, RepositoryError, TokenRepository, UserRepository};
use super::token::{AccessToken, DEFAULT_TOKEN_TTL_HOURS, TokenRecord};
use super::user::User;
use super::Error;

/// A successfully authenticated account plus its freshly issued token.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// The account.
    pub user: User,
    /// Bearer token to hand to the client. The server keeps only its
    /// fingerprint.
    pub token: AccessToken,
}

/// Registration, login and token verification against the user ports.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    token_ttl_hours: i64,
}

impl AccountService {
    /// Create a service with the default token lifetime.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            users,
            tokens,
            enrollments,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
        }
    }

    /// Override the token lifetime in hours.
    #[must_use]
    pub const fn with_token_ttl_hours(mut self, hours: i64) -> Self {
        self.token_ttl_hours = hours;
        self
    }

    /// Register a new account and issue its first token.
    pub async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<AuthenticatedSession, Error> {
        let password_hash = hash_password(request.password())
            .map_err(|err| Error::internal(err.to_string()))?;
        let user = User {
            id: super::user::UserId::random(),
            email: request.email().clone(),
            password_hash,
            display_name: request.display_name().clone(),
            account_type: request.account_type(),
            headline: None,
            bio: None,
            avatar_path: None,
            is_active: true,
            is_verified: false,
            created_at: Utc::now(),
        };

        self.users.insert(&user).await.map_err(|err| match err {
            RepositoryError::Duplicate { .. } => Error::invalid_request("Email already exists")
                .with_details(json!({ "field": "email", "code": "duplicate_email" })),
            other => other.into(),
        })?;

        self.issue_session(user).await
    }

    /// Authenticate credentials and issue a token.
    ///
    /// A deactivated account is rejected even with the correct password.
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthenticatedSession, Error> {
        let Some(user) = self.users.find_by_email(credentials.email()).await? else {
            return Err(Error::unauthorized("invalid credentials"));
        };
        if !verify_password(&user.password_hash, credentials.password()) {
            return Err(Error::unauthorized("invalid credentials"));
        }
        if !user.is_active {
            return Err(Error::unauthorized("account deactivated"));
        }

        self.link_guest_enrollments(&user).await;
        self.issue_session(user).await
    }

    /// Resolve a presented bearer token to its active account.
    pub async fn authenticate(&self, token: &AccessToken) -> Result<User, Error> {
        let record = self
            .tokens
            .find(&token.fingerprint())
            .await?
            .ok_or_else(|| Error::unauthorized("invalid or expired token"))?;
        if record.is_expired(Utc::now()) {
            return Err(Error::unauthorized("invalid or expired token"));
        }
        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| Error::unauthorized("invalid or expired token"))?;
        if !user.is_active {
            return Err(Error::forbidden("account deactivated"));
        }
        Ok(user)
    }

    /// Revoke a token. Unknown tokens revoke silently.
    pub async fn logout(&self, token: &AccessToken) -> Result<(), Error> {
        self.tokens.delete(&token.fingerprint()).await?;
        Ok(())
    }

    async fn issue_session(&self, user: User) -> Result<AuthenticatedSession, Error> {
        let token = AccessToken::generate();
        let record = TokenRecord::issue(&token, user.id, Utc::now(), self.token_ttl_hours);
        self.tokens.insert(&record).await?;
        Ok(AuthenticatedSession { user, token })
    }

    /// Convert any guest enrollment requests matching the account email.
    ///
    /// Linking is best-effort: a failure here must not block a login, and an
    /// already-existing enrollment just consumes the guest request.
    async fn link_guest_enrollments(&self, user: &User) {
        let guests = match self.enrollments.guest_requests_for_email(&user.email).await {
            Ok(guests) => guests,
            Err(error) => {
                warn!(user_id = %user.id, %error, "guest enrollment lookup failed at login");
                return;
            }
        };

        for guest in guests {
            let enrollment = Enrollment::start(user.id, guest.course_id, Utc::now());
            match self.enrollments.insert(&enrollment).await {
                Ok(()) | Err(RepositoryError::Duplicate { .. }) => {}
                Err(error) => {
                    warn!(user_id = %user.id, %error, "guest enrollment conversion failed");
                    continue;
                }
            }
            if let Err(error) = self.enrollments.consume_guest(guest.id).await {
                warn!(user_id = %user.id, %error, "guest enrollment cleanup failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Account lifecycle coverage against the in-memory fixtures.
    use chrono::Utc;
    use uuid::Uuid;

    use crate::domain::ErrorCode;
    use crate::domain::enrollment::GuestEnrollment;
    use crate::domain::ports::fixtures::{
        InMemoryEnrollmentRepository, InMemoryTokenRepository, InMemoryUserRepository,
    };
    use crate::domain::ports::{EnrollmentRepository as _, UserRepository as _};
    use crate::domain::user::EmailAddress;

    use super::*;

    struct Harness {
        users: Arc<InMemoryUserRepository>,
        enrollments: Arc<InMemoryEnrollmentRepository>,
        service: AccountService,
    }

    fn harness() -> Harness {
        let users = Arc::new(InMemoryUserRepository::default());
        let tokens = Arc::new(InMemoryTokenRepository::default());
        let enrollments = Arc::new(InMemoryEnrollmentRepository::default());
        let service = AccountService::new(users.clone(), tokens, enrollments.clone());
        Harness {
            users,
            enrollments,
            service,
        }
    }

    fn registration(email: &str) -> RegistrationRequest {
        RegistrationRequest::try_from_parts(email, "a strong password", "Ada", "student")
            .expect("valid registration")
    }

    #[tokio::test]
    async fn register_then_login_round_trips() {
        let harness = harness();
        harness
            .service
            .register(&registration("ada@example.com"))
            .await
            .expect("registration succeeds");

        let credentials =
            LoginCredentials::try_from_parts("ada@example.com", "a strong password")
                .expect("valid credentials");
        let session = harness
            .service
            .login(&credentials)
            .await
            .expect("login succeeds");
        assert_eq!(session.user.email.as_str(), "ada@example.com");

        let user = harness
            .service
            .authenticate(&session.token)
            .await
            .expect("token resolves");
        assert_eq!(user.id, session.user.id);
    }

    #[tokio::test]
    async fn duplicate_email_registration_is_case_insensitive() {
        let harness = harness();
        harness
            .service
            .register(&registration("ada@example.com"))
            .await
            .expect("first registration succeeds");

        let err = harness
            .service
            .register(&registration("ADA@Example.COM"))
            .await
            .expect_err("duplicate must fail");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "Email already exists");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let harness = harness();
        harness
            .service
            .register(&registration("ada@example.com"))
            .await
            .expect("registration succeeds");

        let credentials = LoginCredentials::try_from_parts("ada@example.com", "wrong password")
            .expect("valid credentials");
        let err = harness
            .service
            .login(&credentials)
            .await
            .expect_err("wrong password must fail");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn deactivated_accounts_cannot_login_or_use_tokens() {
        let harness = harness();
        let session = harness
            .service
            .register(&registration("ada@example.com"))
            .await
            .expect("registration succeeds");

        harness
            .users
            .deactivate(session.user.id)
            .await
            .expect("deactivation succeeds");

        let credentials =
            LoginCredentials::try_from_parts("ada@example.com", "a strong password")
                .expect("valid credentials");
        let err = harness
            .service
            .login(&credentials)
            .await
            .expect_err("deactivated login must fail");
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        let err = harness
            .service
            .authenticate(&session.token)
            .await
            .expect_err("deactivated token must fail");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let harness = harness();
        let service = harness.service.clone().with_token_ttl_hours(0);
        let session = service
            .register(&registration("ada@example.com"))
            .await
            .expect("registration succeeds");

        let err = service
            .authenticate(&session.token)
            .await
            .expect_err("expired token must fail");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let harness = harness();
        let session = harness
            .service
            .register(&registration("ada@example.com"))
            .await
            .expect("registration succeeds");

        harness
            .service
            .logout(&session.token)
            .await
            .expect("logout succeeds");
        let err = harness
            .service
            .authenticate(&session.token)
            .await
            .expect_err("revoked token must fail");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn login_links_guest_enrollments_by_email() {
        let harness = harness();
        let course_id = Uuid::new_v4();
        harness
            .enrollments
            .insert_guest(&GuestEnrollment {
                id: Uuid::new_v4(),
                // Guests typed a differently-cased address; EmailAddress
                // normalises, so the match still lands.
                email: EmailAddress::new("ADA@Example.com").expect("valid email"),
                course_id,
                requested_at: Utc::now(),
            })
            .await
            .expect("guest stored");

        let session = harness
            .service
            .register(&registration("ada@example.com"))
            .await
            .expect("registration succeeds");
        let credentials =
            LoginCredentials::try_from_parts("ada@example.com", "a strong password")
                .expect("valid credentials");
        harness
            .service
            .login(&credentials)
            .await
            .expect("login succeeds");

        let enrollments = harness
            .enrollments
            .for_user(session.user.id)
            .await
            .expect("query runs");
        assert_eq!(enrollments.len(), 1);
        assert_eq!(
            enrollments.first().expect("enrollment").course_id,
            course_id
        );

        let remaining = harness
            .enrollments
            .guest_requests_for_email(&session.user.email)
            .await
            .expect("query runs");
        assert!(remaining.is_empty());
    }
}
