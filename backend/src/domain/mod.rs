//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers. Keep types immutable where practical and document
//! invariants and serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface highlights:
//! - [`Error`] / [`ErrorCode`] — transport-agnostic error payload.
//! - [`User`] and friends — account aggregate.
//! - [`SocialActivity`] — the post/like/comment/bookmark sum type.
//! - [`FeedService`] — the feed assembly pipeline.
//! - [`AccountService`] — registration, login and token verification.
//! - [`ports`] — repository traits and their in-memory fixtures.

pub mod account;
pub mod auth;
pub mod calendar;
pub mod contact;
pub mod course;
pub mod enrollment;
pub mod error;
pub mod feed;
pub mod internship;
pub mod ports;
pub mod services;
pub mod social;
pub mod token;
pub mod user;

pub use self::account::{AccountService, AuthenticatedSession};
pub use self::auth::{AuthValidationError, LoginCredentials, RegistrationRequest};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::feed::{FeedPage, FeedPost, FeedService};
pub use self::social::{SocialActivity, Visibility};
pub use self::token::AccessToken;
pub use self::user::{AccountType, DisplayName, EmailAddress, User, UserId, UserSummary};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
