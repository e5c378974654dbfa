//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (the database and the uploads store). Every repository here has the same
//! basic query semantics, so they share one [`RepositoryError`] instead of
//! per-port error enums; adapters map their failures into its variants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageParams;
use thiserror::Error;
use uuid::Uuid;

use super::calendar::CalendarEvent;
use super::contact::ContactMessage;
use super::course::{Assignment, Certificate, Course};
use super::enrollment::{Enrollment, EnrollmentStatus, GuestEnrollment, Progress};
use super::internship::{Internship, InternshipSubmission, SubmissionStatus};
use super::services::{ServiceCategory, ServiceRequest, ServiceSubcategory};
use super::services::ServiceRequestStatus;
use super::social::{ActivityType, Post, SocialActivity};
use super::token::{TokenFingerprint, TokenRecord};
use super::user::{
    AccountType, DisplayName, EmailAddress, ProfileUpdate, User, UserId, UserSummary,
};
use super::{Error, ErrorCode};

pub mod fixtures;

/// Errors surfaced by persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Database connectivity or pool failures.
    #[error("repository connection failed: {message}")]
    Connection {
        /// Adapter-level description.
        message: String,
    },
    /// Query execution or row decoding failures.
    #[error("repository query failed: {message}")]
    Query {
        /// Adapter-level description.
        message: String,
    },
    /// A uniqueness constraint rejected the write.
    #[error("duplicate {entity}")]
    Duplicate {
        /// Human-readable name of the entity or constraint.
        entity: &'static str,
    },
}

impl RepositoryError {
    /// Helper for connection related adapter errors.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Helper for uniqueness violations.
    #[must_use]
    pub const fn duplicate(entity: &'static str) -> Self {
        Self::Duplicate { entity }
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Connection { .. } => {
                Self::new(ErrorCode::ServiceUnavailable, "database unavailable")
            }
            RepositoryError::Query { message } => {
                Self::internal(format!("database query failed: {message}"))
            }
            RepositoryError::Duplicate { entity } => {
                Self::invalid_request(format!("duplicate {entity}"))
            }
        }
    }
}

/// A page of results plus the total row count before paging.
pub type PagedResult<T> = Result<(Vec<T>, u64), RepositoryError>;

/// Admin list filter for user accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListFilter {
    /// Substring match against display name or email.
    pub search: Option<String>,
    /// Restrict to one role.
    pub account_type: Option<AccountType>,
}

/// Admin-initiated account update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminUserUpdate {
    /// Replacement display name.
    pub display_name: Option<DisplayName>,
    /// Replacement role.
    pub account_type: Option<AccountType>,
    /// Replacement active flag.
    pub is_active: Option<bool>,
    /// Replacement verified flag.
    pub is_verified: Option<bool>,
}

/// User accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; duplicate normalised email yields
    /// [`RepositoryError::Duplicate`].
    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;

    /// Load an account by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Load an account by normalised email.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError>;

    /// Apply a profile update, returning the updated account.
    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError>;

    /// Store the avatar path, returning the updated account.
    async fn set_avatar_path(
        &self,
        id: UserId,
        path: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// Public summaries for the given ids, in no particular order.
    async fn summaries(&self, ids: &[UserId]) -> Result<Vec<UserSummary>, RepositoryError>;

    /// Admin listing with pagination and filtering.
    async fn list(&self, filter: &UserListFilter, params: PageParams) -> PagedResult<User>;

    /// Admin account update, returning the updated account.
    async fn admin_update(
        &self,
        id: UserId,
        update: &AdminUserUpdate,
    ) -> Result<Option<User>, RepositoryError>;

    /// Soft-delete an account. Returns false when the id is unknown.
    async fn deactivate(&self, id: UserId) -> Result<bool, RepositoryError>;
}

/// Issued bearer tokens.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Store a freshly issued token record.
    async fn insert(&self, record: &TokenRecord) -> Result<(), RepositoryError>;

    /// Look up a token by fingerprint.
    async fn find(
        &self,
        fingerprint: &TokenFingerprint,
    ) -> Result<Option<TokenRecord>, RepositoryError>;

    /// Revoke a token. Returns false when the fingerprint is unknown.
    async fn delete(&self, fingerprint: &TokenFingerprint) -> Result<bool, RepositoryError>;
}

/// The connection lists feed visibility consumes.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Ids connected to `user`.
    async fn connections_of(&self, user: UserId) -> Result<Vec<UserId>, RepositoryError>;

    /// Record a mutual connection between two users.
    async fn connect(&self, user: UserId, peer: UserId) -> Result<(), RepositoryError>;

    /// Remove a connection. Returns false when none existed.
    async fn disconnect(&self, user: UserId, peer: UserId) -> Result<bool, RepositoryError>;
}

/// The unioned social activity collection.
#[async_trait]
pub trait SocialActivityRepository: Send + Sync {
    /// Insert any activity. Likes and bookmarks are unique per
    /// `(author, target)`; violations yield [`RepositoryError::Duplicate`].
    async fn insert(&self, activity: &SocialActivity) -> Result<(), RepositoryError>;

    /// Load one post by id.
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, RepositoryError>;

    /// All posts ordered by creation time descending.
    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError>;

    /// Every activity whose `target_id` is the given post, one query.
    async fn activities_for_target(
        &self,
        target: Uuid,
    ) -> Result<Vec<SocialActivity>, RepositoryError>;

    /// Remove a like or bookmark. Returns false when none existed.
    async fn delete_reaction(
        &self,
        target: Uuid,
        author: UserId,
        kind: ActivityType,
    ) -> Result<bool, RepositoryError>;

    /// Atomically bump a post's share counter. Returns false for unknown posts.
    async fn increment_share_count(&self, post: Uuid) -> Result<bool, RepositoryError>;

    /// Attach an image path to a post. Returns false for unknown posts.
    async fn set_post_image(&self, post: Uuid, path: &str) -> Result<bool, RepositoryError>;

    /// Delete a post and every activity targeting it. Returns false for
    /// unknown posts.
    async fn delete_post_cascade(&self, post: Uuid) -> Result<bool, RepositoryError>;
}

/// Course catalogue filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseListFilter {
    /// Substring match against title or category.
    pub search: Option<String>,
}

/// Courses.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Insert a new course.
    async fn insert(&self, course: &Course) -> Result<(), RepositoryError>;

    /// Load one course by id.
    async fn find(&self, id: Uuid) -> Result<Option<Course>, RepositoryError>;

    /// Active courses for the public listing.
    async fn list_active(&self) -> Result<Vec<Course>, RepositoryError>;

    /// Admin listing with pagination and filtering.
    async fn list(&self, filter: &CourseListFilter, params: PageParams) -> PagedResult<Course>;

    /// Replace a stored course. Returns false when the id is unknown.
    async fn update(&self, course: &Course) -> Result<bool, RepositoryError>;

    /// Delete a course. Returns false when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Admin list filter for enrollments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentListFilter {
    /// Restrict to one user.
    pub user_id: Option<UserId>,
    /// Restrict to one status.
    pub status: Option<EnrollmentStatus>,
}

/// Enrollments and guest enrollment requests.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Insert a new enrollment; duplicates per `(user, course)` yield
    /// [`RepositoryError::Duplicate`].
    async fn insert(&self, enrollment: &Enrollment) -> Result<(), RepositoryError>;

    /// Load one enrollment by id.
    async fn find(&self, id: Uuid) -> Result<Option<Enrollment>, RepositoryError>;

    /// Enrollments belonging to a user, newest first.
    async fn for_user(&self, user: UserId) -> Result<Vec<Enrollment>, RepositoryError>;

    /// Persist progress and status for one enrollment.
    async fn record_progress(
        &self,
        id: Uuid,
        progress: Progress,
        status: EnrollmentStatus,
    ) -> Result<bool, RepositoryError>;

    /// Admin listing with pagination and filtering.
    async fn list(
        &self,
        filter: &EnrollmentListFilter,
        params: PageParams,
    ) -> PagedResult<Enrollment>;

    /// Replace a stored enrollment. Returns false when the id is unknown.
    async fn update(&self, enrollment: &Enrollment) -> Result<bool, RepositoryError>;

    /// Delete an enrollment. Returns false when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Capture a guest enrollment request.
    async fn insert_guest(&self, guest: &GuestEnrollment) -> Result<(), RepositoryError>;

    /// Guest requests captured for an email, for auto-linking at login.
    async fn guest_requests_for_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Vec<GuestEnrollment>, RepositoryError>;

    /// Remove a guest request once linked. Returns false when unknown.
    async fn consume_guest(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Completion certificates.
#[async_trait]
pub trait CertificateRepository: Send + Sync {
    /// Insert a certificate.
    async fn insert(&self, certificate: &Certificate) -> Result<(), RepositoryError>;

    /// Certificates issued to a user.
    async fn for_user(&self, user: UserId) -> Result<Vec<Certificate>, RepositoryError>;

    /// Admin listing with pagination.
    async fn list(&self, params: PageParams) -> PagedResult<Certificate>;

    /// Delete a certificate. Returns false when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Course assignments.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Insert an assignment.
    async fn insert(&self, assignment: &Assignment) -> Result<(), RepositoryError>;

    /// Load one assignment by id.
    async fn find(&self, id: Uuid) -> Result<Option<Assignment>, RepositoryError>;

    /// Admin listing with pagination, optionally scoped to a course.
    async fn list(&self, course_id: Option<Uuid>, params: PageParams) -> PagedResult<Assignment>;

    /// Replace a stored assignment. Returns false when the id is unknown.
    async fn update(&self, assignment: &Assignment) -> Result<bool, RepositoryError>;

    /// Delete an assignment. Returns false when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Outcome of an internship application attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A spot was reserved and the submission stored.
    Accepted,
    /// The posting had no remaining spots; nothing was written.
    NoSpotsAvailable,
}

/// Admin list filter for internships.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternshipListFilter {
    /// Substring match against title or company.
    pub search: Option<String>,
    /// Include postings hidden from the public listing.
    pub include_inactive: bool,
}

/// Internship postings and applications.
#[async_trait]
pub trait InternshipRepository: Send + Sync {
    /// Insert a posting.
    async fn insert(&self, internship: &Internship) -> Result<(), RepositoryError>;

    /// Load one posting by id.
    async fn find(&self, id: Uuid) -> Result<Option<Internship>, RepositoryError>;

    /// Active postings for the public listing.
    async fn list_active(&self) -> Result<Vec<Internship>, RepositoryError>;

    /// Admin listing with pagination and filtering.
    async fn list(
        &self,
        filter: &InternshipListFilter,
        params: PageParams,
    ) -> PagedResult<Internship>;

    /// Replace a stored posting. Returns false when the id is unknown.
    async fn update(&self, internship: &Internship) -> Result<bool, RepositoryError>;

    /// Delete a posting. Returns false when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Reserve a spot and store the submission in one atomic step.
    ///
    /// The capacity check and decrement must not be a read-modify-write; a
    /// duplicate `(internship, user)` application yields
    /// [`RepositoryError::Duplicate`] without consuming a spot.
    async fn apply(
        &self,
        submission: &InternshipSubmission,
    ) -> Result<ApplyOutcome, RepositoryError>;

    /// Applications submitted by a user, newest first.
    async fn submissions_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<InternshipSubmission>, RepositoryError>;

    /// Update one submission's review status. Returns false when unknown.
    async fn set_submission_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
    ) -> Result<bool, RepositoryError>;
}

/// The services taxonomy (categories and subcategories).
#[async_trait]
pub trait ServiceCatalogRepository: Send + Sync {
    /// All categories.
    async fn categories(&self) -> Result<Vec<ServiceCategory>, RepositoryError>;

    /// Subcategories, optionally scoped to one category.
    async fn subcategories(
        &self,
        category: Option<Uuid>,
    ) -> Result<Vec<ServiceSubcategory>, RepositoryError>;

    /// Load one subcategory by id.
    async fn find_subcategory(
        &self,
        id: Uuid,
    ) -> Result<Option<ServiceSubcategory>, RepositoryError>;

    /// Insert a category.
    async fn insert_category(&self, category: &ServiceCategory) -> Result<(), RepositoryError>;

    /// Replace a stored category. Returns false when the id is unknown.
    async fn update_category(&self, category: &ServiceCategory) -> Result<bool, RepositoryError>;

    /// Delete a category and its subcategories. Returns false when unknown.
    async fn delete_category(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Insert a subcategory.
    async fn insert_subcategory(
        &self,
        subcategory: &ServiceSubcategory,
    ) -> Result<(), RepositoryError>;

    /// Replace a stored subcategory. Returns false when the id is unknown.
    async fn update_subcategory(
        &self,
        subcategory: &ServiceSubcategory,
    ) -> Result<bool, RepositoryError>;

    /// Delete a subcategory. Returns false when the id is unknown.
    async fn delete_subcategory(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Admin list filter for service requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestListFilter {
    /// Restrict to one workflow status.
    pub status: Option<ServiceRequestStatus>,
    /// Substring match against contact name or email.
    pub search: Option<String>,
}

/// Service requests.
#[async_trait]
pub trait ServiceRequestRepository: Send + Sync {
    /// Insert a request.
    async fn insert(&self, request: &ServiceRequest) -> Result<(), RepositoryError>;

    /// Load one request by id.
    async fn find(&self, id: Uuid) -> Result<Option<ServiceRequest>, RepositoryError>;

    /// Requests submitted by a user, newest first.
    async fn for_user(&self, user: UserId) -> Result<Vec<ServiceRequest>, RepositoryError>;

    /// Admin listing with pagination and filtering.
    async fn list(
        &self,
        filter: &RequestListFilter,
        params: PageParams,
    ) -> PagedResult<ServiceRequest>;

    /// Replace a stored request. Returns false when the id is unknown.
    async fn update(&self, request: &ServiceRequest) -> Result<bool, RepositoryError>;

    /// Delete a request. Returns false when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Contact form messages.
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Insert a message.
    async fn insert(&self, message: &ContactMessage) -> Result<(), RepositoryError>;

    /// Admin listing with pagination and substring search.
    async fn list(&self, search: Option<&str>, params: PageParams) -> PagedResult<ContactMessage>;

    /// Delete a message. Returns false when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Calendar events.
#[async_trait]
pub trait CalendarEventRepository: Send + Sync {
    /// Insert an event.
    async fn insert(&self, event: &CalendarEvent) -> Result<(), RepositoryError>;

    /// Events ending (or starting, when open-ended) at or after `now`.
    async fn upcoming(&self, now: DateTime<Utc>) -> Result<Vec<CalendarEvent>, RepositoryError>;

    /// Admin listing with pagination.
    async fn list(&self, params: PageParams) -> PagedResult<CalendarEvent>;

    /// Replace a stored event. Returns false when the id is unknown.
    async fn update(&self, event: &CalendarEvent) -> Result<bool, RepositoryError>;

    /// Delete an event. Returns false when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Namespaces for stored images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageNamespace {
    /// Profile avatars.
    Avatars,
    /// Post attachments.
    Posts,
}

impl ImageNamespace {
    /// Directory name under the uploads root.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avatars => "avatars",
            Self::Posts => "posts",
        }
    }
}

/// Errors surfaced by the uploads store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageStoreError {
    /// The file extension is not an accepted image type.
    #[error("unsupported image type")]
    UnsupportedType,
    /// The upload exceeded the size cap.
    #[error("image exceeds {max_bytes} bytes")]
    TooLarge {
        /// Maximum accepted size.
        max_bytes: usize,
    },
    /// Filesystem failure.
    #[error("image store failure: {message}")]
    Io {
        /// Adapter-level description.
        message: String,
    },
}

impl From<ImageStoreError> for Error {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::UnsupportedType | ImageStoreError::TooLarge { .. } => {
                Self::invalid_request(err.to_string())
            }
            ImageStoreError::Io { message } => {
                Self::internal(format!("image store failure: {message}"))
            }
        }
    }
}

/// Accepted image file extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Maximum accepted image upload size in bytes.
pub const IMAGE_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Check an upload against the accepted image policy.
///
/// Returns the canonical lower-case extension on success. Both the local
/// filesystem adapter and the in-memory fixture apply this, so handler
/// behaviour is identical in tests and production.
pub fn validate_image_upload(
    filename_hint: &str,
    len: usize,
) -> Result<&'static str, ImageStoreError> {
    if len > IMAGE_MAX_BYTES {
        return Err(ImageStoreError::TooLarge {
            max_bytes: IMAGE_MAX_BYTES,
        });
    }
    let ext = filename_hint.rsplit('.').next().unwrap_or_default();
    IMAGE_EXTENSIONS
        .iter()
        .find(|accepted| accepted.eq_ignore_ascii_case(ext))
        .copied()
        .ok_or(ImageStoreError::UnsupportedType)
}

/// Uploaded images (avatars, post attachments).
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist image bytes, returning the stored relative path.
    async fn save(
        &self,
        namespace: ImageNamespace,
        filename_hint: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ImageStoreError>;

    /// Remove a stored image by relative path.
    async fn delete(&self, path: &str) -> Result<(), ImageStoreError>;
}

#[cfg(test)]
mod tests {
    //! Mapping coverage for shared repository errors.
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(RepositoryError::query("bad row"), ErrorCode::InternalError)]
    #[case(RepositoryError::duplicate("like"), ErrorCode::InvalidRequest)]
    fn repository_errors_map_to_domain_codes(
        #[case] err: RepositoryError,
        #[case] expected: ErrorCode,
    ) {
        let mapped = Error::from(err);
        assert_eq!(mapped.code(), expected);
    }

    #[rstest]
    fn image_store_errors_map_to_domain_codes() {
        assert_eq!(
            Error::from(ImageStoreError::UnsupportedType).code(),
            ErrorCode::InvalidRequest
        );
        assert_eq!(
            Error::from(ImageStoreError::Io {
                message: "disk full".into()
            })
            .code(),
            ErrorCode::InternalError
        );
    }
}
