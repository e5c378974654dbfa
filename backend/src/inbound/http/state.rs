//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::fixtures::{
    InMemoryAssignmentRepository, InMemoryCalendarEventRepository, InMemoryCertificateRepository,
    InMemoryConnectionRepository, InMemoryContactRepository, InMemoryCourseRepository,
    InMemoryEnrollmentRepository, InMemoryImageStore, InMemoryInternshipRepository,
    InMemoryServiceCatalogRepository, InMemoryServiceRequestRepository,
    InMemorySocialActivityRepository, InMemoryTokenRepository, InMemoryUserRepository,
};
use crate::domain::ports::{
    AssignmentRepository, CalendarEventRepository, CertificateRepository, ConnectionRepository,
    ContactRepository, CourseRepository, EnrollmentRepository, ImageStore, InternshipRepository,
    ServiceCatalogRepository, ServiceRequestRepository, SocialActivityRepository, TokenRepository,
    UserRepository,
};
use crate::domain::{AccountService, FeedService};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// User accounts.
    pub users: Arc<dyn UserRepository>,
    /// Issued bearer tokens.
    pub tokens: Arc<dyn TokenRepository>,
    /// Connection lists.
    pub connections: Arc<dyn ConnectionRepository>,
    /// The unioned social activity collection.
    pub activities: Arc<dyn SocialActivityRepository>,
    /// Courses.
    pub courses: Arc<dyn CourseRepository>,
    /// Enrollments and guest requests.
    pub enrollments: Arc<dyn EnrollmentRepository>,
    /// Certificates.
    pub certificates: Arc<dyn CertificateRepository>,
    /// Assignments.
    pub assignments: Arc<dyn AssignmentRepository>,
    /// Internship postings and applications.
    pub internships: Arc<dyn InternshipRepository>,
    /// Services taxonomy.
    pub service_catalog: Arc<dyn ServiceCatalogRepository>,
    /// Service requests.
    pub service_requests: Arc<dyn ServiceRequestRepository>,
    /// Contact messages.
    pub contacts: Arc<dyn ContactRepository>,
    /// Calendar events.
    pub calendar_events: Arc<dyn CalendarEventRepository>,
    /// Uploaded images.
    pub images: Arc<dyn ImageStore>,
}

impl HttpStatePorts {
    /// A complete in-memory ports bundle, used by tests and the no-database
    /// development mode.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::default()),
            tokens: Arc::new(InMemoryTokenRepository::default()),
            connections: Arc::new(InMemoryConnectionRepository::default()),
            activities: Arc::new(InMemorySocialActivityRepository::default()),
            courses: Arc::new(InMemoryCourseRepository::default()),
            enrollments: Arc::new(InMemoryEnrollmentRepository::default()),
            certificates: Arc::new(InMemoryCertificateRepository::default()),
            assignments: Arc::new(InMemoryAssignmentRepository::default()),
            internships: Arc::new(InMemoryInternshipRepository::default()),
            service_catalog: Arc::new(InMemoryServiceCatalogRepository::default()),
            service_requests: Arc::new(InMemoryServiceRequestRepository::default()),
            contacts: Arc::new(InMemoryContactRepository::default()),
            calendar_events: Arc::new(InMemoryCalendarEventRepository::default()),
            images: Arc::new(InMemoryImageStore::default()),
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration, login and token verification.
    pub accounts: AccountService,
    /// Feed assembly.
    pub feed: FeedService,
    /// User accounts.
    pub users: Arc<dyn UserRepository>,
    /// Connection lists.
    pub connections: Arc<dyn ConnectionRepository>,
    /// The unioned social activity collection.
    pub activities: Arc<dyn SocialActivityRepository>,
    /// Courses.
    pub courses: Arc<dyn CourseRepository>,
    /// Enrollments and guest requests.
    pub enrollments: Arc<dyn EnrollmentRepository>,
    /// Certificates.
    pub certificates: Arc<dyn CertificateRepository>,
    /// Assignments.
    pub assignments: Arc<dyn AssignmentRepository>,
    /// Internship postings and applications.
    pub internships: Arc<dyn InternshipRepository>,
    /// Services taxonomy.
    pub service_catalog: Arc<dyn ServiceCatalogRepository>,
    /// Service requests.
    pub service_requests: Arc<dyn ServiceRequestRepository>,
    /// Contact messages.
    pub contacts: Arc<dyn ContactRepository>,
    /// Calendar events.
    pub calendar_events: Arc<dyn CalendarEventRepository>,
    /// Uploaded images.
    pub images: Arc<dyn ImageStore>,
    /// Base URL used to rewrite stored relative media paths.
    pub public_base_url: String,
}

impl HttpState {
    /// Wire services and handlers onto a ports bundle.
    #[must_use]
    pub fn new(ports: HttpStatePorts, public_base_url: impl Into<String>) -> Self {
        let HttpStatePorts {
            users,
            tokens,
            connections,
            activities,
            courses,
            enrollments,
            certificates,
            assignments,
            internships,
            service_catalog,
            service_requests,
            contacts,
            calendar_events,
            images,
        } = ports;

        let accounts = AccountService::new(users.clone(), tokens, enrollments.clone());
        let feed = FeedService::new(activities.clone(), connections.clone(), users.clone());

        Self {
            accounts,
            feed,
            users,
            connections,
            activities,
            courses,
            enrollments,
            certificates,
            assignments,
            internships,
            service_catalog,
            service_requests,
            contacts,
            calendar_events,
            images,
            public_base_url: public_base_url.into(),
        }
    }

    /// A state backed entirely by in-memory fixtures.
    #[must_use]
    pub fn in_memory(public_base_url: impl Into<String>) -> Self {
        Self::new(HttpStatePorts::in_memory(), public_base_url)
    }

    /// Rewrite a stored relative media path into an absolute URL.
    ///
    /// # Examples
    /// ```
    /// use backend::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::in_memory("http://localhost:8080");
    /// assert_eq!(
    ///     state.absolute_media_url("avatars/a.png"),
    ///     "http://localhost:8080/uploads/avatars/a.png"
    /// );
    /// ```
    #[must_use]
    pub fn absolute_media_url(&self, relative: &str) -> String {
        format!(
            "{}/uploads/{}",
            self.public_base_url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }
}
