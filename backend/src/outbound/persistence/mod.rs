//! PostgreSQL persistence adapters (Diesel + diesel-async).

mod diesel_account_repositories;
mod diesel_error_mapping;
mod diesel_learning_repositories;
mod diesel_marketplace_repositories;
mod diesel_outreach_repositories;
mod diesel_social_repository;
mod models;
pub mod pool;
pub mod schema;

pub use diesel_account_repositories::{
    DieselConnectionRepository, DieselTokenRepository, DieselUserRepository,
};
pub use diesel_learning_repositories::{
    DieselAssignmentRepository, DieselCertificateRepository, DieselCourseRepository,
    DieselEnrollmentRepository,
};
pub use diesel_marketplace_repositories::{
    DieselServiceCatalogRepository, DieselServiceRequestRepository,
};
pub use diesel_outreach_repositories::{
    DieselCalendarEventRepository, DieselContactRepository, DieselInternshipRepository,
};
pub use diesel_social_repository::DieselSocialActivityRepository;
pub use pool::{DbPool, PoolConfig, PoolError};

use diesel::Connection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// SQL migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Run any pending migrations against the given database.
///
/// Uses a short-lived synchronous connection on a blocking thread; the
/// migration harness is not async.
pub async fn run_pending_migrations(database_url: &str) -> Result<(), PoolError> {
    let database_url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = diesel::PgConnection::establish(&database_url)
            .map_err(|err| PoolError::build(err.to_string()))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|_| ())
            .map_err(|err| PoolError::build(err.to_string()))
    })
    .await
    .map_err(|err| PoolError::build(err.to_string()))?
}
