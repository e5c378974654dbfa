//! PostgreSQL-backed learning ports: courses, enrollments, assignments,
//! certificates.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageParams;
use uuid::Uuid;

use crate::domain::course::{Assignment, Certificate, Course};
use crate::domain::enrollment::{
    Enrollment, EnrollmentStatus, GuestEnrollment, Progress,
};
use crate::domain::ports::{
    AssignmentRepository, CertificateRepository, CourseListFilter, CourseRepository,
    EnrollmentListFilter, EnrollmentRepository, PagedResult, RepositoryError,
};
use crate::domain::user::{EmailAddress, UserId};

use super::diesel_error_mapping::{map_insert_error, map_pool_error, map_query_error};
use super::models::{AssignmentRow, CertificateRow, CourseRow, EnrollmentRow, GuestEnrollmentRow};
use super::pool::DbPool;
use super::schema::{assignments, certificates, courses, enrollments, guest_enrollments};

fn page_offset(params: PageParams) -> i64 {
    i64::try_from(params.offset()).unwrap_or(i64::MAX)
}

fn total_from(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

fn course_to_row(course: &Course) -> CourseRow {
    CourseRow {
        id: course.id,
        title: course.title.clone(),
        description: course.description.clone(),
        category: course.category.clone(),
        duration_weeks: course.duration_weeks,
        is_active: course.is_active,
        created_at: course.created_at,
    }
}

fn row_to_course(row: CourseRow) -> Course {
    Course {
        id: row.id,
        title: row.title,
        description: row.description,
        category: row.category,
        duration_weeks: row.duration_weeks,
        is_active: row.is_active,
        created_at: row.created_at,
    }
}

fn enrollment_to_row(enrollment: &Enrollment) -> EnrollmentRow {
    EnrollmentRow {
        id: enrollment.id,
        user_id: *enrollment.user_id.as_uuid(),
        course_id: enrollment.course_id,
        progress: i16::from(enrollment.progress.value()),
        status: enrollment.status.as_str().to_owned(),
        enrolled_at: enrollment.enrolled_at,
    }
}

fn row_to_enrollment(row: EnrollmentRow) -> Result<Enrollment, RepositoryError> {
    let progress = u8::try_from(row.progress)
        .ok()
        .and_then(|value| Progress::new(value).ok())
        .ok_or_else(|| RepositoryError::query("enrollment progress out of range"))?;
    let status = EnrollmentStatus::parse(&row.status)
        .map_err(|err| RepositoryError::query(err.to_string()))?;
    Ok(Enrollment {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        course_id: row.course_id,
        progress,
        status,
        enrolled_at: row.enrolled_at,
    })
}

/// Diesel-backed implementation of the course repository port.
#[derive(Clone)]
pub struct DieselCourseRepository {
    pool: DbPool,
}

impl DieselCourseRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for DieselCourseRepository {
    async fn insert(&self, course: &Course) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(courses::table)
            .values(course_to_row(course))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Course>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = courses::table
            .filter(courses::id.eq(id))
            .select(CourseRow::as_select())
            .first::<CourseRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        Ok(row.map(row_to_course))
    }

    async fn list_active(&self) -> Result<Vec<Course>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CourseRow> = courses::table
            .filter(courses::is_active.eq(true))
            .order(courses::created_at.desc())
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(rows.into_iter().map(row_to_course).collect())
    }

    async fn list(&self, filter: &CourseListFilter, params: PageParams) -> PagedResult<Course> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let apply_filter = |filter: &CourseListFilter| {
            let mut query = courses::table.into_boxed();
            if let Some(search) = &filter.search {
                let pattern = format!("%{search}%");
                query = query.filter(
                    courses::title
                        .ilike(pattern.clone())
                        .or(courses::category.ilike(pattern)),
                );
            }
            query
        };

        let total: i64 = apply_filter(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;
        let rows: Vec<CourseRow> = apply_filter(filter)
            .order(courses::created_at.desc())
            .offset(page_offset(params))
            .limit(i64::from(params.limit()))
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;

        Ok((
            rows.into_iter().map(row_to_course).collect(),
            total_from(total),
        ))
    }

    async fn update(&self, course: &Course) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(courses::table.filter(courses::id.eq(course.id)))
            .set(course_to_row(course))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(courses::table.filter(courses::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}

/// Diesel-backed implementation of the enrollment repository port.
///
/// The `(user_id, course_id)` unique index turns the original
/// check-then-insert into a single atomic insert.
#[derive(Clone)]
pub struct DieselEnrollmentRepository {
    pool: DbPool,
}

impl DieselEnrollmentRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for DieselEnrollmentRepository {
    async fn insert(&self, enrollment: &Enrollment) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(enrollments::table)
            .values(enrollment_to_row(enrollment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_insert_error(err, "enrollment"))
    }

    async fn find(&self, id: Uuid) -> Result<Option<Enrollment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = enrollments::table
            .filter(enrollments::id.eq(id))
            .select(EnrollmentRow::as_select())
            .first::<EnrollmentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(row_to_enrollment).transpose()
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<Enrollment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<EnrollmentRow> = enrollments::table
            .filter(enrollments::user_id.eq(user.as_uuid()))
            .order(enrollments::enrolled_at.desc())
            .select(EnrollmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows.into_iter().map(row_to_enrollment).collect()
    }

    async fn record_progress(
        &self,
        id: Uuid,
        progress: Progress,
        status: EnrollmentStatus,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(enrollments::table.filter(enrollments::id.eq(id)))
            .set((
                enrollments::progress.eq(i16::from(progress.value())),
                enrollments::status.eq(status.as_str()),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn list(
        &self,
        filter: &EnrollmentListFilter,
        params: PageParams,
    ) -> PagedResult<Enrollment> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let apply_filter = |filter: &EnrollmentListFilter| {
            let mut query = enrollments::table.into_boxed();
            if let Some(user_id) = filter.user_id {
                query = query.filter(enrollments::user_id.eq(*user_id.as_uuid()));
            }
            if let Some(status) = filter.status {
                query = query.filter(enrollments::status.eq(status.as_str()));
            }
            query
        };

        let total: i64 = apply_filter(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;
        let rows: Vec<EnrollmentRow> = apply_filter(filter)
            .order(enrollments::enrolled_at.desc())
            .offset(page_offset(params))
            .limit(i64::from(params.limit()))
            .select(EnrollmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;

        let enrollments = rows
            .into_iter()
            .map(row_to_enrollment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((enrollments, total_from(total)))
    }

    async fn update(&self, enrollment: &Enrollment) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(enrollments::table.filter(enrollments::id.eq(enrollment.id)))
            .set(enrollment_to_row(enrollment))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(enrollments::table.filter(enrollments::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(removed > 0)
    }

    async fn insert_guest(&self, guest: &GuestEnrollment) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = GuestEnrollmentRow {
            id: guest.id,
            email: guest.email.as_str().to_owned(),
            course_id: guest.course_id,
            requested_at: guest.requested_at,
        };
        diesel::insert_into(guest_enrollments::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn guest_requests_for_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Vec<GuestEnrollment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<GuestEnrollmentRow> = guest_enrollments::table
            .filter(guest_enrollments::email.eq(email.as_str()))
            .select(GuestEnrollmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows.into_iter()
            .map(|row| {
                let email = EmailAddress::new(row.email)
                    .map_err(|err| RepositoryError::query(err.to_string()))?;
                Ok(GuestEnrollment {
                    id: row.id,
                    email,
                    course_id: row.course_id,
                    requested_at: row.requested_at,
                })
            })
            .collect()
    }

    async fn consume_guest(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed =
            diesel::delete(guest_enrollments::table.filter(guest_enrollments::id.eq(id)))
                .execute(&mut conn)
                .await
                .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}

/// Diesel-backed implementation of the assignment repository port.
#[derive(Clone)]
pub struct DieselAssignmentRepository {
    pool: DbPool,
}

impl DieselAssignmentRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn assignment_to_row(assignment: &Assignment) -> AssignmentRow {
    AssignmentRow {
        id: assignment.id,
        course_id: assignment.course_id,
        title: assignment.title.clone(),
        description: assignment.description.clone(),
        due_at: assignment.due_at,
        created_at: assignment.created_at,
    }
}

fn row_to_assignment(row: AssignmentRow) -> Assignment {
    Assignment {
        id: row.id,
        course_id: row.course_id,
        title: row.title,
        description: row.description,
        due_at: row.due_at,
        created_at: row.created_at,
    }
}

#[async_trait]
impl AssignmentRepository for DieselAssignmentRepository {
    async fn insert(&self, assignment: &Assignment) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(assignments::table)
            .values(assignment_to_row(assignment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Assignment>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = assignments::table
            .filter(assignments::id.eq(id))
            .select(AssignmentRow::as_select())
            .first::<AssignmentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        Ok(row.map(row_to_assignment))
    }

    async fn list(
        &self,
        course_id: Option<Uuid>,
        params: PageParams,
    ) -> PagedResult<Assignment> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let apply_filter = |course_id: Option<Uuid>| {
            let mut query = assignments::table.into_boxed();
            if let Some(course) = course_id {
                query = query.filter(assignments::course_id.eq(course));
            }
            query
        };

        let total: i64 = apply_filter(course_id)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;
        let rows: Vec<AssignmentRow> = apply_filter(course_id)
            .order(assignments::created_at.desc())
            .offset(page_offset(params))
            .limit(i64::from(params.limit()))
            .select(AssignmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;

        Ok((
            rows.into_iter().map(row_to_assignment).collect(),
            total_from(total),
        ))
    }

    async fn update(&self, assignment: &Assignment) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(assignments::table.filter(assignments::id.eq(assignment.id)))
            .set(assignment_to_row(assignment))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(assignments::table.filter(assignments::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}

/// Diesel-backed implementation of the certificate repository port.
#[derive(Clone)]
pub struct DieselCertificateRepository {
    pool: DbPool,
}

impl DieselCertificateRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_certificate(row: CertificateRow) -> Certificate {
    Certificate {
        id: row.id,
        user_id: UserId::from_uuid(row.user_id),
        course_id: row.course_id,
        title: row.title,
        issued_at: row.issued_at,
    }
}

#[async_trait]
impl CertificateRepository for DieselCertificateRepository {
    async fn insert(&self, certificate: &Certificate) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = CertificateRow {
            id: certificate.id,
            user_id: *certificate.user_id.as_uuid(),
            course_id: certificate.course_id,
            title: certificate.title.clone(),
            issued_at: certificate.issued_at,
        };
        diesel::insert_into(certificates::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<Certificate>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CertificateRow> = certificates::table
            .filter(certificates::user_id.eq(user.as_uuid()))
            .order(certificates::issued_at.desc())
            .select(CertificateRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(rows.into_iter().map(row_to_certificate).collect())
    }

    async fn list(&self, params: PageParams) -> PagedResult<Certificate> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = certificates::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;
        let rows: Vec<CertificateRow> = certificates::table
            .order(certificates::issued_at.desc())
            .offset(page_offset(params))
            .limit(i64::from(params.limit()))
            .select(CertificateRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok((
            rows.into_iter().map(row_to_certificate).collect(),
            total_from(total),
        ))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(certificates::table.filter(certificates::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}
