//! PostgreSQL-backed outreach ports: internships, contacts, calendar events.
//!
//! The internship `apply` path is the §-9-style conditional decrement: the
//! submission insert and the capacity decrement run in one transaction, and
//! the decrement only touches rows with remaining capacity, so concurrent
//! applications can never overbook a posting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use pagination::PageParams;
use uuid::Uuid;

use crate::domain::calendar::CalendarEvent;
use crate::domain::contact::ContactMessage;
use crate::domain::internship::{
    Internship, InternshipSubmission, SubmissionStatus,
};
use crate::domain::ports::{
    ApplyOutcome, CalendarEventRepository, ContactRepository, InternshipListFilter,
    InternshipRepository, PagedResult, RepositoryError,
};
use crate::domain::user::{EmailAddress, UserId};

use super::diesel_error_mapping::{map_insert_error, map_pool_error, map_query_error};
use super::models::{
    CalendarEventRow, ContactMessageRow, InternshipRow, InternshipSubmissionRow,
};
use super::pool::DbPool;
use super::schema::{calendar_events, contact_messages, internship_submissions, internships};

fn internship_to_row(internship: &Internship) -> InternshipRow {
    InternshipRow {
        id: internship.id,
        title: internship.title.clone(),
        company: internship.company.clone(),
        description: internship.description.clone(),
        location: internship.location.clone(),
        spots_available: internship.spots_available,
        is_active: internship.is_active,
        created_at: internship.created_at,
    }
}

fn row_to_internship(row: InternshipRow) -> Internship {
    Internship {
        id: row.id,
        title: row.title,
        company: row.company,
        description: row.description,
        location: row.location,
        spots_available: row.spots_available,
        is_active: row.is_active,
        created_at: row.created_at,
    }
}

fn row_to_submission(row: InternshipSubmissionRow) -> Result<InternshipSubmission, RepositoryError> {
    let status = SubmissionStatus::parse(&row.status)
        .map_err(|err| RepositoryError::query(err.to_string()))?;
    Ok(InternshipSubmission {
        id: row.id,
        internship_id: row.internship_id,
        user_id: UserId::from_uuid(row.user_id),
        cover_letter: row.cover_letter,
        status,
        submitted_at: row.submitted_at,
    })
}

/// Internal error threading the no-capacity outcome out of the transaction.
enum ApplyTxError {
    Diesel(diesel::result::Error),
    NoSpots,
}

impl From<diesel::result::Error> for ApplyTxError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Diesel(err)
    }
}

/// Diesel-backed implementation of the internship repository port.
#[derive(Clone)]
pub struct DieselInternshipRepository {
    pool: DbPool,
}

impl DieselInternshipRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InternshipRepository for DieselInternshipRepository {
    async fn insert(&self, internship: &Internship) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(internships::table)
            .values(internship_to_row(internship))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Internship>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = internships::table
            .filter(internships::id.eq(id))
            .select(InternshipRow::as_select())
            .first::<InternshipRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        Ok(row.map(row_to_internship))
    }

    async fn list_active(&self) -> Result<Vec<Internship>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<InternshipRow> = internships::table
            .filter(internships::is_active.eq(true))
            .order(internships::created_at.desc())
            .select(InternshipRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(rows.into_iter().map(row_to_internship).collect())
    }

    async fn list(
        &self,
        filter: &InternshipListFilter,
        params: PageParams,
    ) -> PagedResult<Internship> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let apply_filter = |filter: &InternshipListFilter| {
            let mut query = internships::table.into_boxed();
            if !filter.include_inactive {
                query = query.filter(internships::is_active.eq(true));
            }
            if let Some(search) = &filter.search {
                let pattern = format!("%{search}%");
                query = query.filter(
                    internships::title
                        .ilike(pattern.clone())
                        .or(internships::company.ilike(pattern)),
                );
            }
            query
        };

        let total: i64 = apply_filter(filter)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;
        let rows: Vec<InternshipRow> = apply_filter(filter)
            .order(internships::created_at.desc())
            .offset(i64::try_from(params.offset()).unwrap_or(i64::MAX))
            .limit(i64::from(params.limit()))
            .select(InternshipRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;

        Ok((
            rows.into_iter().map(row_to_internship).collect(),
            u64::try_from(total).unwrap_or(0),
        ))
    }

    async fn update(&self, internship: &Internship) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(internships::table.filter(internships::id.eq(internship.id)))
            .set(internship_to_row(internship))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(internships::table.filter(internships::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(removed > 0)
    }

    async fn apply(
        &self,
        submission: &InternshipSubmission,
    ) -> Result<ApplyOutcome, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = InternshipSubmissionRow {
            id: submission.id,
            internship_id: submission.internship_id,
            user_id: *submission.user_id.as_uuid(),
            cover_letter: submission.cover_letter.clone(),
            status: submission.status.as_str().to_owned(),
            submitted_at: submission.submitted_at,
        };
        let internship_id = submission.internship_id;

        let outcome = conn
            .transaction::<(), ApplyTxError, _>(|conn| {
                async move {
                    // The unique (internship_id, user_id) index rejects
                    // duplicate applications before any spot is consumed.
                    diesel::insert_into(internship_submissions::table)
                        .values(row)
                        .execute(conn)
                        .await?;

                    // Conditional decrement: zero rows touched means the last
                    // spot went to a concurrent applicant, so roll back.
                    let touched = diesel::update(
                        internships::table.filter(
                            internships::id
                                .eq(internship_id)
                                .and(internships::spots_available.gt(0)),
                        ),
                    )
                    .set(internships::spots_available.eq(internships::spots_available - 1))
                    .execute(conn)
                    .await?;
                    if touched == 0 {
                        return Err(ApplyTxError::NoSpots);
                    }
                    Ok(())
                }
                .scope_boxed()
            })
            .await;

        match outcome {
            Ok(()) => Ok(ApplyOutcome::Accepted),
            Err(ApplyTxError::NoSpots) => Ok(ApplyOutcome::NoSpotsAvailable),
            Err(ApplyTxError::Diesel(err)) => {
                Err(map_insert_error(err, "internship application"))
            }
        }
    }

    async fn submissions_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<InternshipSubmission>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<InternshipSubmissionRow> = internship_submissions::table
            .filter(internship_submissions::user_id.eq(user.as_uuid()))
            .order(internship_submissions::submitted_at.desc())
            .select(InternshipSubmissionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows.into_iter().map(row_to_submission).collect()
    }

    async fn set_submission_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(
            internship_submissions::table.filter(internship_submissions::id.eq(id)),
        )
        .set(internship_submissions::status.eq(status.as_str()))
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(touched > 0)
    }
}

/// Diesel-backed implementation of the contact repository port.
#[derive(Clone)]
pub struct DieselContactRepository {
    pool: DbPool,
}

impl DieselContactRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_contact(row: ContactMessageRow) -> Result<ContactMessage, RepositoryError> {
    let email =
        EmailAddress::new(row.email).map_err(|err| RepositoryError::query(err.to_string()))?;
    Ok(ContactMessage {
        id: row.id,
        name: row.name,
        email,
        subject: row.subject,
        message: row.message,
        created_at: row.created_at,
    })
}

#[async_trait]
impl ContactRepository for DieselContactRepository {
    async fn insert(&self, message: &ContactMessage) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = ContactMessageRow {
            id: message.id,
            name: message.name.clone(),
            email: message.email.as_str().to_owned(),
            subject: message.subject.clone(),
            message: message.message.clone(),
            created_at: message.created_at,
        };
        diesel::insert_into(contact_messages::table)
            .values(row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn list(
        &self,
        search: Option<&str>,
        params: PageParams,
    ) -> PagedResult<ContactMessage> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let apply_filter = |search: Option<&str>| {
            let mut query = contact_messages::table.into_boxed();
            if let Some(needle) = search {
                let pattern = format!("%{needle}%");
                query = query.filter(
                    contact_messages::name
                        .ilike(pattern.clone())
                        .or(contact_messages::email.ilike(pattern)),
                );
            }
            query
        };

        let total: i64 = apply_filter(search)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;
        let rows: Vec<ContactMessageRow> = apply_filter(search)
            .order(contact_messages::created_at.desc())
            .offset(i64::try_from(params.offset()).unwrap_or(i64::MAX))
            .limit(i64::from(params.limit()))
            .select(ContactMessageRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;

        let messages = rows
            .into_iter()
            .map(row_to_contact)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((messages, u64::try_from(total).unwrap_or(0)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(contact_messages::table.filter(contact_messages::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}

/// Diesel-backed implementation of the calendar event repository port.
#[derive(Clone)]
pub struct DieselCalendarEventRepository {
    pool: DbPool,
}

impl DieselCalendarEventRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn event_to_row(event: &CalendarEvent) -> CalendarEventRow {
    CalendarEventRow {
        id: event.id,
        title: event.title.clone(),
        description: event.description.clone(),
        starts_at: event.starts_at,
        ends_at: event.ends_at,
        created_by: event.created_by.map(|id| *id.as_uuid()),
        created_at: event.created_at,
    }
}

fn row_to_event(row: CalendarEventRow) -> CalendarEvent {
    CalendarEvent {
        id: row.id,
        title: row.title,
        description: row.description,
        starts_at: row.starts_at,
        ends_at: row.ends_at,
        created_by: row.created_by.map(UserId::from_uuid),
        created_at: row.created_at,
    }
}

#[async_trait]
impl CalendarEventRepository for DieselCalendarEventRepository {
    async fn insert(&self, event: &CalendarEvent) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(calendar_events::table)
            .values(event_to_row(event))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_query_error)
    }

    async fn upcoming(&self, now: DateTime<Utc>) -> Result<Vec<CalendarEvent>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CalendarEventRow> = calendar_events::table
            .filter(
                calendar_events::ends_at
                    .ge(now)
                    .or(calendar_events::ends_at
                        .is_null()
                        .and(calendar_events::starts_at.ge(now))),
            )
            .order(calendar_events::starts_at.asc())
            .select(CalendarEventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(rows.into_iter().map(row_to_event).collect())
    }

    async fn list(&self, params: PageParams) -> PagedResult<CalendarEvent> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = calendar_events::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;
        let rows: Vec<CalendarEventRow> = calendar_events::table
            .order(calendar_events::starts_at.asc())
            .offset(i64::try_from(params.offset()).unwrap_or(i64::MAX))
            .limit(i64::from(params.limit()))
            .select(CalendarEventRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok((
            rows.into_iter().map(row_to_event).collect(),
            u64::try_from(total).unwrap_or(0),
        ))
    }

    async fn update(&self, event: &CalendarEvent) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched =
            diesel::update(calendar_events::table.filter(calendar_events::id.eq(event.id)))
                .set(event_to_row(event))
                .execute(&mut conn)
                .await
                .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(calendar_events::table.filter(calendar_events::id.eq(id)))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion edge cases.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn submission_rows_reject_unknown_statuses() {
        let row = InternshipSubmissionRow {
            id: Uuid::new_v4(),
            internship_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            cover_letter: None,
            status: "waitlisted".into(),
            submitted_at: Utc::now(),
        };
        assert!(row_to_submission(row).is_err());
    }
}
