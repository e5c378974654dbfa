//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations; each repository converts
//! them into validated domain types on the way out.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    assignments, auth_tokens, calendar_events, certificates, connections, contact_messages,
    courses, enrollments, guest_enrollments, internship_submissions, internships,
    service_categories, service_requests, service_subcategories, social_activities, users,
};

/// Row struct for the users table, usable for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub account_type: String,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Changeset for admin-initiated account updates.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset {
    pub display_name: Option<String>,
    pub account_type: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub avatar_path: Option<String>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

/// Row struct for issued tokens.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = auth_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AuthTokenRow {
    pub fingerprint: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
}

/// Row struct for connection edges.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = connections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ConnectionRow {
    pub user_id: Uuid,
    pub peer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Row struct for the unioned social activity table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = social_activities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SocialActivityRow {
    pub id: Uuid,
    pub activity_type: String,
    pub author_id: Uuid,
    pub target_id: Option<Uuid>,
    pub content: Option<String>,
    pub image_path: Option<String>,
    pub visibility: Option<String>,
    pub is_achievement: bool,
    pub share_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Row struct for courses.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = courses)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CourseRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub duration_weeks: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Row struct for enrollments.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = enrollments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EnrollmentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub progress: i16,
    pub status: String,
    pub enrolled_at: DateTime<Utc>,
}

/// Row struct for guest enrollment requests.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = guest_enrollments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GuestEnrollmentRow {
    pub id: Uuid,
    pub email: String,
    pub course_id: Uuid,
    pub requested_at: DateTime<Utc>,
}

/// Row struct for certificates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = certificates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CertificateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub issued_at: DateTime<Utc>,
}

/// Row struct for assignments.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = assignments)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AssignmentRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub due_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for internship postings.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = internships)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InternshipRow {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub spots_available: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Row struct for internship applications.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = internship_submissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InternshipSubmissionRow {
    pub id: Uuid,
    pub internship_id: Uuid,
    pub user_id: Uuid,
    pub cover_letter: Option<String>,
    pub status: String,
    pub submitted_at: DateTime<Utc>,
}

/// Row struct for service categories.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = service_categories)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ServiceCategoryRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for service subcategories.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = service_subcategories)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ServiceSubcategoryRow {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for service requests.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = service_requests)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ServiceRequestRow {
    pub id: Uuid,
    pub subcategory_id: Uuid,
    pub user_id: Option<Uuid>,
    pub contact_name: String,
    pub contact_email: String,
    pub project_details: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Row struct for contact messages.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = contact_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ContactMessageRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Row struct for calendar events.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = calendar_events)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CalendarEventRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
