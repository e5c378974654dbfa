//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// User accounts. `email` is stored normalised (lower case) and carries a
    /// unique index, which is what makes duplicate registration checks
    /// case-insensitive.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Normalised login email (unique).
        email -> Varchar,
        /// PHC-formatted credential hash.
        password_hash -> Varchar,
        /// Public display name.
        display_name -> Varchar,
        /// Account role tag.
        account_type -> Varchar,
        /// Short profile headline.
        headline -> Nullable<Varchar>,
        /// Longer profile biography.
        bio -> Nullable<Text>,
        /// Relative path of the stored avatar image.
        avatar_path -> Nullable<Varchar>,
        /// Soft-delete flag.
        is_active -> Bool,
        /// Email verification flag.
        is_verified -> Bool,
        /// Registration timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Issued bearer tokens, keyed by SHA-256 fingerprint.
    auth_tokens (fingerprint) {
        /// Hex-encoded SHA-256 fingerprint of the token.
        fingerprint -> Varchar,
        /// Owning user.
        user_id -> Uuid,
        /// Expiry instant.
        expires_at -> Timestamptz,
        /// Issue timestamp.
        issued_at -> Timestamptz,
    }
}

diesel::table! {
    /// Connection edges, written in both directions on connect.
    connections (user_id, peer_id) {
        /// Owning side of the edge.
        user_id -> Uuid,
        /// Connected peer.
        peer_id -> Uuid,
        /// Connection timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// The unioned social activity collection. Posts, likes, comments and
    /// bookmarks share this table behind the `activity_type` tag so that one
    /// query by `target_id` fetches everything attached to a post. Partial
    /// unique indexes enforce at most one like and one bookmark per
    /// `(author_id, target_id)`.
    social_activities (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Variant tag: post, like, comment or bookmark.
        activity_type -> Varchar,
        /// Authoring user.
        author_id -> Uuid,
        /// Referenced post for likes, comments and bookmarks.
        target_id -> Nullable<Uuid>,
        /// Body text for posts and comments.
        content -> Nullable<Text>,
        /// Relative path of an attached image (posts only).
        image_path -> Nullable<Varchar>,
        /// Access scope for posts; null means public.
        visibility -> Nullable<Varchar>,
        /// Achievement highlight flag (posts only).
        is_achievement -> Bool,
        /// Share counter (posts only).
        share_count -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Courses.
    courses (id) {
        /// Primary key.
        id -> Uuid,
        /// Title.
        title -> Varchar,
        /// Description.
        description -> Text,
        /// Free-form category label.
        category -> Nullable<Varchar>,
        /// Nominal duration in weeks.
        duration_weeks -> Nullable<Int4>,
        /// Visibility in the public listing.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Enrollments, unique per `(user_id, course_id)`.
    enrollments (id) {
        /// Primary key.
        id -> Uuid,
        /// Enrolled user.
        user_id -> Uuid,
        /// Enrolled course.
        course_id -> Uuid,
        /// Completion percentage, 0 to 100.
        progress -> Int2,
        /// Lifecycle state tag.
        status -> Varchar,
        /// Enrollment timestamp.
        enrolled_at -> Timestamptz,
    }
}

diesel::table! {
    /// Guest enrollment requests awaiting auto-linking.
    guest_enrollments (id) {
        /// Primary key.
        id -> Uuid,
        /// Normalised email the guest supplied.
        email -> Varchar,
        /// Requested course.
        course_id -> Uuid,
        /// Capture timestamp.
        requested_at -> Timestamptz,
    }
}

diesel::table! {
    /// Issued certificates.
    certificates (id) {
        /// Primary key.
        id -> Uuid,
        /// Receiving user.
        user_id -> Uuid,
        /// Completed course.
        course_id -> Uuid,
        /// Title.
        title -> Varchar,
        /// Issue timestamp.
        issued_at -> Timestamptz,
    }
}

diesel::table! {
    /// Course assignments.
    assignments (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning course.
        course_id -> Uuid,
        /// Title.
        title -> Varchar,
        /// Task description.
        description -> Text,
        /// Submission deadline.
        due_at -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Internship postings.
    internships (id) {
        /// Primary key.
        id -> Uuid,
        /// Position title.
        title -> Varchar,
        /// Hiring company.
        company -> Varchar,
        /// Role description.
        description -> Text,
        /// Work location.
        location -> Nullable<Varchar>,
        /// Remaining application capacity.
        spots_available -> Int4,
        /// Visibility in the public listing.
        is_active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Internship applications, unique per `(internship_id, user_id)`.
    internship_submissions (id) {
        /// Primary key.
        id -> Uuid,
        /// Target posting.
        internship_id -> Uuid,
        /// Applying user.
        user_id -> Uuid,
        /// Cover letter.
        cover_letter -> Nullable<Text>,
        /// Review state tag.
        status -> Varchar,
        /// Application timestamp.
        submitted_at -> Timestamptz,
    }
}

diesel::table! {
    /// Service categories.
    service_categories (id) {
        /// Primary key.
        id -> Uuid,
        /// Name.
        name -> Varchar,
        /// Description.
        description -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Service subcategories.
    service_subcategories (id) {
        /// Primary key.
        id -> Uuid,
        /// Owning category.
        category_id -> Uuid,
        /// Name.
        name -> Varchar,
        /// Description.
        description -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Service requests.
    service_requests (id) {
        /// Primary key.
        id -> Uuid,
        /// Target subcategory.
        subcategory_id -> Uuid,
        /// Submitting account, when authenticated.
        user_id -> Nullable<Uuid>,
        /// Contact name.
        contact_name -> Varchar,
        /// Contact email.
        contact_email -> Varchar,
        /// Project description.
        project_details -> Text,
        /// Budget indication.
        budget -> Nullable<Varchar>,
        /// Timeline indication.
        timeline -> Nullable<Varchar>,
        /// Workflow state tag.
        status -> Varchar,
        /// Submission timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Contact form messages. No status column; triage state is not persisted.
    contact_messages (id) {
        /// Primary key.
        id -> Uuid,
        /// Sender name.
        name -> Varchar,
        /// Sender email.
        email -> Varchar,
        /// Subject line.
        subject -> Nullable<Varchar>,
        /// Message body.
        message -> Text,
        /// Submission timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Calendar events.
    calendar_events (id) {
        /// Primary key.
        id -> Uuid,
        /// Title.
        title -> Varchar,
        /// Description.
        description -> Nullable<Text>,
        /// Start time.
        starts_at -> Timestamptz,
        /// End time.
        ends_at -> Nullable<Timestamptz>,
        /// Creating admin.
        created_by -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(service_subcategories -> service_categories (category_id));
diesel::joinable!(service_requests -> service_subcategories (subcategory_id));
diesel::joinable!(enrollments -> courses (course_id));
diesel::joinable!(assignments -> courses (course_id));
diesel::joinable!(internship_submissions -> internships (internship_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    auth_tokens,
    connections,
    social_activities,
    courses,
    enrollments,
    guest_enrollments,
    certificates,
    assignments,
    internships,
    internship_submissions,
    service_categories,
    service_subcategories,
    service_requests,
    contact_messages,
    calendar_events,
);
