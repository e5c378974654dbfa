//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode};

/// Aggregated OpenAPI description of the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::upload_avatar,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::connect,
        crate::inbound::http::users::disconnect,
        crate::inbound::http::posts::get_feed,
        crate::inbound::http::posts::create_post,
        crate::inbound::http::posts::delete_post,
        crate::inbound::http::posts::attach_post_image,
        crate::inbound::http::posts::comment_on_post,
        crate::inbound::http::posts::like_post,
        crate::inbound::http::posts::unlike_post,
        crate::inbound::http::posts::bookmark_post,
        crate::inbound::http::posts::unbookmark_post,
        crate::inbound::http::posts::share_post,
        crate::inbound::http::courses::list_courses,
        crate::inbound::http::enrollments::enroll,
        crate::inbound::http::enrollments::record_progress,
        crate::inbound::http::enrollments::list_user_enrollments,
        crate::inbound::http::enrollments::capture_guest_enrollment,
        crate::inbound::http::internships::list_internships,
        crate::inbound::http::internships::apply_to_internship,
        crate::inbound::http::internships::list_user_submissions,
        crate::inbound::http::services::list_categories,
        crate::inbound::http::services::list_subcategories,
        crate::inbound::http::services::submit_request,
        crate::inbound::http::services::list_user_requests,
        crate::inbound::http::contacts::submit_contact,
        crate::inbound::http::calendar::list_calendar_events,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::admin::users::list_users,
        crate::inbound::http::admin::users::update_user,
        crate::inbound::http::admin::users::deactivate_user,
        crate::inbound::http::admin::learning::list_courses,
        crate::inbound::http::admin::learning::create_course,
        crate::inbound::http::admin::learning::update_course,
        crate::inbound::http::admin::learning::delete_course,
        crate::inbound::http::admin::learning::list_assignments,
        crate::inbound::http::admin::learning::create_assignment,
        crate::inbound::http::admin::learning::update_assignment,
        crate::inbound::http::admin::learning::delete_assignment,
        crate::inbound::http::admin::learning::list_certificates,
        crate::inbound::http::admin::learning::issue_certificate,
        crate::inbound::http::admin::learning::delete_certificate,
        crate::inbound::http::admin::learning::list_enrollments,
        crate::inbound::http::admin::learning::update_enrollment,
        crate::inbound::http::admin::learning::delete_enrollment,
        crate::inbound::http::admin::marketplace::list_categories,
        crate::inbound::http::admin::marketplace::create_category,
        crate::inbound::http::admin::marketplace::update_category,
        crate::inbound::http::admin::marketplace::delete_category,
        crate::inbound::http::admin::marketplace::list_subcategories,
        crate::inbound::http::admin::marketplace::create_subcategory,
        crate::inbound::http::admin::marketplace::update_subcategory,
        crate::inbound::http::admin::marketplace::delete_subcategory,
        crate::inbound::http::admin::marketplace::list_requests,
        crate::inbound::http::admin::marketplace::update_request,
        crate::inbound::http::admin::marketplace::delete_request,
        crate::inbound::http::admin::outreach::list_contacts,
        crate::inbound::http::admin::outreach::delete_contact,
        crate::inbound::http::admin::outreach::list_calendar_events,
        crate::inbound::http::admin::outreach::create_calendar_event,
        crate::inbound::http::admin::outreach::update_calendar_event,
        crate::inbound::http::admin::outreach::delete_calendar_event,
        crate::inbound::http::admin::outreach::list_internships,
        crate::inbound::http::admin::outreach::create_internship,
        crate::inbound::http::admin::outreach::update_internship,
        crate::inbound::http::admin::outreach::delete_internship,
        crate::inbound::http::admin::outreach::review_submission,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "posts", description = "Social feed"),
        (name = "courses", description = "Course catalogue"),
        (name = "enrollments", description = "Enrollment tracking"),
        (name = "internships", description = "Internship postings and applications"),
        (name = "services", description = "Services marketplace"),
        (name = "contact", description = "Contact form"),
        (name = "calendar", description = "Calendar events"),
        (name = "admin", description = "Back-office management"),
        (name = "health", description = "Probes"),
    )
)]
pub struct ApiDoc;
