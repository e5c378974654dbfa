//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::{App, HttpServer, web};

use backend::Trace;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::state::{HttpState, HttpStatePorts};
use backend::inbound::http::{
    admin, calendar, contacts, courses, enrollments, internships, posts, services, users,
};
use backend::outbound::persistence::{
    DieselAssignmentRepository, DieselCalendarEventRepository, DieselCertificateRepository,
    DieselConnectionRepository, DieselContactRepository, DieselCourseRepository,
    DieselEnrollmentRepository, DieselInternshipRepository, DieselServiceCatalogRepository,
    DieselServiceRequestRepository, DieselSocialActivityRepository, DieselTokenRepository,
    DieselUserRepository,
};
use backend::outbound::storage::LocalImageStore;
#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(feature = "metrics")]
fn make_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("backend")
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("configure Prometheus metrics: {err}")))
}

/// Build the HTTP state from configuration.
///
/// With a database pool the Diesel adapters back every port; without one the
/// in-memory fixtures do, which is the no-database development mode.
fn build_http_state(config: &ServerConfig) -> HttpState {
    let images = Arc::new(LocalImageStore::new(config.uploads_dir.clone()));
    let ports = config.db_pool.as_ref().map_or_else(
        || {
            let mut ports = HttpStatePorts::in_memory();
            ports.images = images.clone();
            ports
        },
        |pool| HttpStatePorts {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            tokens: Arc::new(DieselTokenRepository::new(pool.clone())),
            connections: Arc::new(DieselConnectionRepository::new(pool.clone())),
            activities: Arc::new(DieselSocialActivityRepository::new(pool.clone())),
            courses: Arc::new(DieselCourseRepository::new(pool.clone())),
            enrollments: Arc::new(DieselEnrollmentRepository::new(pool.clone())),
            certificates: Arc::new(DieselCertificateRepository::new(pool.clone())),
            assignments: Arc::new(DieselAssignmentRepository::new(pool.clone())),
            internships: Arc::new(DieselInternshipRepository::new(pool.clone())),
            service_catalog: Arc::new(DieselServiceCatalogRepository::new(pool.clone())),
            service_requests: Arc::new(DieselServiceRequestRepository::new(pool.clone())),
            contacts: Arc::new(DieselContactRepository::new(pool.clone())),
            calendar_events: Arc::new(DieselCalendarEventRepository::new(pool.clone())),
            images: images.clone(),
        },
    );

    let mut state = HttpState::new(ports, config.public_base_url.clone());
    state.accounts = state.accounts.with_token_ttl_hours(config.token_ttl_hours);
    state
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    cors_allowed_origins: Vec<String>,
    uploads_dir: std::path::PathBuf,
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(3600);
    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        cors_allowed_origins,
        uploads_dir,
    } = deps;

    let admin_scope = web::scope("/admin")
        .service(admin::users::list_users)
        .service(admin::users::update_user)
        .service(admin::users::deactivate_user)
        .service(admin::learning::list_courses)
        .service(admin::learning::create_course)
        .service(admin::learning::update_course)
        .service(admin::learning::delete_course)
        .service(admin::learning::list_assignments)
        .service(admin::learning::create_assignment)
        .service(admin::learning::update_assignment)
        .service(admin::learning::delete_assignment)
        .service(admin::learning::list_certificates)
        .service(admin::learning::issue_certificate)
        .service(admin::learning::delete_certificate)
        .service(admin::learning::list_enrollments)
        .service(admin::learning::update_enrollment)
        .service(admin::learning::delete_enrollment)
        .service(admin::marketplace::list_categories)
        .service(admin::marketplace::create_category)
        .service(admin::marketplace::update_category)
        .service(admin::marketplace::delete_category)
        .service(admin::marketplace::list_subcategories)
        .service(admin::marketplace::create_subcategory)
        .service(admin::marketplace::update_subcategory)
        .service(admin::marketplace::delete_subcategory)
        .service(admin::marketplace::list_requests)
        .service(admin::marketplace::update_request)
        .service(admin::marketplace::delete_request)
        .service(admin::outreach::list_contacts)
        .service(admin::outreach::delete_contact)
        .service(admin::outreach::list_calendar_events)
        .service(admin::outreach::create_calendar_event)
        .service(admin::outreach::update_calendar_event)
        .service(admin::outreach::delete_calendar_event)
        .service(admin::outreach::list_internships)
        .service(admin::outreach::create_internship)
        .service(admin::outreach::update_internship)
        .service(admin::outreach::delete_internship)
        .service(admin::outreach::review_submission);

    let api = web::scope("/api")
        .service(users::register)
        .service(users::login)
        .service(users::connect)
        .service(users::disconnect)
        .service(posts::get_feed)
        .service(posts::create_post)
        .service(posts::delete_post)
        .service(posts::attach_post_image)
        .service(posts::comment_on_post)
        .service(posts::like_post)
        .service(posts::unlike_post)
        .service(posts::bookmark_post)
        .service(posts::unbookmark_post)
        .service(posts::share_post)
        .service(courses::list_courses)
        .service(enrollments::enroll)
        .service(enrollments::record_progress)
        .service(enrollments::list_user_enrollments)
        .service(enrollments::capture_guest_enrollment)
        .service(internships::list_internships)
        .service(internships::apply_to_internship)
        .service(internships::list_user_submissions)
        .service(services::list_categories)
        .service(services::list_subcategories)
        .service(services::submit_request)
        .service(services::list_user_requests)
        .service(contacts::submit_contact)
        .service(calendar::list_calendar_events)
        .service(admin_scope);

    let auth = web::scope("/auth")
        .service(users::current_user)
        .service(users::update_profile)
        .service(users::upload_avatar)
        .service(users::logout);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(build_cors(&cors_allowed_origins))
        .wrap(Trace)
        .service(api)
        .service(auth)
        .service(actix_files::Files::new("/uploads", uploads_dir))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(build_http_state(&config));
    let ServerConfig {
        bind_addr,
        cors_allowed_origins,
        uploads_dir,
        ..
    } = config;

    #[cfg(feature = "metrics")]
    let prometheus = make_metrics()?;

    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            cors_allowed_origins: cors_allowed_origins.clone(),
            uploads_dir: uploads_dir.clone(),
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
