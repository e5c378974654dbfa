//! End-to-end behaviour tests over the composed HTTP surface.
//!
//! These exercise the externally observable contract through one app built
//! the same way the server builds it, backed by the in-memory fixtures.

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};

use backend::Trace;
use backend::domain::course::Course;
use backend::domain::internship::Internship;
use backend::domain::enrollment::GuestEnrollment;
use backend::domain::user::EmailAddress;
use backend::inbound::http::state::HttpState;
use backend::inbound::http::{courses, enrollments, internships, posts, users};
use chrono::Utc;
use uuid::Uuid;

fn app_for(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(Trace)
        .service(
            web::scope("/api")
                .service(users::register)
                .service(users::login)
                .service(users::connect)
                .service(posts::get_feed)
                .service(posts::create_post)
                .service(posts::delete_post)
                .service(posts::comment_on_post)
                .service(posts::like_post)
                .service(posts::unlike_post)
                .service(courses::list_courses)
                .service(enrollments::enroll)
                .service(enrollments::list_user_enrollments)
                .service(internships::list_internships)
                .service(internships::apply_to_internship),
        )
        .service(web::scope("/auth").service(users::current_user))
}

async fn register(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    email: &str,
) -> (String, String) {
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({
                "email": email,
                "password": "a strong password",
                "displayName": "Test User",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = actix_test::read_body_json(res).await;
    (
        body.get("token")
            .and_then(Value::as_str)
            .expect("token")
            .to_owned(),
        body.pointer("/user/id")
            .and_then(Value::as_str)
            .expect("user id")
            .to_owned(),
    )
}

fn authed(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

#[actix_web::test]
async fn duplicate_email_registration_returns_400() {
    let app = actix_test::init_service(app_for(HttpState::in_memory("http://x"))).await;
    let _ = register(&app, "dup@example.com").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({
                "email": "DUP@Example.com",
                "password": "a strong password",
                "displayName": "Dup",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("Email already exists")
    );
}

#[actix_web::test]
async fn error_responses_carry_a_trace_id_header() {
    let app = actix_test::init_service(app_for(HttpState::in_memory("http://x"))).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/posts").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key("trace-id"));
}

#[actix_web::test]
async fn private_posts_stay_out_of_other_feeds_and_connections_posts_require_edges() {
    let app = actix_test::init_service(app_for(HttpState::in_memory("http://x"))).await;
    let (author, author_id) = register(&app, "author@example.com").await;
    let (friend, _) = register(&app, "friend@example.com").await;
    let (stranger, _) = register(&app, "stranger@example.com").await;

    for (content, visibility) in [
        ("open to all", "public"),
        ("inner circle", "connections"),
        ("just me", "private"),
    ] {
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/posts")
                .insert_header(authed(&author))
                .set_json(json!({ "content": content, "visibility": visibility }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let connect = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/users/{author_id}/connect"))
            .insert_header(authed(&friend))
            .to_request(),
    )
    .await;
    assert_eq!(connect.status(), StatusCode::NO_CONTENT);

    let expectations = [(&author, 3_u64), (&friend, 2), (&stranger, 1)];
    for (token, expected) in expectations {
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/posts")
                .insert_header(authed(token))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(
            body.pointer("/pagination/totalPosts").and_then(Value::as_u64),
            Some(expected)
        );
    }
}

#[actix_web::test]
async fn second_like_is_400_and_unlike_without_like_is_404() {
    let app = actix_test::init_service(app_for(HttpState::in_memory("http://x"))).await;
    let (author, _) = register(&app, "author@example.com").await;
    let (liker, _) = register(&app, "liker@example.com").await;

    let created = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(authed(&author))
            .set_json(json!({ "content": "like me" }))
            .to_request(),
    )
    .await;
    let post: Value = actix_test::read_body_json(created).await;
    let id = post.get("id").and_then(Value::as_str).expect("post id");
    let like_uri = format!("/api/posts/{id}/like");

    let unlike_first = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&like_uri)
            .insert_header(authed(&liker))
            .to_request(),
    )
    .await;
    assert_eq!(unlike_first.status(), StatusCode::NOT_FOUND);

    let like = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&like_uri)
            .insert_header(authed(&liker))
            .to_request(),
    )
    .await;
    assert_eq!(like.status(), StatusCode::NO_CONTENT);

    let second = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&like_uri)
            .insert_header(authed(&liker))
            .to_request(),
    )
    .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn deleting_a_post_drops_its_comments_and_likes_from_the_feed() {
    let app = actix_test::init_service(app_for(HttpState::in_memory("http://x"))).await;
    let (author, _) = register(&app, "author@example.com").await;
    let (fan, _) = register(&app, "fan@example.com").await;

    let created = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(authed(&author))
            .set_json(json!({ "content": "short lived" }))
            .to_request(),
    )
    .await;
    let post: Value = actix_test::read_body_json(created).await;
    let id = post.get("id").and_then(Value::as_str).expect("post id");

    for request in [
        actix_test::TestRequest::post()
            .uri(&format!("/api/posts/{id}/comment"))
            .insert_header(authed(&fan))
            .set_json(json!({ "content": "rip" }))
            .to_request(),
        actix_test::TestRequest::post()
            .uri(&format!("/api/posts/{id}/like"))
            .insert_header(authed(&fan))
            .to_request(),
    ] {
        let res = actix_test::call_service(&app, request).await;
        assert!(res.status().is_success());
    }

    let deleted = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/posts/{id}"))
            .insert_header(authed(&author))
            .to_request(),
    )
    .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let feed = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/posts")
            .insert_header(authed(&fan))
            .to_request(),
    )
    .await;
    let body: Value = actix_test::read_body_json(feed).await;
    assert_eq!(
        body.pointer("/pagination/totalPosts").and_then(Value::as_u64),
        Some(0)
    );
}

#[actix_web::test]
async fn page_two_of_fifteen_visible_posts_has_five_posts_and_two_total_pages() {
    let app = actix_test::init_service(app_for(HttpState::in_memory("http://x"))).await;
    let (author, _) = register(&app, "author@example.com").await;
    for i in 0..15 {
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/posts")
                .insert_header(authed(&author))
                .set_json(json!({ "content": format!("post number {i}") }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/posts?page=2&limit=10")
            .insert_header(authed(&author))
            .to_request(),
    )
    .await;
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(
        body.get("posts").and_then(Value::as_array).map(Vec::len),
        Some(5)
    );
    assert_eq!(
        body.pointer("/pagination/totalPages").and_then(Value::as_u64),
        Some(2)
    );
}

#[actix_web::test]
async fn internships_with_no_spots_reject_applications_without_writing() {
    let state = HttpState::in_memory("http://x");
    let posting = Internship::new("Intern", "Acme", "desc", 0, Utc::now()).expect("valid posting");
    state
        .internships
        .insert(&posting)
        .await
        .expect("posting stored");
    let internships = state.internships.clone();
    let app = actix_test::init_service(app_for(state)).await;
    let (token, user_id) = register(&app, "applicant@example.com").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/internships/{}/apply", posting.id))
            .insert_header(authed(&token))
            .set_json(json!({}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let submissions = internships
        .submissions_for_user(
            backend::domain::UserId::new(&user_id).expect("valid id"),
        )
        .await
        .expect("query runs");
    assert!(submissions.is_empty());
}

#[actix_web::test]
async fn guest_enrollments_link_to_the_account_at_login() {
    let state = HttpState::in_memory("http://x");
    let course = Course::new("Rust 101", "intro", Utc::now()).expect("valid course");
    state.courses.insert(&course).await.expect("course stored");
    state
        .enrollments
        .insert_guest(&GuestEnrollment {
            id: Uuid::new_v4(),
            email: EmailAddress::new("Linker@Example.com").expect("valid email"),
            course_id: course.id,
            requested_at: Utc::now(),
        })
        .await
        .expect("guest stored");
    let app = actix_test::init_service(app_for(state)).await;

    let (_, user_id) = register(&app, "linker@example.com").await;
    let login = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "email": "linker@example.com", "password": "a strong password" }))
            .to_request(),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(login).await;
    let token = body.get("token").and_then(Value::as_str).expect("token");

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/users/{user_id}/enrollments"))
            .insert_header(authed(token))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let enrollments: Value = actix_test::read_body_json(res).await;
    assert_eq!(enrollments.as_array().map(Vec::len), Some(1));
    assert_eq!(
        enrollments.pointer("/0/courseId").and_then(Value::as_str),
        Some(course.id.to_string().as_str())
    );
}
