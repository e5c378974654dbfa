//! Social feed API handlers.
//!
//! ```text
//! GET    /api/posts?page=1&limit=10
//! POST   /api/posts                {"content":"...","visibility":"connections"}
//! DELETE /api/posts/{id}
//! POST   /api/posts/{id}/image     multipart image upload
//! POST   /api/posts/{id}/comment   {"content":"..."}
//! POST   /api/posts/{id}/like      DELETE to unlike
//! POST   /api/posts/{id}/bookmark  DELETE to remove
//! POST   /api/posts/{id}/share
//! ```

use actix_multipart::Multipart;
use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::domain::feed::{FeedComment, FeedPage, FeedPost};
use crate::domain::ports::{ImageNamespace, RepositoryError};
use crate::domain::social::{
    ActivityType, Bookmark, Comment, CommentContent, Like, Post, PostContent,
    SocialValidationError,
};
use crate::domain::user::UserSummary;
use crate::domain::{AccountType, Error, SocialActivity, UserId, Visibility};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthedUser;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::uploads::read_image_field;
use crate::inbound::http::validation::{FieldName, page_params, parse_uuid};

/// Author or commenter summary embedded in feed responses.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub display_name: String,
    /// Account role.
    pub account_type: AccountType,
    /// Profile headline.
    pub headline: Option<String>,
    /// Absolute avatar URL.
    pub avatar_url: Option<String>,
}

impl AuthorResponse {
    fn from_summary(state: &HttpState, summary: &UserSummary) -> Self {
        Self {
            id: summary.id,
            display_name: summary.display_name.as_str().to_owned(),
            account_type: summary.account_type,
            headline: summary.headline.clone(),
            avatar_url: summary
                .avatar_path
                .as_deref()
                .map(|path| state.absolute_media_url(path)),
        }
    }
}

/// One comment in a feed response.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedCommentResponse {
    /// Comment id.
    pub id: Uuid,
    /// Resolved commenter.
    pub author: AuthorResponse,
    /// Comment body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl FeedCommentResponse {
    fn from_comment(state: &HttpState, comment: &FeedComment) -> Self {
        Self {
            id: comment.id,
            author: AuthorResponse::from_summary(state, &comment.author),
            content: comment.content.clone(),
            created_at: comment.created_at,
        }
    }
}

/// One enriched post in a feed response.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedPostResponse {
    /// Post id.
    pub id: Uuid,
    /// Resolved author.
    pub author: AuthorResponse,
    /// Body text.
    pub content: String,
    /// Absolute image URL, when attached.
    pub image_url: Option<String>,
    /// Access scope.
    pub visibility: Visibility,
    /// Achievement highlight flag.
    pub is_achievement: bool,
    /// Share counter.
    pub share_count: i64,
    /// Like count.
    pub like_count: u64,
    /// Whether the requester liked this post.
    pub has_liked: bool,
    /// Whether the requester bookmarked this post.
    pub has_bookmarked: bool,
    /// Comment count.
    pub comment_count: u64,
    /// Comments oldest-first.
    pub comments: Vec<FeedCommentResponse>,
    /// Post creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl FeedPostResponse {
    fn from_feed_post(state: &HttpState, post: &FeedPost) -> Self {
        Self {
            id: post.id,
            author: AuthorResponse::from_summary(state, &post.author),
            content: post.content.clone(),
            image_url: post
                .image_path
                .as_deref()
                .map(|path| state.absolute_media_url(path)),
            visibility: post.visibility,
            is_achievement: post.is_achievement,
            share_count: post.share_count,
            like_count: post.like_count,
            has_liked: post.has_liked,
            has_bookmarked: post.has_bookmarked,
            comment_count: post.comment_count,
            comments: post
                .comments
                .iter()
                .map(|comment| FeedCommentResponse::from_comment(state, comment))
                .collect(),
            created_at: post.created_at,
        }
    }
}

/// Feed pagination envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedPagination {
    /// Returned page.
    pub page: u32,
    /// Total pages of visible posts.
    pub total_pages: u64,
    /// Total visible posts.
    pub total_posts: u64,
}

/// Feed response envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    /// Enriched page of posts.
    pub posts: Vec<FeedPostResponse>,
    /// Page envelope.
    pub pagination: FeedPagination,
}

impl FeedResponse {
    fn from_page(state: &HttpState, page: &FeedPage) -> Self {
        Self {
            posts: page
                .posts
                .iter()
                .map(|post| FeedPostResponse::from_feed_post(state, post))
                .collect(),
            pagination: FeedPagination {
                page: page.page,
                total_pages: page.total_pages,
                total_posts: page.total_posts,
            },
        }
    }
}

/// A bare post, as returned by the write endpoints.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    /// Post id.
    pub id: Uuid,
    /// Authoring user id.
    pub author_id: UserId,
    /// Body text.
    pub content: String,
    /// Absolute image URL, when attached.
    pub image_url: Option<String>,
    /// Access scope.
    pub visibility: Visibility,
    /// Achievement highlight flag.
    pub is_achievement: bool,
    /// Share counter.
    pub share_count: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PostResponse {
    fn from_post(state: &HttpState, post: &Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            content: post.content.as_str().to_owned(),
            image_url: post
                .image_path
                .as_deref()
                .map(|path| state.absolute_media_url(path)),
            visibility: post.visibility,
            is_achievement: post.is_achievement,
            share_count: post.share_count,
            created_at: post.created_at,
        }
    }
}

/// Feed query parameters.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    /// One-based page number, default 1.
    pub page: Option<u32>,
    /// Page size, default 10.
    pub limit: Option<u32>,
}

/// Post creation body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostBody {
    /// Body text.
    pub content: String,
    /// Access scope; absent means public.
    #[serde(default)]
    pub visibility: Option<String>,
    /// Achievement highlight flag.
    #[serde(default)]
    pub is_achievement: Option<bool>,
}

/// Comment creation body.
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    /// Comment text.
    pub content: String,
}

/// Share acknowledgement.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareResponse {
    /// Share counter after the increment.
    pub share_count: i64,
}

fn map_social_validation_error(field: &'static str, err: &SocialValidationError) -> Error {
    let code = match err {
        SocialValidationError::EmptyContent => "empty_content",
        SocialValidationError::ContentTooLong { .. } => "content_too_long",
        SocialValidationError::UnknownVisibility => "unknown_visibility",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

fn post_id_from(path: web::Path<String>) -> Result<Uuid, Error> {
    parse_uuid(&path.into_inner(), FieldName::new("postId"))
}

async fn existing_post(state: &HttpState, id: Uuid) -> Result<Post, Error> {
    state
        .activities
        .find_post(id)
        .await?
        .ok_or_else(|| Error::not_found("post not found"))
}

/// The requester's feed page.
#[utoipa::path(
    get,
    path = "/api/posts",
    params(FeedQuery),
    responses(
        (status = 200, description = "Feed page", body = FeedResponse),
        (status = 400, description = "Invalid pagination", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["posts"],
    operation_id = "getFeed"
)]
#[get("/posts")]
pub async fn get_feed(
    state: web::Data<HttpState>,
    user: AuthedUser,
    query: web::Query<FeedQuery>,
) -> ApiResult<web::Json<FeedResponse>> {
    let params = page_params(query.page, query.limit)?;
    let page = state.feed.assemble(user.id(), params).await?;
    Ok(web::Json(FeedResponse::from_page(&state, &page)))
}

/// Create a post.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostBody,
    responses(
        (status = 201, description = "Created post", body = PostResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["posts"],
    operation_id = "createPost"
)]
#[post("/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    user: AuthedUser,
    payload: web::Json<CreatePostBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let content = PostContent::new(body.content)
        .map_err(|err| map_social_validation_error("content", &err))?;
    let visibility = Visibility::parse(body.visibility.as_deref())
        .map_err(|err| map_social_validation_error("visibility", &err))?;

    let post = Post {
        id: Uuid::new_v4(),
        author_id: user.id(),
        content,
        image_path: None,
        visibility,
        is_achievement: body.is_achievement.unwrap_or(false),
        share_count: 0,
        created_at: Utc::now(),
    };
    state
        .activities
        .insert(&SocialActivity::Post(post.clone()))
        .await?;
    Ok(HttpResponse::Created().json(PostResponse::from_post(&state, &post)))
}

/// Delete a post, cascading to every activity that targets it.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "deletePost"
)]
#[delete("/posts/{id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = post_id_from(path)?;
    let post = existing_post(&state, id).await?;
    if post.author_id != user.id() {
        user.require_admin()
            .map_err(|_| Error::forbidden("only the author can delete a post"))?;
    }

    state.activities.delete_post_cascade(id).await?;

    // Best-effort image cleanup; the post is already gone.
    if let Some(image) = post.image_path {
        if let Err(error) = state.images.delete(&image).await {
            warn!(%error, path = %image, "failed to delete post image");
        }
    }
    Ok(HttpResponse::NoContent().finish())
}

/// Attach an image to a post.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/image",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Updated post", body = PostResponse),
        (status = 400, description = "Invalid upload", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "attachPostImage"
)]
#[post("/posts/{id}/image")]
pub async fn attach_post_image(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
    mut payload: Multipart,
) -> ApiResult<web::Json<PostResponse>> {
    let id = post_id_from(path)?;
    let post = existing_post(&state, id).await?;
    if post.author_id != user.id() {
        return Err(Error::forbidden("only the author can attach an image"));
    }

    let (filename, bytes) = read_image_field(&mut payload).await?;
    let stored = state
        .images
        .save(ImageNamespace::Posts, &filename, bytes)
        .await?;
    state.activities.set_post_image(id, &stored).await?;

    if let Some(previous) = post.image_path {
        if let Err(error) = state.images.delete(&previous).await {
            warn!(%error, path = %previous, "failed to delete replaced post image");
        }
    }

    let updated = existing_post(&state, id).await?;
    Ok(web::Json(PostResponse::from_post(&state, &updated)))
}

/// Comment on a post.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/comment",
    params(("id" = String, Path, description = "Post id")),
    request_body = CommentBody,
    responses(
        (status = 201, description = "Created comment"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "commentOnPost"
)]
#[post("/posts/{id}/comment")]
pub async fn comment_on_post(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
    payload: web::Json<CommentBody>,
) -> ApiResult<HttpResponse> {
    let id = post_id_from(path)?;
    existing_post(&state, id).await?;
    let content = CommentContent::new(payload.into_inner().content)
        .map_err(|err| map_social_validation_error("content", &err))?;

    let comment = Comment {
        id: Uuid::new_v4(),
        author_id: user.id(),
        target_id: id,
        content,
        created_at: Utc::now(),
    };
    state
        .activities
        .insert(&SocialActivity::Comment(comment.clone()))
        .await?;
    Ok(HttpResponse::Created().json(json!({
        "id": comment.id,
        "content": comment.content.as_str(),
        "createdAt": comment.created_at,
    })))
}

/// Like a post. At most one like per user and post.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 204, description = "Liked"),
        (status = 400, description = "Already liked", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "likePost"
)]
#[post("/posts/{id}/like")]
pub async fn like_post(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = post_id_from(path)?;
    existing_post(&state, id).await?;
    insert_reaction(
        &state,
        SocialActivity::Like(Like {
            id: Uuid::new_v4(),
            author_id: user.id(),
            target_id: id,
            created_at: Utc::now(),
        }),
        "Post already liked",
        "already_liked",
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Remove a like.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}/like",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 204, description = "Unliked"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No like to remove", body = Error)
    ),
    tags = ["posts"],
    operation_id = "unlikePost"
)]
#[delete("/posts/{id}/like")]
pub async fn unlike_post(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = post_id_from(path)?;
    remove_reaction(&state, id, user.id(), ActivityType::Like, "like not found").await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Bookmark a post. At most one bookmark per user and post.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/bookmark",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 204, description = "Bookmarked"),
        (status = 400, description = "Already bookmarked", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "bookmarkPost"
)]
#[post("/posts/{id}/bookmark")]
pub async fn bookmark_post(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = post_id_from(path)?;
    existing_post(&state, id).await?;
    insert_reaction(
        &state,
        SocialActivity::Bookmark(Bookmark {
            id: Uuid::new_v4(),
            author_id: user.id(),
            target_id: id,
            created_at: Utc::now(),
        }),
        "Post already bookmarked",
        "already_bookmarked",
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Remove a bookmark.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}/bookmark",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 204, description = "Bookmark removed"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No bookmark to remove", body = Error)
    ),
    tags = ["posts"],
    operation_id = "unbookmarkPost"
)]
#[delete("/posts/{id}/bookmark")]
pub async fn unbookmark_post(
    state: web::Data<HttpState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = post_id_from(path)?;
    remove_reaction(
        &state,
        id,
        user.id(),
        ActivityType::Bookmark,
        "bookmark not found",
    )
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Record a share, bumping the post's counter atomically.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/share",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Share recorded", body = ShareResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "sharePost"
)]
#[post("/posts/{id}/share")]
pub async fn share_post(
    state: web::Data<HttpState>,
    _user: AuthedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<ShareResponse>> {
    let id = post_id_from(path)?;
    if !state.activities.increment_share_count(id).await? {
        return Err(Error::not_found("post not found"));
    }
    let post = existing_post(&state, id).await?;
    Ok(web::Json(ShareResponse {
        share_count: post.share_count,
    }))
}

async fn insert_reaction(
    state: &HttpState,
    activity: SocialActivity,
    duplicate_message: &'static str,
    duplicate_code: &'static str,
) -> Result<(), Error> {
    state
        .activities
        .insert(&activity)
        .await
        .map_err(|err| match err {
            RepositoryError::Duplicate { .. } => Error::invalid_request(duplicate_message)
                .with_details(json!({ "code": duplicate_code })),
            other => other.into(),
        })
}

async fn remove_reaction(
    state: &HttpState,
    target: Uuid,
    author: UserId,
    kind: ActivityType,
    missing_message: &'static str,
) -> Result<(), Error> {
    if !state.activities.delete_reaction(target, author, kind).await? {
        return Err(Error::not_found(missing_message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Feed and social write coverage over the in-memory state.
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::{App, test as actix_test};
    use serde_json::Value;

    use crate::inbound::http::users::{login, register};

    use super::*;

    fn test_app(
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
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api")
                .service(register)
                .service(login)
                .service(get_feed)
                .service(create_post)
                .service(delete_post)
                .service(attach_post_image)
                .service(comment_on_post)
                .service(like_post)
                .service(unlike_post)
                .service(bookmark_post)
                .service(unbookmark_post)
                .service(share_post),
        )
    }

    async fn register_user(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        email: &str,
    ) -> String {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/api/register")
                .set_json(serde_json::json!({
                    "email": email,
                    "password": "a strong password",
                    "displayName": "Test User",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        body.get("token")
            .and_then(Value::as_str)
            .expect("token present")
            .to_owned()
    }

    async fn create_post_via_api(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        token: &str,
        body: Value,
    ) -> Value {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/api/posts")
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        actix_test::read_body_json(res).await
    }

    async fn feed(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
        token: &str,
        query: &str,
    ) -> Value {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/posts{query}"))
                .insert_header((AUTHORIZATION, format!("Bearer {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        actix_test::read_body_json(res).await
    }

    fn post_action(token: &str, uri: &str) -> actix_http::Request {
        actix_test::TestRequest::post()
            .uri(uri)
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
            .to_request()
    }

    fn delete_action(token: &str, uri: &str) -> actix_http::Request {
        actix_test::TestRequest::delete()
            .uri(uri)
            .insert_header((AUTHORIZATION, format!("Bearer {token}")))
            .to_request()
    }

    #[actix_web::test]
    async fn private_posts_are_hidden_from_other_feeds() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let author = register_user(&app, "author@example.com").await;
        let viewer = register_user(&app, "viewer@example.com").await;

        create_post_via_api(
            &app,
            &author,
            serde_json::json!({ "content": "secret", "visibility": "private" }),
        )
        .await;

        let viewer_feed = feed(&app, &viewer, "").await;
        assert_eq!(
            viewer_feed
                .pointer("/pagination/totalPosts")
                .and_then(Value::as_u64),
            Some(0)
        );

        let author_feed = feed(&app, &author, "").await;
        assert_eq!(
            author_feed
                .pointer("/pagination/totalPosts")
                .and_then(Value::as_u64),
            Some(1)
        );
    }

    #[actix_web::test]
    async fn pagination_matches_the_documented_envelope() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let author = register_user(&app, "author@example.com").await;
        for i in 0..15 {
            create_post_via_api(
                &app,
                &author,
                serde_json::json!({ "content": format!("post {i}") }),
            )
            .await;
        }

        let page = feed(&app, &author, "?page=2&limit=10").await;
        assert_eq!(
            page.get("posts").and_then(Value::as_array).map(Vec::len),
            Some(5)
        );
        assert_eq!(
            page.pointer("/pagination/totalPages").and_then(Value::as_u64),
            Some(2)
        );
        assert_eq!(
            page.pointer("/pagination/totalPosts").and_then(Value::as_u64),
            Some(15)
        );
    }

    #[actix_web::test]
    async fn double_likes_are_rejected_and_unlike_without_like_is_missing() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let author = register_user(&app, "author@example.com").await;
        let liker = register_user(&app, "liker@example.com").await;
        let post = create_post_via_api(&app, &author, serde_json::json!({ "content": "hi" })).await;
        let id = post.get("id").and_then(Value::as_str).expect("post id");

        let like_uri = format!("/api/posts/{id}/like");
        let first = actix_test::call_service(&app, post_action(&liker, &like_uri)).await;
        assert_eq!(first.status(), StatusCode::NO_CONTENT);

        let second = actix_test::call_service(&app, post_action(&liker, &like_uri)).await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(second).await;
        assert_eq!(
            body.pointer("/details/code").and_then(Value::as_str),
            Some("already_liked")
        );

        let unlike = actix_test::call_service(&app, delete_action(&liker, &like_uri)).await;
        assert_eq!(unlike.status(), StatusCode::NO_CONTENT);

        let again = actix_test::call_service(&app, delete_action(&liker, &like_uri)).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn deleting_a_post_cascades_and_404s_afterwards() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let author = register_user(&app, "author@example.com").await;
        let commenter = register_user(&app, "commenter@example.com").await;
        let post = create_post_via_api(&app, &author, serde_json::json!({ "content": "hi" })).await;
        let id = post.get("id").and_then(Value::as_str).expect("post id");

        let comment = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/posts/{id}/comment"))
                .insert_header((AUTHORIZATION, format!("Bearer {commenter}")))
                .set_json(serde_json::json!({ "content": "nice" }))
                .to_request(),
        )
        .await;
        assert_eq!(comment.status(), StatusCode::CREATED);
        let like = actix_test::call_service(
            &app,
            post_action(&commenter, &format!("/api/posts/{id}/like")),
        )
        .await;
        assert_eq!(like.status(), StatusCode::NO_CONTENT);

        let delete = actix_test::call_service(
            &app,
            delete_action(&author, &format!("/api/posts/{id}")),
        )
        .await;
        assert_eq!(delete.status(), StatusCode::NO_CONTENT);

        // The post and everything targeting it are gone.
        let like_after = actix_test::call_service(
            &app,
            post_action(&commenter, &format!("/api/posts/{id}/like")),
        )
        .await;
        assert_eq!(like_after.status(), StatusCode::NOT_FOUND);
        let author_feed = feed(&app, &author, "").await;
        assert_eq!(
            author_feed
                .pointer("/pagination/totalPosts")
                .and_then(Value::as_u64),
            Some(0)
        );
    }

    #[actix_web::test]
    async fn only_the_author_or_an_admin_deletes_a_post() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let author = register_user(&app, "author@example.com").await;
        let other = register_user(&app, "other@example.com").await;
        let post = create_post_via_api(&app, &author, serde_json::json!({ "content": "hi" })).await;
        let id = post.get("id").and_then(Value::as_str).expect("post id");

        let denied = actix_test::call_service(
            &app,
            delete_action(&other, &format!("/api/posts/{id}")),
        )
        .await;
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn shares_bump_the_counter() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let author = register_user(&app, "author@example.com").await;
        let post = create_post_via_api(&app, &author, serde_json::json!({ "content": "hi" })).await;
        let id = post.get("id").and_then(Value::as_str).expect("post id");

        let uri = format!("/api/posts/{id}/share");
        let first = actix_test::call_service(&app, post_action(&author, &uri)).await;
        assert_eq!(first.status(), StatusCode::OK);
        let second = actix_test::call_service(&app, post_action(&author, &uri)).await;
        let body: Value = actix_test::read_body_json(second).await;
        assert_eq!(body.get("shareCount").and_then(Value::as_i64), Some(2));
    }

    #[actix_web::test]
    async fn feed_embeds_comments_with_their_authors() {
        let app = actix_test::init_service(test_app(HttpState::in_memory("http://x"))).await;
        let author = register_user(&app, "author@example.com").await;
        let commenter = register_user(&app, "commenter@example.com").await;
        let post = create_post_via_api(&app, &author, serde_json::json!({ "content": "hi" })).await;
        let id = post.get("id").and_then(Value::as_str).expect("post id");

        for body in ["first", "second"] {
            let res = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri(&format!("/api/posts/{id}/comment"))
                    .insert_header((AUTHORIZATION, format!("Bearer {commenter}")))
                    .set_json(serde_json::json!({ "content": body }))
                    .to_request(),
            )
            .await;
            assert_eq!(res.status(), StatusCode::CREATED);
        }

        let page = feed(&app, &author, "").await;
        let comments = page
            .pointer("/posts/0/comments")
            .and_then(Value::as_array)
            .expect("comments present");
        assert_eq!(comments.len(), 2);
        assert_eq!(
            comments
                .first()
                .and_then(|c| c.pointer("/content"))
                .and_then(Value::as_str),
            Some("first")
        );
        assert_eq!(
            page.pointer("/posts/0/commentCount").and_then(Value::as_u64),
            Some(2)
        );
    }
}
