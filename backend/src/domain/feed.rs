//! Social feed assembly.
//!
//! Given a requesting user and page parameters, produce a page of visible
//! posts enriched with author info, the requester's like/bookmark state and
//! an ordered comment list. The pipeline:
//!
//! 1. fetch the requester's connection list;
//! 2. fetch posts newest-first;
//! 3. filter by visibility;
//! 4. paginate the visible set in memory;
//! 5. enrich each page post concurrently under a per-post timeout budget;
//! 6. assemble the response envelope.
//!
//! A failed or timed-out enrichment drops that single post from the page
//! rather than failing the whole request. There is no snapshot isolation
//! across the reads; a like landing mid-request may be visible in one post's
//! counts and not another's, which is acceptable for a feed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use pagination::{PageParams, paginate};
use tracing::warn;
use uuid::Uuid;

use super::ports::{ConnectionRepository, SocialActivityRepository, UserRepository};
use super::social::{Comment, Post, SocialActivity, Visibility};
use super::user::{UserId, UserSummary};
use super::Error;

/// Default per-post enrichment budget.
pub const DEFAULT_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// One comment in an assembled feed post, with its author resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedComment {
    /// Comment identifier.
    pub id: Uuid,
    /// Resolved commenter summary.
    pub author: UserSummary,
    /// Comment body.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One fully enriched post in a feed page.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPost {
    /// Post identifier.
    pub id: Uuid,
    /// Resolved author summary.
    pub author: UserSummary,
    /// Body text.
    pub content: String,
    /// Relative path of an attached image, if any.
    pub image_path: Option<String>,
    /// Access scope.
    pub visibility: Visibility,
    /// Achievement highlight flag.
    pub is_achievement: bool,
    /// Share counter.
    pub share_count: i64,
    /// Number of likes.
    pub like_count: u64,
    /// Whether the requester has liked this post.
    pub has_liked: bool,
    /// Whether the requester has bookmarked this post.
    pub has_bookmarked: bool,
    /// Number of comments.
    pub comment_count: u64,
    /// Comments ordered by creation time ascending.
    pub comments: Vec<FeedComment>,
    /// Post creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An assembled feed page.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    /// Enriched posts for this page, newest first.
    pub posts: Vec<FeedPost>,
    /// Returned page number.
    pub page: u32,
    /// Total pages of visible posts at the requested limit.
    pub total_pages: u64,
    /// Total visible posts across all pages.
    pub total_posts: u64,
}

/// Assembles feed pages from the social, connection and user ports.
#[derive(Clone)]
pub struct FeedService {
    activities: Arc<dyn SocialActivityRepository>,
    connections: Arc<dyn ConnectionRepository>,
    users: Arc<dyn UserRepository>,
    enrichment_timeout: Duration,
}

impl FeedService {
    /// Create a service with the default enrichment budget.
    #[must_use]
    pub fn new(
        activities: Arc<dyn SocialActivityRepository>,
        connections: Arc<dyn ConnectionRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            activities,
            connections,
            users,
            enrichment_timeout: DEFAULT_ENRICHMENT_TIMEOUT,
        }
    }

    /// Override the per-post enrichment budget.
    #[must_use]
    pub const fn with_enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment_timeout = timeout;
        self
    }

    /// Assemble one page of the requester's feed.
    pub async fn assemble(
        &self,
        requester: UserId,
        params: PageParams,
    ) -> Result<FeedPage, Error> {
        let connections = self.connections.connections_of(requester).await?;

        let posts = self.activities.list_posts().await?;
        let visible: Vec<Post> = posts
            .into_iter()
            .filter(|post| post.is_visible_to(requester, &connections))
            .collect();

        let (page_posts, envelope) = paginate(visible, params);

        // Every post on the page enriches concurrently; each enrichment gets
        // its own timeout budget so one slow sub-fetch cannot stall the page.
        let enrichments = page_posts
            .into_iter()
            .map(|post| self.enrich_with_budget(post, requester));
        let posts: Vec<FeedPost> = join_all(enrichments)
            .await
            .into_iter()
            .flatten()
            .collect();

        Ok(FeedPage {
            posts,
            page: envelope.page,
            total_pages: envelope.total_pages,
            total_posts: envelope.total_items,
        })
    }

    async fn enrich_with_budget(&self, post: Post, requester: UserId) -> Option<FeedPost> {
        let post_id = post.id;
        match tokio::time::timeout(self.enrichment_timeout, self.enrich(post, requester)).await {
            Ok(Ok(enriched)) => Some(enriched),
            Ok(Err(error)) => {
                warn!(%post_id, %error, "dropping post from feed page after enrichment failure");
                None
            }
            Err(_) => {
                warn!(%post_id, "dropping post from feed page after enrichment timeout");
                None
            }
        }
    }

    async fn enrich(&self, post: Post, requester: UserId) -> Result<FeedPost, Error> {
        let author = self
            .author_summary(post.author_id)
            .await?
            .ok_or_else(|| Error::internal(format!("author missing for post {}", post.id)))?;

        // One query for everything targeting the post, partitioned in memory.
        let targeting = self.activities.activities_for_target(post.id).await?;
        let mut like_count = 0_u64;
        let mut has_liked = false;
        let mut has_bookmarked = false;
        let mut comments: Vec<Comment> = Vec::new();
        for activity in targeting {
            match activity {
                SocialActivity::Like(like) => {
                    like_count += 1;
                    if like.author_id == requester {
                        has_liked = true;
                    }
                }
                SocialActivity::Bookmark(bookmark) => {
                    if bookmark.author_id == requester {
                        has_bookmarked = true;
                    }
                }
                SocialActivity::Comment(comment) => comments.push(comment),
                SocialActivity::Post(_) => {}
            }
        }
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut commenter_ids: Vec<UserId> =
            comments.iter().map(|comment| comment.author_id).collect();
        commenter_ids.sort_unstable_by_key(|id| *id.as_uuid());
        commenter_ids.dedup();
        let commenters = self.users.summaries(&commenter_ids).await?;

        let comment_count = comments.len() as u64;
        let comments = comments
            .into_iter()
            .filter_map(|comment| {
                let author = commenters
                    .iter()
                    .find(|summary| summary.id == comment.author_id)
                    .cloned()?;
                Some(FeedComment {
                    id: comment.id,
                    author,
                    content: comment.content.as_str().to_owned(),
                    created_at: comment.created_at,
                })
            })
            .collect();

        Ok(FeedPost {
            id: post.id,
            author,
            content: post.content.as_str().to_owned(),
            image_path: post.image_path,
            visibility: post.visibility,
            is_achievement: post.is_achievement,
            share_count: post.share_count,
            like_count,
            has_liked,
            has_bookmarked,
            comment_count,
            comments,
            created_at: post.created_at,
        })
    }

    async fn author_summary(&self, id: UserId) -> Result<Option<UserSummary>, Error> {
        Ok(self.users.summaries(&[id]).await?.into_iter().next())
    }
}
