//! Social activity types: posts, likes, comments, bookmarks.
//!
//! The store unions all four behind one `activity_type` tag (single-query
//! lookups by `target_id` are the point of that layout). In the domain the
//! union is a proper sum type; the string tag exists only at the persistence
//! boundary.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Maximum accepted post body length in characters.
pub const POST_CONTENT_MAX: usize = 5_000;
/// Maximum accepted comment body length in characters.
pub const COMMENT_CONTENT_MAX: usize = 2_000;

/// Validation errors for social activity payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocialValidationError {
    /// Body was empty after trimming.
    EmptyContent,
    /// Body exceeded the maximum length.
    ContentTooLong {
        /// Maximum accepted length in characters.
        max: usize,
    },
    /// Visibility string did not match a known scope.
    UnknownVisibility,
}

impl fmt::Display for SocialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "content must not be empty"),
            Self::ContentTooLong { max } => {
                write!(f, "content must be at most {max} characters")
            }
            Self::UnknownVisibility => {
                write!(f, "visibility must be one of public, connections, private")
            }
        }
    }
}

impl std::error::Error for SocialValidationError {}

/// Per-post access scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to every requester. Absent visibility means public.
    #[default]
    Public,
    /// Visible to the author and the author's connections.
    Connections,
    /// Visible to the author only.
    Private,
}

impl Visibility {
    /// Parse the wire representation; `None` means public.
    pub fn parse(value: Option<&str>) -> Result<Self, SocialValidationError> {
        match value {
            None | Some("public") => Ok(Self::Public),
            Some("connections") => Ok(Self::Connections),
            Some("private") => Ok(Self::Private),
            Some(_) => Err(SocialValidationError::UnknownVisibility),
        }
    }

    /// Wire representation of the scope.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Connections => "connections",
            Self::Private => "private",
        }
    }
}

/// Validated post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent(String);

impl PostContent {
    /// Validate and construct a post body.
    pub fn new(value: impl Into<String>) -> Result<Self, SocialValidationError> {
        validated_content(value.into(), POST_CONTENT_MAX).map(Self)
    }

    /// Borrow the body text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Validated comment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentContent(String);

impl CommentContent {
    /// Validate and construct a comment body.
    pub fn new(value: impl Into<String>) -> Result<Self, SocialValidationError> {
        validated_content(value.into(), COMMENT_CONTENT_MAX).map(Self)
    }

    /// Borrow the body text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn validated_content(value: String, max: usize) -> Result<String, SocialValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SocialValidationError::EmptyContent);
    }
    if trimmed.chars().count() > max {
        return Err(SocialValidationError::ContentTooLong { max });
    }
    Ok(trimmed.to_owned())
}

/// A feed post.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Activity identifier.
    pub id: Uuid,
    /// Authoring user.
    pub author_id: UserId,
    /// Body text.
    pub content: PostContent,
    /// Relative path of an attached image, if any.
    pub image_path: Option<String>,
    /// Access scope.
    pub visibility: Visibility,
    /// Marks achievement posts for dashboard highlighting.
    pub is_achievement: bool,
    /// Number of times the post was shared.
    pub share_count: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Apply the feed visibility rule for `viewer` with its connection list.
    #[must_use]
    pub fn is_visible_to(&self, viewer: UserId, connections: &[UserId]) -> bool {
        match self.visibility {
            Visibility::Public => true,
            Visibility::Connections => {
                self.author_id == viewer || connections.contains(&self.author_id)
            }
            Visibility::Private => self.author_id == viewer,
        }
    }
}

/// A like on a post. At most one per `(author, target)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Like {
    /// Activity identifier.
    pub id: Uuid,
    /// Liking user.
    pub author_id: UserId,
    /// Liked post.
    pub target_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Activity identifier.
    pub id: Uuid,
    /// Commenting user.
    pub author_id: UserId,
    /// Commented post.
    pub target_id: Uuid,
    /// Body text.
    pub content: CommentContent,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A bookmark on a post. At most one per `(author, target)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    /// Activity identifier.
    pub id: Uuid,
    /// Bookmarking user.
    pub author_id: UserId,
    /// Bookmarked post.
    pub target_id: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// The unioned activity record behind the `activity_type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum SocialActivity {
    /// A feed post.
    Post(Post),
    /// A like referencing a post.
    Like(Like),
    /// A comment referencing a post.
    Comment(Comment),
    /// A bookmark referencing a post.
    Bookmark(Bookmark),
}

impl SocialActivity {
    /// The persistence tag for this variant.
    #[must_use]
    pub const fn activity_type(&self) -> ActivityType {
        match self {
            Self::Post(_) => ActivityType::Post,
            Self::Like(_) => ActivityType::Like,
            Self::Comment(_) => ActivityType::Comment,
            Self::Bookmark(_) => ActivityType::Bookmark,
        }
    }

    /// Activity identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Post(post) => post.id,
            Self::Like(like) => like.id,
            Self::Comment(comment) => comment.id,
            Self::Bookmark(bookmark) => bookmark.id,
        }
    }

    /// Authoring user.
    #[must_use]
    pub const fn author_id(&self) -> UserId {
        match self {
            Self::Post(post) => post.author_id,
            Self::Like(like) => like.author_id,
            Self::Comment(comment) => comment.author_id,
            Self::Bookmark(bookmark) => bookmark.author_id,
        }
    }

    /// Referenced post for likes, comments and bookmarks; `None` for posts.
    #[must_use]
    pub const fn target_id(&self) -> Option<Uuid> {
        match self {
            Self::Post(_) => None,
            Self::Like(like) => Some(like.target_id),
            Self::Comment(comment) => Some(comment.target_id),
            Self::Bookmark(bookmark) => Some(bookmark.target_id),
        }
    }
}

/// Persistence tag discriminating the unioned activity collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityType {
    /// Feed post.
    Post,
    /// Like referencing a post.
    Like,
    /// Comment referencing a post.
    Comment,
    /// Bookmark referencing a post.
    Bookmark,
}

impl ActivityType {
    /// The stored tag value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Bookmark => "bookmark",
        }
    }

    /// Parse a stored tag value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "post" => Some(Self::Post),
            "like" => Some(Self::Like),
            "comment" => Some(Self::Comment),
            "bookmark" => Some(Self::Bookmark),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
