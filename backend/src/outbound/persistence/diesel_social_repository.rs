//! PostgreSQL-backed social activity repository.
//!
//! One table holds all four activity variants behind the `activity_type`
//! tag; this adapter is the only place the stringly-typed tag exists. The
//! like/bookmark uniqueness invariant is enforced by partial unique indexes,
//! so a duplicate reaction surfaces as a unique violation rather than a
//! racy check-then-insert.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{RepositoryError, SocialActivityRepository};
use crate::domain::social::{
    ActivityType, Bookmark, Comment, CommentContent, Like, Post, PostContent, SocialActivity,
    Visibility,
};
use crate::domain::user::UserId;

use super::diesel_error_mapping::{map_insert_error, map_pool_error, map_query_error};
use super::models::SocialActivityRow;
use super::pool::DbPool;
use super::schema::social_activities;

fn row_to_activity(row: SocialActivityRow) -> Result<SocialActivity, RepositoryError> {
    let SocialActivityRow {
        id,
        activity_type,
        author_id,
        target_id,
        content,
        image_path,
        visibility,
        is_achievement,
        share_count,
        created_at,
    } = row;

    let author_id = UserId::from_uuid(author_id);
    let tag = ActivityType::parse(&activity_type)
        .ok_or_else(|| RepositoryError::query(format!("unknown activity type: {activity_type}")))?;

    let require_target = |target: Option<Uuid>| {
        target.ok_or_else(|| RepositoryError::query(format!("{tag} row missing target_id")))
    };

    match tag {
        ActivityType::Post => {
            let content = content
                .ok_or_else(|| RepositoryError::query("post row missing content"))
                .and_then(|raw| {
                    PostContent::new(raw).map_err(|err| RepositoryError::query(err.to_string()))
                })?;
            let visibility = Visibility::parse(visibility.as_deref())
                .map_err(|err| RepositoryError::query(err.to_string()))?;
            Ok(SocialActivity::Post(Post {
                id,
                author_id,
                content,
                image_path,
                visibility,
                is_achievement,
                share_count,
                created_at,
            }))
        }
        ActivityType::Like => Ok(SocialActivity::Like(Like {
            id,
            author_id,
            target_id: require_target(target_id)?,
            created_at,
        })),
        ActivityType::Comment => {
            let content = content
                .ok_or_else(|| RepositoryError::query("comment row missing content"))
                .and_then(|raw| {
                    CommentContent::new(raw).map_err(|err| RepositoryError::query(err.to_string()))
                })?;
            Ok(SocialActivity::Comment(Comment {
                id,
                author_id,
                target_id: require_target(target_id)?,
                content,
                created_at,
            }))
        }
        ActivityType::Bookmark => Ok(SocialActivity::Bookmark(Bookmark {
            id,
            author_id,
            target_id: require_target(target_id)?,
            created_at,
        })),
    }
}

fn activity_to_row(activity: &SocialActivity) -> SocialActivityRow {
    let base = SocialActivityRow {
        id: activity.id(),
        activity_type: activity.activity_type().as_str().to_owned(),
        author_id: *activity.author_id().as_uuid(),
        target_id: activity.target_id(),
        content: None,
        image_path: None,
        visibility: None,
        is_achievement: false,
        share_count: 0,
        created_at: match activity {
            SocialActivity::Post(post) => post.created_at,
            SocialActivity::Like(like) => like.created_at,
            SocialActivity::Comment(comment) => comment.created_at,
            SocialActivity::Bookmark(bookmark) => bookmark.created_at,
        },
    };

    match activity {
        SocialActivity::Post(post) => SocialActivityRow {
            content: Some(post.content.as_str().to_owned()),
            image_path: post.image_path.clone(),
            visibility: Some(post.visibility.as_str().to_owned()),
            is_achievement: post.is_achievement,
            share_count: post.share_count,
            ..base
        },
        SocialActivity::Comment(comment) => SocialActivityRow {
            content: Some(comment.content.as_str().to_owned()),
            ..base
        },
        SocialActivity::Like(_) | SocialActivity::Bookmark(_) => base,
    }
}

fn row_to_post(row: SocialActivityRow) -> Result<Post, RepositoryError> {
    match row_to_activity(row)? {
        SocialActivity::Post(post) => Ok(post),
        other => Err(RepositoryError::query(format!(
            "expected a post row, found {}",
            other.activity_type()
        ))),
    }
}

/// Diesel-backed implementation of the social activity repository port.
#[derive(Clone)]
pub struct DieselSocialActivityRepository {
    pool: DbPool,
}

impl DieselSocialActivityRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SocialActivityRepository for DieselSocialActivityRepository {
    async fn insert(&self, activity: &SocialActivity) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let entity = match activity.activity_type() {
            ActivityType::Like => "like",
            ActivityType::Bookmark => "bookmark",
            ActivityType::Post | ActivityType::Comment => "activity",
        };
        diesel::insert_into(social_activities::table)
            .values(activity_to_row(activity))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_insert_error(err, entity))
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = social_activities::table
            .filter(
                social_activities::id
                    .eq(id)
                    .and(social_activities::activity_type.eq(ActivityType::Post.as_str())),
            )
            .select(SocialActivityRow::as_select())
            .first::<SocialActivityRow>(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;
        row.map(row_to_post).transpose()
    }

    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SocialActivityRow> = social_activities::table
            .filter(social_activities::activity_type.eq(ActivityType::Post.as_str()))
            .order(social_activities::created_at.desc())
            .select(SocialActivityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows.into_iter().map(row_to_post).collect()
    }

    async fn activities_for_target(
        &self,
        target: Uuid,
    ) -> Result<Vec<SocialActivity>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<SocialActivityRow> = social_activities::table
            .filter(social_activities::target_id.eq(target))
            .select(SocialActivityRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        rows.into_iter().map(row_to_activity).collect()
    }

    async fn delete_reaction(
        &self,
        target: Uuid,
        author: UserId,
        kind: ActivityType,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            social_activities::table.filter(
                social_activities::target_id
                    .eq(target)
                    .and(social_activities::author_id.eq(author.as_uuid()))
                    .and(social_activities::activity_type.eq(kind.as_str())),
            ),
        )
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(removed > 0)
    }

    async fn increment_share_count(&self, post: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(
            social_activities::table.filter(
                social_activities::id
                    .eq(post)
                    .and(social_activities::activity_type.eq(ActivityType::Post.as_str())),
            ),
        )
        .set(social_activities::share_count.eq(social_activities::share_count + 1))
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn set_post_image(&self, post: Uuid, path: &str) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = diesel::update(
            social_activities::table.filter(
                social_activities::id
                    .eq(post)
                    .and(social_activities::activity_type.eq(ActivityType::Post.as_str())),
            ),
        )
        .set(social_activities::image_path.eq(path))
        .execute(&mut conn)
        .await
        .map_err(map_query_error)?;
        Ok(touched > 0)
    }

    async fn delete_post_cascade(&self, post: Uuid) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<bool, diesel::result::Error, _>(|conn| {
            async move {
                let removed = diesel::delete(
                    social_activities::table.filter(
                        social_activities::id
                            .eq(post)
                            .and(social_activities::activity_type.eq(ActivityType::Post.as_str())),
                    ),
                )
                .execute(conn)
                .await?;
                if removed == 0 {
                    return Ok(false);
                }
                diesel::delete(
                    social_activities::table.filter(social_activities::target_id.eq(post)),
                )
                .execute(conn)
                .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_query_error)
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion edge cases for the unioned table.
    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn post_row() -> SocialActivityRow {
        SocialActivityRow {
            id: Uuid::new_v4(),
            activity_type: "post".into(),
            author_id: Uuid::new_v4(),
            target_id: None,
            content: Some("hello".into()),
            image_path: None,
            visibility: Some("connections".into()),
            is_achievement: false,
            share_count: 3,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn post_rows_convert_with_visibility(post_row: SocialActivityRow) {
        let SocialActivity::Post(post) = row_to_activity(post_row).expect("valid row") else {
            panic!("expected a post variant");
        };
        assert_eq!(post.visibility, Visibility::Connections);
        assert_eq!(post.share_count, 3);
    }

    #[rstest]
    fn null_visibility_means_public(mut post_row: SocialActivityRow) {
        post_row.visibility = None;
        let SocialActivity::Post(post) = row_to_activity(post_row).expect("valid row") else {
            panic!("expected a post variant");
        };
        assert_eq!(post.visibility, Visibility::Public);
    }

    #[rstest]
    fn likes_without_targets_fail_conversion(mut post_row: SocialActivityRow) {
        post_row.activity_type = "like".into();
        post_row.target_id = None;
        let err = row_to_activity(post_row).expect_err("target is required");
        assert!(matches!(err, RepositoryError::Query { .. }));
    }

    #[rstest]
    fn unknown_tags_fail_conversion(mut post_row: SocialActivityRow) {
        post_row.activity_type = "share".into();
        let err = row_to_activity(post_row).expect_err("unknown tag must fail");
        assert!(err.to_string().contains("unknown activity type"));
    }

    #[rstest]
    fn activities_round_trip_through_rows(post_row: SocialActivityRow) {
        let activity = row_to_activity(post_row).expect("valid row");
        let row = activity_to_row(&activity);
        let again = row_to_activity(row).expect("round trip converts");
        assert_eq!(activity, again);
    }
}
