/// Posts and their publishing lifecycle
///
/// A post starts as `draft`, may be `scheduled` for a future instant, and ends
/// up `published` either immediately, by a manual status change, or when the
/// publish worker sweeps it. `failed` exists for manual use only.
///
/// Status transitions are decided by pure functions ([`PostSchedule::for_new_post`]
/// and [`PostChanges::resolve`]) so the rules can be checked without a
/// database. The query functions below only persist what those return.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE posts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users (id),
///     title VARCHAR(200) NOT NULL,
///     content TEXT,
///     status post_status NOT NULL DEFAULT 'draft',
///     scheduled_at TIMESTAMPTZ,
///     published_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

/// Publishing state of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Cannot schedule and publish immediately at the same time")]
    PublishNowWithSchedule,

    #[error("Scheduled time must be in the future")]
    ScheduleInPast,

    #[error("A post can only be marked scheduled with a future scheduled_at")]
    MissingSchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub status: PostStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The status-related columns of a post, kept consistent together
///
/// `Scheduled` always carries a `scheduled_at`; `Published` always carries a
/// `published_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostSchedule {
    pub status: PostStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl PostSchedule {
    fn of(post: &Post) -> Self {
        Self {
            status: post.status,
            scheduled_at: post.scheduled_at,
            published_at: post.published_at,
        }
    }

    /// Initial state of a newly created post
    ///
    /// `publish_now` publishes at `now`; a future `scheduled_at` schedules;
    /// anything else (including a past `scheduled_at`, which is dropped) is a
    /// draft.
    pub fn for_new_post(
        publish_now: bool,
        scheduled_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, LifecycleError> {
        match (publish_now, scheduled_at) {
            (true, Some(_)) => Err(LifecycleError::PublishNowWithSchedule),
            (true, None) => Ok(Self {
                status: PostStatus::Published,
                scheduled_at: None,
                published_at: Some(now),
            }),
            (false, Some(at)) if at > now => Ok(Self {
                status: PostStatus::Scheduled,
                scheduled_at: Some(at),
                published_at: None,
            }),
            (false, _) => Ok(Self {
                status: PostStatus::Draft,
                scheduled_at: None,
                published_at: None,
            }),
        }
    }

    fn set_status(&mut self, status: PostStatus, now: DateTime<Utc>) -> Result<(), LifecycleError> {
        match status {
            PostStatus::Published => {
                self.published_at.get_or_insert(now);
            }
            PostStatus::Scheduled => {
                if !self.scheduled_at.is_some_and(|at| at > now) {
                    return Err(LifecycleError::MissingSchedule);
                }
            }
            PostStatus::Draft | PostStatus::Failed => {}
        }

        self.status = status;
        Ok(())
    }
}

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub schedule: PostSchedule,
}

/// Partial update of a post
///
/// Absent fields are left alone. For `content` and `scheduled_at` an explicit
/// JSON `null` (`Some(None)`) clears the column.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostChanges {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub content: Option<Option<String>>,

    pub status: Option<PostStatus>,

    #[serde(default, deserialize_with = "present")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
}

/// Maps a present field (even `null`) to `Some`, leaving absence to `#[serde(default)]`
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Full column set to write back after merging [`PostChanges`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPost {
    pub title: String,
    pub content: Option<String>,
    pub schedule: PostSchedule,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.status.is_none()
            && self.scheduled_at.is_none()
    }

    /// Merges the changes onto `post`
    ///
    /// A new `scheduled_at` must lie after `now` and always yields
    /// `Scheduled`, whatever `status` says. Clearing `scheduled_at` on a
    /// scheduled post without naming a status turns it back into a draft.
    pub fn resolve(&self, post: &Post, now: DateTime<Utc>) -> Result<ResolvedPost, LifecycleError> {
        let mut schedule = PostSchedule::of(post);

        match self.scheduled_at {
            Some(Some(at)) => {
                if at <= now {
                    return Err(LifecycleError::ScheduleInPast);
                }
                schedule.scheduled_at = Some(at);
                schedule.status = PostStatus::Scheduled;
            }
            Some(None) => {
                schedule.scheduled_at = None;
                match self.status {
                    Some(status) => schedule.set_status(status, now)?,
                    None if schedule.status == PostStatus::Scheduled => {
                        schedule.status = PostStatus::Draft;
                    }
                    None => {}
                }
            }
            None => {
                if let Some(status) = self.status {
                    schedule.set_status(status, now)?;
                }
            }
        }

        Ok(ResolvedPost {
            title: self.title.clone().unwrap_or_else(|| post.title.clone()),
            content: match &self.content {
                Some(content) => content.clone(),
                None => post.content.clone(),
            },
            schedule,
        })
    }
}

/// Listing filter
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    /// Restrict to one owner; `None` means every user
    pub user_id: Option<Uuid>,
    pub status: Option<PostStatus>,
}

impl PostFilter {
    fn push_conditions(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE TRUE");

        if let Some(user_id) = self.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }

        if let Some(status) = self.status {
            query.push(" AND status = ").push_bind(status);
        }
    }
}

const POST_COLUMNS: &str =
    "id, user_id, title, content, status, scheduled_at, published_at, created_at, updated_at";

impl Post {
    pub async fn create<'e, E>(executor: E, data: NewPost) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (user_id, title, content, status, scheduled_at, published_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, content, status, scheduled_at, published_at,
                      created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.content)
        .bind(data.schedule.status)
        .bind(data.schedule.scheduled_at)
        .bind(data.schedule.published_at)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, title, content, status, scheduled_at, published_at,
                   created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Same as [`Post::find_by_id`] but holds a row lock until the transaction ends
    pub async fn find_by_id_for_update<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, title, content, status, scheduled_at, published_at,
                   created_at, updated_at
            FROM posts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// One page of posts, newest first
    pub async fn list<'e, E>(
        executor: E,
        filter: &PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(POST_COLUMNS).push(" FROM posts");
        filter.push_conditions(&mut query);
        query
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        query.build_query_as::<Post>().fetch_all(executor).await
    }

    /// Number of posts matching the filter, ignoring paging
    pub async fn count<'e, E>(executor: E, filter: &PostFilter) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        filter.push_conditions(&mut query);

        query.build_query_scalar::<i64>().fetch_one(executor).await
    }

    /// Writes back a merged post
    pub async fn update<'e, E>(executor: E, id: Uuid, data: &ResolvedPost) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $2,
                content = $3,
                status = $4,
                scheduled_at = $5,
                published_at = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, title, content, status, scheduled_at, published_at,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.schedule.status)
        .bind(data.schedule.scheduled_at)
        .bind(data.schedule.published_at)
        .fetch_one(executor)
        .await
    }

    /// Deletes a post (its analytics row goes with it)
    ///
    /// Returns `false` if no such post existed.
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Publishes every scheduled post due at `now`
    ///
    /// All rows in the batch get the same `published_at`. Posts that are
    /// already published never match, so running this twice is harmless.
    pub async fn publish_due<'e, E>(executor: E, now: DateTime<Utc>) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET status = 'published',
                published_at = $1,
                updated_at = NOW()
            WHERE status = 'scheduled'
              AND scheduled_at <= $1
            RETURNING id, user_id, title, content, status, scheduled_at, published_at,
                      created_at, updated_at
            "#,
        )
        .bind(now)
        .fetch_all(executor)
        .await
    }
}
