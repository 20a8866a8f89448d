/// Per-post engagement counters
///
/// Every post owns at most one analytics row (`post_analytics_post_id_key`),
/// created alongside the post and lazily recreated by readers when missing.
/// Deleting the post deletes the row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE post_analytics (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     post_id UUID NOT NULL UNIQUE REFERENCES posts (id) ON DELETE CASCADE,
///     like_count INTEGER NOT NULL DEFAULT 0,
///     praise_count INTEGER NOT NULL DEFAULT 0,
///     empathy_count INTEGER NOT NULL DEFAULT 0,
///     interest_count INTEGER NOT NULL DEFAULT 0,
///     appreciation_count INTEGER NOT NULL DEFAULT 0,
///     impressions_count INTEGER NOT NULL DEFAULT 0,
///     shares_count INTEGER NOT NULL DEFAULT 0,
///     comments_count INTEGER NOT NULL DEFAULT 0,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use crate::analytics::TopMetric;
use crate::models::post::{Post, PostStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostAnalytics {
    pub id: Uuid,
    pub post_id: Uuid,
    pub like_count: i32,
    pub praise_count: i32,
    pub empathy_count: i32,
    pub interest_count: i32,
    pub appreciation_count: i32,
    pub impressions_count: i32,
    pub shares_count: i32,
    pub comments_count: i32,
    pub updated_at: DateTime<Utc>,
}

impl PostAnalytics {
    /// Sum of the five reaction counters
    pub fn total_reactions(&self) -> i64 {
        [
            self.like_count,
            self.praise_count,
            self.empathy_count,
            self.interest_count,
            self.appreciation_count,
        ]
        .iter()
        .map(|&c| i64::from(c))
        .sum()
    }

    /// Reactions plus shares and comments
    pub fn total_engagements(&self) -> i64 {
        self.total_reactions() + i64::from(self.shares_count) + i64::from(self.comments_count)
    }
}

/// Partial counter overwrite; `None` leaves a counter alone
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AnalyticsChanges {
    #[validate(range(min = 0, message = "counters cannot be negative"))]
    pub like_count: Option<i32>,
    #[validate(range(min = 0, message = "counters cannot be negative"))]
    pub praise_count: Option<i32>,
    #[validate(range(min = 0, message = "counters cannot be negative"))]
    pub empathy_count: Option<i32>,
    #[validate(range(min = 0, message = "counters cannot be negative"))]
    pub interest_count: Option<i32>,
    #[validate(range(min = 0, message = "counters cannot be negative"))]
    pub appreciation_count: Option<i32>,
    #[validate(range(min = 0, message = "counters cannot be negative"))]
    pub impressions_count: Option<i32>,
    #[validate(range(min = 0, message = "counters cannot be negative"))]
    pub shares_count: Option<i32>,
    #[validate(range(min = 0, message = "counters cannot be negative"))]
    pub comments_count: Option<i32>,
}

impl AnalyticsChanges {
    pub fn apply_to(&self, analytics: &mut PostAnalytics) {
        let fields = [
            (self.like_count, &mut analytics.like_count),
            (self.praise_count, &mut analytics.praise_count),
            (self.empathy_count, &mut analytics.empathy_count),
            (self.interest_count, &mut analytics.interest_count),
            (self.appreciation_count, &mut analytics.appreciation_count),
            (self.impressions_count, &mut analytics.impressions_count),
            (self.shares_count, &mut analytics.shares_count),
            (self.comments_count, &mut analytics.comments_count),
        ];

        for (change, counter) in fields {
            if let Some(value) = change {
                *counter = value;
            }
        }
    }
}

/// A published post joined with its analytics row, if it has one
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankedPostRow {
    #[sqlx(flatten)]
    pub post: Post,
    pub analytics_id: Option<Uuid>,
    pub like_count: Option<i32>,
    pub praise_count: Option<i32>,
    pub empathy_count: Option<i32>,
    pub interest_count: Option<i32>,
    pub appreciation_count: Option<i32>,
    pub impressions_count: Option<i32>,
    pub shares_count: Option<i32>,
    pub comments_count: Option<i32>,
    pub analytics_updated_at: Option<DateTime<Utc>>,
}

impl RankedPostRow {
    pub fn into_parts(self) -> (Post, Option<PostAnalytics>) {
        let analytics = match (self.analytics_id, self.analytics_updated_at) {
            (Some(id), Some(updated_at)) => Some(PostAnalytics {
                id,
                post_id: self.post.id,
                like_count: self.like_count.unwrap_or_default(),
                praise_count: self.praise_count.unwrap_or_default(),
                empathy_count: self.empathy_count.unwrap_or_default(),
                interest_count: self.interest_count.unwrap_or_default(),
                appreciation_count: self.appreciation_count.unwrap_or_default(),
                impressions_count: self.impressions_count.unwrap_or_default(),
                shares_count: self.shares_count.unwrap_or_default(),
                comments_count: self.comments_count.unwrap_or_default(),
                updated_at,
            }),
            _ => None,
        };

        (self.post, analytics)
    }
}

/// Post counts and counter sums over a set of posts
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct AnalyticsTotals {
    pub total_posts: i64,
    pub draft_posts: i64,
    pub scheduled_posts: i64,
    pub published_posts: i64,
    pub failed_posts: i64,
    pub likes: i64,
    pub praise: i64,
    pub empathy: i64,
    pub interest: i64,
    pub appreciation: i64,
    pub impressions: i64,
    pub shares: i64,
    pub comments: i64,
}

impl AnalyticsTotals {
    pub fn total_reactions(&self) -> i64 {
        self.likes + self.praise + self.empathy + self.interest + self.appreciation
    }

    pub fn total_engagements(&self) -> i64 {
        self.total_reactions() + self.shares + self.comments
    }
}

impl PostAnalytics {
    /// Inserts a zeroed row for a freshly created post
    pub async fn create_for_post<'e, E>(executor: E, post_id: Uuid) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, PostAnalytics>(
            r#"
            INSERT INTO post_analytics (post_id)
            VALUES ($1)
            RETURNING id, post_id, like_count, praise_count, empathy_count, interest_count,
                      appreciation_count, impressions_count, shares_count, comments_count,
                      updated_at
            "#,
        )
        .bind(post_id)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_post<'e, E>(executor: E, post_id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, PostAnalytics>(
            r#"
            SELECT id, post_id, like_count, praise_count, empathy_count, interest_count,
                   appreciation_count, impressions_count, shares_count, comments_count,
                   updated_at
            FROM post_analytics
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(executor)
        .await
    }

    /// Returns the post's row, inserting a zeroed one if it is missing
    ///
    /// The no-op `DO UPDATE` makes the statement return the existing row when
    /// another reader inserted it first.
    pub async fn get_or_create<'e, E>(executor: E, post_id: Uuid) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, PostAnalytics>(
            r#"
            INSERT INTO post_analytics (post_id)
            VALUES ($1)
            ON CONFLICT (post_id) DO UPDATE SET post_id = EXCLUDED.post_id
            RETURNING id, post_id, like_count, praise_count, empathy_count, interest_count,
                      appreciation_count, impressions_count, shares_count, comments_count,
                      updated_at
            "#,
        )
        .bind(post_id)
        .fetch_one(executor)
        .await
    }

    /// Locks the post's row for the rest of the transaction, creating it if missing
    pub async fn lock_or_create(conn: &mut PgConnection, post_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO post_analytics (post_id)
            VALUES ($1)
            ON CONFLICT (post_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

        sqlx::query_as::<_, PostAnalytics>(
            r#"
            SELECT id, post_id, like_count, praise_count, empathy_count, interest_count,
                   appreciation_count, impressions_count, shares_count, comments_count,
                   updated_at
            FROM post_analytics
            WHERE post_id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_one(&mut *conn)
        .await
    }

    /// Writes every counter back and bumps `updated_at`
    pub async fn save_counters<'e, E>(&self, executor: E) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, PostAnalytics>(
            r#"
            UPDATE post_analytics
            SET like_count = $2,
                praise_count = $3,
                empathy_count = $4,
                interest_count = $5,
                appreciation_count = $6,
                impressions_count = $7,
                shares_count = $8,
                comments_count = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, post_id, like_count, praise_count, empathy_count, interest_count,
                      appreciation_count, impressions_count, shares_count, comments_count,
                      updated_at
            "#,
        )
        .bind(self.id)
        .bind(self.like_count)
        .bind(self.praise_count)
        .bind(self.empathy_count)
        .bind(self.interest_count)
        .bind(self.appreciation_count)
        .bind(self.impressions_count)
        .bind(self.shares_count)
        .bind(self.comments_count)
        .fetch_one(executor)
        .await
    }

    /// Published posts ranked by `metric`, highest first
    ///
    /// Posts without an analytics row rank as zero.
    pub async fn top_posts<'e, E>(
        executor: E,
        user_id: Option<Uuid>,
        metric: TopMetric,
        limit: i64,
    ) -> Result<Vec<RankedPostRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query = QueryBuilder::<Postgres>::new(
            r#"
            SELECT p.id, p.user_id, p.title, p.content, p.status, p.scheduled_at,
                   p.published_at, p.created_at, p.updated_at,
                   a.id AS analytics_id, a.like_count, a.praise_count, a.empathy_count,
                   a.interest_count, a.appreciation_count, a.impressions_count,
                   a.shares_count, a.comments_count, a.updated_at AS analytics_updated_at
            FROM posts p
            LEFT JOIN post_analytics a ON a.post_id = p.id
            WHERE p.status = "#,
        );
        query.push_bind(PostStatus::Published);

        if let Some(user_id) = user_id {
            query.push(" AND p.user_id = ").push_bind(user_id);
        }

        query
            .push(" ORDER BY ")
            .push(metric.order_expression())
            .push(" DESC LIMIT ")
            .push_bind(limit);

        query.build_query_as::<RankedPostRow>().fetch_all(executor).await
    }

    /// Post counts per status and counter sums, for one user or everyone
    pub async fn totals<'e, E>(executor: E, user_id: Option<Uuid>) -> Result<AnalyticsTotals, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, AnalyticsTotals>(
            r#"
            SELECT
                COUNT(p.id) AS total_posts,
                COUNT(p.id) FILTER (WHERE p.status = 'draft') AS draft_posts,
                COUNT(p.id) FILTER (WHERE p.status = 'scheduled') AS scheduled_posts,
                COUNT(p.id) FILTER (WHERE p.status = 'published') AS published_posts,
                COUNT(p.id) FILTER (WHERE p.status = 'failed') AS failed_posts,
                COALESCE(SUM(a.like_count), 0)::BIGINT AS likes,
                COALESCE(SUM(a.praise_count), 0)::BIGINT AS praise,
                COALESCE(SUM(a.empathy_count), 0)::BIGINT AS empathy,
                COALESCE(SUM(a.interest_count), 0)::BIGINT AS interest,
                COALESCE(SUM(a.appreciation_count), 0)::BIGINT AS appreciation,
                COALESCE(SUM(a.impressions_count), 0)::BIGINT AS impressions,
                COALESCE(SUM(a.shares_count), 0)::BIGINT AS shares,
                COALESCE(SUM(a.comments_count), 0)::BIGINT AS comments
            FROM posts p
            LEFT JOIN post_analytics a ON a.post_id = p.id
            WHERE $1::UUID IS NULL OR p.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }
}
