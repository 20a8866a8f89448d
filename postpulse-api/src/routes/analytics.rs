/// Analytics endpoints
///
/// # Endpoints
///
/// - `GET /analytics/posts/:post_id` - Counters of one post
/// - `PUT /analytics/posts/:post_id` - Overwrite some counters
/// - `GET /analytics/posts/:post_id/graph` - Daily ramp up to the current totals
/// - `GET /analytics/posts/top` - Published posts ranked by a metric
/// - `GET /analytics/summary` - Post counts and counter sums

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppQuery, PostId},
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use postpulse_shared::{
    analytics::{synthesize_graph, GraphPoint, GraphTotals, TopMetric},
    auth::{
        authorization::{owner_scope, require_owner_or_admin},
        middleware::AuthContext,
    },
    models::{
        post::Post,
        post_analytics::{AnalyticsChanges, PostAnalytics},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::posts::PostResponse;

#[derive(Debug, Serialize, Deserialize)]
pub struct PostAnalyticsResponse {
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
    pub total_reactions: i64,
    pub total_engagements: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<PostAnalytics> for PostAnalyticsResponse {
    fn from(analytics: PostAnalytics) -> Self {
        let total_reactions = analytics.total_reactions();
        let total_engagements = analytics.total_engagements();

        Self {
            id: analytics.id,
            post_id: analytics.post_id,
            like_count: analytics.like_count,
            praise_count: analytics.praise_count,
            empathy_count: analytics.empathy_count,
            interest_count: analytics.interest_count,
            appreciation_count: analytics.appreciation_count,
            impressions_count: analytics.impressions_count,
            shares_count: analytics.shares_count,
            comments_count: analytics.comments_count,
            total_reactions,
            total_engagements,
            updated_at: analytics.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TopPostsQuery {
    #[serde(default)]
    pub metric: TopMetric,

    #[serde(default = "default_top_limit")]
    #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
    pub limit: i64,

    pub user_id: Option<String>,
}

fn default_top_limit() -> i64 {
    5
}

/// A ranked post with its counters; `analytics` is null when no row exists
#[derive(Debug, Serialize, Deserialize)]
pub struct RankedPost {
    #[serde(flatten)]
    pub post: PostResponse,
    pub analytics: Option<PostAnalyticsResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TopPostsResponse {
    pub posts: Vec<RankedPost>,
    pub metric: TopMetric,
    pub limit: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GraphQuery {
    #[serde(default = "default_graph_days")]
    #[validate(range(min = 1, max = 365, message = "days must be between 1 and 365"))]
    pub days: u32,
}

fn default_graph_days() -> u32 {
    30
}

#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub post_id: Uuid,
    pub post_title: String,
    pub data: Vec<GraphPoint>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Honored for admins only
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub user_id: Uuid,
    pub user_name: String,
    /// The user the figures are restricted to; null for an all-users summary
    pub scope_user_id: Option<Uuid>,
    pub posts_summary: PostsSummary,
    pub engagement_summary: EngagementSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostsSummary {
    pub total_posts: i64,
    pub published_posts: i64,
    pub scheduled_posts: i64,
    pub draft_posts: i64,
    pub failed_posts: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EngagementSummary {
    pub total_reactions: i64,
    pub total_engagements: i64,
    pub total_impressions: i64,
    pub total_shares: i64,
    pub total_comments: i64,
    pub breakdown: ReactionBreakdown,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionBreakdown {
    pub likes: i64,
    pub praise: i64,
    pub empathy: i64,
    pub interest: i64,
    pub appreciation: i64,
}

/// Loads a post the caller may act on, or fails with 404/403
async fn authorized_post(
    state: &AppState,
    auth: &AuthContext,
    post_id: Uuid,
    action: &'static str,
) -> ApiResult<Post> {
    let post = Post::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    require_owner_or_admin(auth, post.user_id, action)?;
    Ok(post)
}

/// Get a post's counters, creating a zeroed row if it has none
pub async fn get_post_analytics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PostId(post_id): PostId,
) -> ApiResult<Json<PostAnalyticsResponse>> {
    authorized_post(&state, &auth, post_id, "view this post's analytics").await?;

    let analytics = PostAnalytics::get_or_create(&state.db, post_id).await?;

    Ok(Json(analytics.into()))
}

/// Overwrite some of a post's counters
///
/// ```text
/// PUT /analytics/posts/:post_id
/// { "like_count": 12, "shares_count": 3 }
/// ```
///
/// Omitted or `null` counters keep their value. The row is locked for the
/// read-merge-write.
///
/// # Errors
///
/// - `400 Bad Request`: a negative counter
pub async fn update_post_analytics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PostId(post_id): PostId,
    AppJson(changes): AppJson<AnalyticsChanges>,
) -> ApiResult<Json<PostAnalyticsResponse>> {
    changes.validate()?;

    authorized_post(&state, &auth, post_id, "update this post's analytics").await?;

    let mut tx = state.db.begin().await?;

    let mut analytics = PostAnalytics::lock_or_create(&mut *tx, post_id).await?;
    changes.apply_to(&mut analytics);
    let saved = analytics.save_counters(&mut *tx).await?;

    tx.commit().await?;

    tracing::info!(
        post_id = %post_id,
        user_id = %auth.user_id,
        total_engagements = saved.total_engagements(),
        "Analytics updated"
    );

    Ok(Json(saved.into()))
}

/// Rank published posts
///
/// ```text
/// GET /analytics/posts/top?metric=reactions&limit=5&user_id=<uuid>
/// ```
pub async fn top_posts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<TopPostsQuery>,
) -> ApiResult<Json<TopPostsResponse>> {
    query.validate()?;

    let scope = owner_scope(&auth, query.user_id.as_deref())?;

    let rows = PostAnalytics::top_posts(&state.db, scope.user_id(), query.metric, query.limit).await?;

    let posts = rows
        .into_iter()
        .map(|row| {
            let (post, analytics) = row.into_parts();
            RankedPost {
                post: post.into(),
                analytics: analytics.map(PostAnalyticsResponse::from),
            }
        })
        .collect();

    Ok(Json(TopPostsResponse {
        posts,
        metric: query.metric,
        limit: query.limit,
    }))
}

/// Daily series for the last `days` days, ending today (UTC)
///
/// A post without an analytics row gets an all-zero series; the row is not
/// created here.
pub async fn post_graph(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PostId(post_id): PostId,
    AppQuery(query): AppQuery<GraphQuery>,
) -> ApiResult<Json<GraphResponse>> {
    query.validate()?;

    let post = authorized_post(&state, &auth, post_id, "view this post's analytics").await?;

    let totals = PostAnalytics::find_by_post(&state.db, post_id)
        .await?
        .as_ref()
        .map(GraphTotals::from)
        .unwrap_or_default();

    let data = synthesize_graph(&totals, query.days, Utc::now().date_naive());

    Ok(Json(GraphResponse {
        post_id,
        post_title: post.title,
        data,
    }))
}

/// Post counts and counter sums
///
/// Covers the caller's own posts, or for admins every post (or one user's
/// with `?user_id=`).
pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<SummaryQuery>,
) -> ApiResult<Json<SummaryResponse>> {
    let scope = owner_scope(&auth, query.user_id.as_deref())?;
    let totals = PostAnalytics::totals(&state.db, scope.user_id()).await?;

    Ok(Json(SummaryResponse {
        user_id: auth.user_id,
        user_name: auth.name,
        scope_user_id: scope.user_id(),
        posts_summary: PostsSummary {
            total_posts: totals.total_posts,
            published_posts: totals.published_posts,
            scheduled_posts: totals.scheduled_posts,
            draft_posts: totals.draft_posts,
            failed_posts: totals.failed_posts,
        },
        engagement_summary: EngagementSummary {
            total_reactions: totals.total_reactions(),
            total_engagements: totals.total_engagements(),
            total_impressions: totals.impressions,
            total_shares: totals.shares,
            total_comments: totals.comments,
            breakdown: ReactionBreakdown {
                likes: totals.likes,
                praise: totals.praise,
                empathy: totals.empathy,
                interest: totals.interest,
                appreciation: totals.appreciation,
            },
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_query_defaults() {
        let query: TopPostsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.metric, TopMetric::Engagement);
        assert_eq!(query.limit, 5);
        assert!(query.validate().is_ok());

        let query: TopPostsQuery = serde_json::from_str(r#"{"limit": 51}"#).unwrap();
        assert!(query.validate().is_err());

        assert!(serde_json::from_str::<TopPostsQuery>(r#"{"metric": "likes"}"#).is_err());
    }

    #[test]
    fn test_graph_query_bounds() {
        let query: GraphQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.days, 30);

        let query: GraphQuery = serde_json::from_str(r#"{"days": 0}"#).unwrap();
        assert!(query.validate().is_err());

        let query: GraphQuery = serde_json::from_str(r#"{"days": 366}"#).unwrap();
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_analytics_response_totals() {
        let analytics = PostAnalytics {
            id: Uuid::new_v4(),
            post_id: Uuid::new_v4(),
            like_count: 5,
            praise_count: 4,
            empathy_count: 3,
            interest_count: 2,
            appreciation_count: 1,
            impressions_count: 100,
            shares_count: 7,
            comments_count: 8,
            updated_at: Utc::now(),
        };

        let response = PostAnalyticsResponse::from(analytics);
        assert_eq!(response.total_reactions, 15);
        assert_eq!(response.total_engagements, 30);
    }
}
