/// Post management endpoints
///
/// # Endpoints
///
/// - `POST /posts` - Create a post (draft, scheduled or published)
/// - `GET /posts` - List posts, newest first
/// - `GET /posts/:post_id` - Get one post
/// - `PUT /posts/:post_id` - Partially update a post
/// - `DELETE /posts/:post_id` - Delete a post and its analytics
///
/// Every endpoint requires a bearer access token. Users only see and touch
/// their own posts; admins reach everyone's.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{AppJson, AppQuery, PostId},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use postpulse_shared::{
    auth::{
        authorization::{owner_scope, require_owner_or_admin},
        middleware::AuthContext,
    },
    models::{
        post::{NewPost, Post, PostChanges, PostFilter, PostSchedule, PostStatus},
        post_analytics::PostAnalytics,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create post request
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,

    pub content: Option<String>,

    pub scheduled_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub publish_now: bool,
}

/// List posts query parameters
#[derive(Debug, Deserialize, Validate)]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: i64,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: i64,

    pub status: Option<PostStatus>,

    /// Honored for admins only
    pub user_id: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
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

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            content: post.content,
            status: post.status,
            scheduled_at: post.scheduled_at,
            published_at: post.published_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletePostResponse {
    pub detail: String,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Post not found".to_string())
}

/// Create a post
///
/// ```text
/// POST /posts
/// { "title": "Launch", "content": "...", "scheduled_at": "2025-03-01T09:00:00Z" }
/// ```
///
/// The post and its zeroed analytics row are inserted in one transaction.
///
/// # Errors
///
/// - `400 Bad Request`: invalid title, or `publish_now` combined with `scheduled_at`
pub async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostResponse>)> {
    req.validate()?;

    let schedule = PostSchedule::for_new_post(req.publish_now, req.scheduled_at, Utc::now())?;

    let mut tx = state.db.begin().await?;

    let post = Post::create(
        &mut *tx,
        NewPost {
            user_id: auth.user_id,
            title: req.title,
            content: req.content,
            schedule,
        },
    )
    .await?;

    PostAnalytics::create_for_post(&mut *tx, post.id).await?;

    tx.commit().await?;

    tracing::info!(
        post_id = %post.id,
        user_id = %auth.user_id,
        status = %post.status,
        "Post created"
    );

    Ok((StatusCode::CREATED, Json(post.into())))
}

/// List posts
///
/// ```text
/// GET /posts?page=1&limit=10&status=draft&user_id=<uuid>
/// ```
///
/// `user_id` narrows an admin's listing to one user and is ignored for
/// everyone else.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppQuery(query): AppQuery<ListPostsQuery>,
) -> ApiResult<Json<PostListResponse>> {
    query.validate()?;

    let scope = owner_scope(&auth, query.user_id.as_deref())?;
    let filter = PostFilter {
        user_id: scope.user_id(),
        status: query.status,
    };

    let offset = (query.page - 1) * query.limit;
    let posts = Post::list(&state.db, &filter, offset, query.limit).await?;
    let total = Post::count(&state.db, &filter).await?;

    Ok(Json(PostListResponse {
        posts: posts.into_iter().map(PostResponse::from).collect(),
        total,
        page: query.page,
        limit: query.limit,
    }))
}

/// Get a post
///
/// # Errors
///
/// - `400 Bad Request`: malformed post ID
/// - `403 Forbidden`: not the owner and not an admin
/// - `404 Not Found`: no such post
pub async fn get_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PostId(post_id): PostId,
) -> ApiResult<Json<PostResponse>> {
    let post = Post::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(not_found)?;

    require_owner_or_admin(&auth, post.user_id, "view this post")?;

    Ok(Json(post.into()))
}

/// Partially update a post
///
/// ```text
/// PUT /posts/:post_id
/// { "title": "New title", "content": null, "scheduled_at": "2025-03-02T09:00:00Z" }
/// ```
///
/// Omitted fields are kept; `null` clears `content` or `scheduled_at`.
/// A new `scheduled_at` always leaves the post `scheduled`.
pub async fn update_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PostId(post_id): PostId,
    AppJson(changes): AppJson<PostChanges>,
) -> ApiResult<Json<PostResponse>> {
    changes.validate()?;

    let mut tx = state.db.begin().await?;

    let post = Post::find_by_id_for_update(&mut *tx, post_id)
        .await?
        .ok_or_else(not_found)?;

    require_owner_or_admin(&auth, post.user_id, "update this post")?;

    if changes.is_empty() {
        return Ok(Json(post.into()));
    }

    let resolved = changes.resolve(&post, Utc::now())?;
    let updated = Post::update(&mut *tx, post_id, &resolved).await?;

    tx.commit().await?;

    tracing::info!(
        post_id = %post_id,
        user_id = %auth.user_id,
        from = %post.status,
        to = %updated.status,
        "Post updated"
    );

    Ok(Json(updated.into()))
}

/// Delete a post; its analytics row goes with it
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    PostId(post_id): PostId,
) -> ApiResult<Json<DeletePostResponse>> {
    let post = Post::find_by_id(&state.db, post_id)
        .await?
        .ok_or_else(not_found)?;

    require_owner_or_admin(&auth, post.user_id, "delete this post")?;

    if !Post::delete(&state.db, post_id).await? {
        return Err(not_found());
    }

    tracing::info!(post_id = %post_id, user_id = %auth.user_id, "Post deleted");

    Ok(Json(DeletePostResponse {
        detail: "Post deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query: ListPostsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert!(query.status.is_none());
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_list_query_bounds() {
        let query: ListPostsQuery = serde_json::from_str(r#"{"page": 0}"#).unwrap();
        assert!(query.validate().is_err());

        let query: ListPostsQuery = serde_json::from_str(r#"{"limit": 101}"#).unwrap();
        assert!(query.validate().is_err());

        let query: ListPostsQuery =
            serde_json::from_str(r#"{"limit": 100, "status": "scheduled"}"#).unwrap();
        assert!(query.validate().is_ok());
        assert_eq!(query.status, Some(PostStatus::Scheduled));
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreatePostRequest = serde_json::from_str(r#"{"title": "Hello"}"#).unwrap();
        assert!(!req.publish_now);
        assert!(req.content.is_none());
        assert!(req.validate().is_ok());

        let req: CreatePostRequest = serde_json::from_str(r#"{"title": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
