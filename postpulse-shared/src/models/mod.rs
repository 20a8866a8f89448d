/// Database models
///
/// Each model owns its queries as associated functions taking any
/// [`sqlx::PgExecutor`], so the same call works on the pool or inside a
/// transaction (`&mut *tx`).
///
/// - [`user`]: accounts and roles
/// - [`post`]: posts and the status lifecycle
/// - [`post_analytics`]: per-post counters, rankings and totals
/// - [`refresh_token`]: issued refresh-token ids
///
/// # Example
///
/// ```no_run
/// use postpulse_shared::models::post::{NewPost, Post, PostSchedule};
/// use postpulse_shared::models::post_analytics::PostAnalytics;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = pool.begin().await?;
///
/// let post = Post::create(&mut *tx, NewPost {
///     user_id,
///     title: "Hello".to_string(),
///     content: None,
///     schedule: PostSchedule::for_new_post(false, None, chrono::Utc::now())?,
/// })
/// .await?;
/// PostAnalytics::create_for_post(&mut *tx, post.id).await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod post;
pub mod post_analytics;
pub mod refresh_token;
pub mod user;
