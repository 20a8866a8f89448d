/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use postpulse_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = postpulse_api::app::build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::require_auth, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use postpulse_shared::auth::tokens::TokenService;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token signing and refresh-token bookkeeping
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let tokens = TokenService::new(&config.jwt);
        Self {
            db,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }
}

/// Builds the complete router
///
/// ```text
/// /
/// ├── GET  /health
/// ├── POST /signup
/// ├── POST /login
/// ├── POST /refresh
/// ├── POST /logout
/// ├── POST /admin/signup                      (admin)
/// ├── /posts                                  (authenticated)
/// │   ├── POST   /
/// │   ├── GET    /
/// │   └── GET | PUT | DELETE /:post_id
/// └── /analytics                              (authenticated)
///     ├── GET        /summary
///     ├── GET        /posts/top
///     ├── GET | PUT  /posts/:post_id
///     └── GET        /posts/:post_id/graph
/// ```
///
/// `/analytics/posts/top` is a static segment and always wins over
/// `/analytics/posts/:post_id`.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout));

    let admin_routes = Router::new().route("/admin/signup", post(routes::auth::admin_signup));

    let post_routes = Router::new()
        .route(
            "/",
            post(routes::posts::create_post).get(routes::posts::list_posts),
        )
        .route(
            "/:post_id",
            get(routes::posts::get_post)
                .put(routes::posts::update_post)
                .delete(routes::posts::delete_post),
        );

    let analytics_routes = Router::new()
        .route("/summary", get(routes::analytics::summary))
        .route("/posts/top", get(routes::analytics::top_posts))
        .route(
            "/posts/:post_id",
            get(routes::analytics::get_post_analytics).put(routes::analytics::update_post_analytics),
        )
        .route("/posts/:post_id/graph", get(routes::analytics::post_graph));

    let protected_routes = Router::new()
        .merge(admin_routes)
        .nest("/posts", post_routes)
        .nest("/analytics", analytics_routes)
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
