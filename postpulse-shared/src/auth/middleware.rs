/// Bearer-token authentication
///
/// Resolves an `Authorization: Bearer <access token>` header to the calling
/// user. The user row is loaded fresh on every request, so a deleted account
/// or a role change takes effect immediately. The API server wraps
/// [`authenticate_bearer`] in an axum middleware that stores the resulting
/// [`AuthContext`] as a request extension.
///
/// # Example
///
/// ```no_run
/// use axum::Extension;
/// use postpulse_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.name)
/// }
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::tokens::{TokenError, TokenService};
use crate::models::user::{User, UserRole};

/// The authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<User> for AuthContext {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),

    /// Token is valid but names no existing user
    #[error("User data missing")]
    UnknownPrincipal,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Database(e) => AuthError::DatabaseError(e.to_string()),
            other => AuthError::InvalidToken(other.to_string()),
        }
    }
}

/// Pulls the token out of an `Authorization: Bearer ...` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Invalid authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::InvalidFormat("Expected Bearer token".to_string()));
    }

    Ok(token.trim())
}

/// Verifies the bearer token and loads the caller
pub async fn authenticate_bearer(
    pool: &PgPool,
    tokens: &TokenService,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let email = tokens.verify_access(token)?;

    let user = User::find_by_email(pool, &email)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::UnknownPrincipal)?;

    Ok(AuthContext::from(user))
}
