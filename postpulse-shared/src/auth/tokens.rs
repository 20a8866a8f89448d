/// Access/refresh token lifecycle
///
/// [`TokenService`] wraps the signing keys and the `refresh_tokens` table:
///
/// - login issues a stateless access token plus a refresh token whose `jti`
///   is recorded as active
/// - `rotate` trades a still-active refresh token for a new access token
/// - `revoke` (logout) deactivates the refresh token's row
///
/// Expiry is enforced by the signature's `exp` claim; the stored
/// `expires_at` mirrors it for bookkeeping.
///
/// # Example
///
/// ```no_run
/// use postpulse_shared::auth::jwt::JwtSettings;
/// use postpulse_shared::auth::tokens::TokenService;
/// use postpulse_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, user: User) -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new(&JwtSettings::hs256(
///     "access-secret-key-at-least-32-bytes-long",
///     "refresh-secret-key-at-least-32-bytes-long",
/// ));
///
/// let access = tokens.issue_access(&user.email)?;
/// let refresh = tokens.issue_refresh(&pool, &user).await?;
///
/// let fresh_access = tokens.rotate(&pool, &refresh.token).await?;
/// tokens.revoke(&pool, &refresh.token).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, TimeZone, Utc};
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, info};

use super::jwt::{Claims, JwtError, JwtKeys, JwtSettings, TokenType};
use crate::models::refresh_token::RefreshToken;
use crate::models::user::User;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The presented token cannot be used
    #[error("{0}")]
    Unauthorized(String),

    /// Refresh token was never issued by this service
    #[error("Refresh token not found")]
    NotFound,

    /// Refresh token was already deactivated
    #[error("Refresh token already revoked")]
    AlreadyRevoked,

    /// Token could not be signed
    #[error("Failed to issue token: {0}")]
    Signing(JwtError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<JwtError> for TokenError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(_) | JwtError::UnsupportedAlgorithm(_) => TokenError::Signing(err),
            JwtError::Expired => TokenError::Unauthorized("Token has expired".to_string()),
            JwtError::WrongType { .. } => TokenError::Unauthorized("Invalid token type".to_string()),
            JwtError::ValidationError(_) => TokenError::Unauthorized("Invalid token".to_string()),
        }
    }
}

/// A freshly issued refresh token
#[derive(Debug, Clone)]
pub struct IssuedRefresh {
    pub token: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues, verifies, rotates and revokes tokens
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
}

impl TokenService {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            keys: JwtKeys::new(settings),
        }
    }

    /// Signs an access token for `subject` (an email)
    pub fn issue_access(&self, subject: &str) -> Result<String, TokenError> {
        let claims = Claims::access(subject, self.keys.access_ttl());
        Ok(self.keys.encode(&claims)?)
    }

    /// Signs a refresh token for `user` and records its `jti` as active
    pub async fn issue_refresh<'e, E>(&self, executor: E, user: &User) -> Result<IssuedRefresh, TokenError>
    where
        E: PgExecutor<'e>,
    {
        let claims = Claims::refresh(&user.email, self.keys.refresh_ttl());
        let token = self.keys.encode(&claims)?;

        let jti = claims
            .jti
            .clone()
            .ok_or_else(|| TokenError::Signing(JwtError::CreateError("missing jti".to_string())))?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| TokenError::Signing(JwtError::CreateError("invalid exp".to_string())))?;

        RefreshToken::create(executor, &jti, user.id, expires_at).await?;

        debug!(user_id = %user.id, "Issued refresh token");
        Ok(IssuedRefresh {
            token,
            jti,
            expires_at,
        })
    }

    /// Checks an access token and returns its subject
    pub fn verify_access(&self, token: &str) -> Result<String, TokenError> {
        let claims = self.keys.decode(token, TokenType::Access)?;
        Ok(claims.sub)
    }

    fn decode_refresh(&self, token: &str) -> Result<(Claims, String), TokenError> {
        let claims = self.keys.decode(token, TokenType::Refresh)?;

        let jti = claims
            .jti
            .clone()
            .ok_or_else(|| TokenError::Unauthorized("jti claim missing from token".to_string()))?;

        Ok((claims, jti))
    }

    /// Exchanges an active refresh token for a new access token
    ///
    /// The refresh token itself stays valid.
    pub async fn rotate(&self, pool: &PgPool, refresh_token: &str) -> Result<String, TokenError> {
        let (claims, jti) = self.decode_refresh(refresh_token)?;

        let stored = RefreshToken::find_by_jti(pool, &jti)
            .await?
            .filter(|row| row.is_active)
            .ok_or_else(|| TokenError::Unauthorized("Invalid or revoked refresh token".to_string()))?;

        let user = User::find_by_email(pool, &claims.sub)
            .await?
            .filter(|user| user.id == stored.user_id)
            .ok_or_else(|| TokenError::Unauthorized("User no longer exists".to_string()))?;

        self.issue_access(&user.email)
    }

    /// Deactivates a refresh token
    ///
    /// The row is locked while it is checked and flipped, so two concurrent
    /// logouts with the same token see one success and one `AlreadyRevoked`.
    pub async fn revoke(&self, pool: &PgPool, refresh_token: &str) -> Result<(), TokenError> {
        let (_, jti) = self.decode_refresh(refresh_token)?;

        let mut tx = pool.begin().await?;

        let stored = RefreshToken::find_by_jti_for_update(&mut *tx, &jti)
            .await?
            .ok_or(TokenError::NotFound)?;

        if !stored.is_active {
            return Err(TokenError::AlreadyRevoked);
        }

        RefreshToken::deactivate(&mut *tx, stored.id).await?;
        tx.commit().await?;

        info!(user_id = %stored.user_id, "Refresh token revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&JwtSettings::hs256(
            "unit-test-access-secret-32-bytes-long",
            "unit-test-refresh-secret-32-bytes-long",
        ))
    }

    #[test]
    fn test_access_token_yields_subject() {
        let tokens = service();
        let token = tokens.issue_access("login@example.com").unwrap();
        assert_eq!(tokens.verify_access(&token).unwrap(), "login@example.com");
    }

    #[test]
    fn test_garbage_access_token_unauthorized() {
        assert!(matches!(
            service().verify_access("not.a.jwt"),
            Err(TokenError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let tokens = service();
        let keys = JwtKeys::new(&JwtSettings::hs256(
            "unit-test-access-secret-32-bytes-long",
            "unit-test-refresh-secret-32-bytes-long",
        ));
        let refresh = keys
            .encode(&Claims::refresh("a@example.com", keys.refresh_ttl()))
            .unwrap();

        assert!(matches!(
            tokens.verify_access(&refresh),
            Err(TokenError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_refresh_without_jti_unauthorized() {
        let tokens = service();
        let keys = JwtKeys::new(&JwtSettings::hs256(
            "unit-test-access-secret-32-bytes-long",
            "unit-test-refresh-secret-32-bytes-long",
        ));
        let mut claims = Claims::refresh("a@example.com", keys.refresh_ttl());
        claims.jti = None;
        let token = keys.encode(&claims).unwrap();

        assert!(matches!(
            tokens.decode_refresh(&token),
            Err(TokenError::Unauthorized(msg)) if msg.contains("jti")
        ));
    }

    #[test]
    fn test_jwt_error_mapping() {
        assert!(matches!(
            TokenError::from(JwtError::Expired),
            TokenError::Unauthorized(_)
        ));
        assert!(matches!(
            TokenError::from(JwtError::CreateError("x".into())),
            TokenError::Signing(_)
        ));
    }
}
