/// Issued refresh tokens
///
/// Only the `jti` of a refresh token is stored, never the token itself. Rows
/// are flipped inactive on logout and kept for audit.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE refresh_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     jti VARCHAR(64) NOT NULL UNIQUE,
///     user_id UUID NOT NULL REFERENCES users (id),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub jti: String,
    pub user_id: Uuid,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub async fn create<'e, E>(
        executor: E,
        jti: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, jti, user_id, is_active, expires_at, created_at
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_jti<'e, E>(executor: E, jti: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, jti, user_id, is_active, expires_at, created_at
            FROM refresh_tokens
            WHERE jti = $1
            "#,
        )
        .bind(jti)
        .fetch_optional(executor)
        .await
    }

    /// Row-locking lookup, for use inside a transaction
    pub async fn find_by_jti_for_update<'e, E>(executor: E, jti: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, jti, user_id, is_active, expires_at, created_at
            FROM refresh_tokens
            WHERE jti = $1
            FOR UPDATE
            "#,
        )
        .bind(jti)
        .fetch_optional(executor)
        .await
    }

    pub async fn deactivate<'e, E>(executor: E, id: Uuid) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE refresh_tokens SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
