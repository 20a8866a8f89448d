//! # Seed the first admin
//!
//! Admins can only be created by other admins, so a fresh deployment needs
//! one created out of band. Applies pending migrations, then inserts an admin
//! unless one already exists.
//!
//! ## Usage
//!
//! ```bash
//! ADMIN_PASSWORD=... cargo run -p postpulse-api --bin seed-admin
//! ```
//!
//! `ADMIN_NAME` defaults to `Super Admin` and `ADMIN_EMAIL` to
//! `admin@example.com`. `DATABASE_URL` (or `DB_URL`) is required. The
//! `ARGON2_*` cost settings are read the same way the API reads them.

use anyhow::Context;
use postpulse_api::config::hashing_from_lookup;
use postpulse_shared::{
    auth::password::hash_password_with,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::user::{CreateUser, User, UserRole},
    telemetry::init_tracing,
};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("seed_admin=info,postpulse_shared=info");

    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("DB_URL"))
        .context("DATABASE_URL environment variable is required")?;
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Super Admin".to_string());
    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let password = env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD environment variable is required")?;

    if password.is_empty() {
        anyhow::bail!("ADMIN_PASSWORD must not be empty");
    }

    let hashing = hashing_from_lookup(&|key: &str| env::var(key).ok())?;

    let pool = create_pool(DatabaseConfig::new(database_url).with_max_connections(2)).await?;
    run_migrations(&pool).await?;

    if let Some(existing) = User::find_any_admin(&pool).await? {
        tracing::info!(admin_id = %existing.id, name = %existing.name, "Admin already exists, nothing to do");
        close_pool(pool).await;
        return Ok(());
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password_with(&password, &hashing)).await??;

    let admin = User::create(
        &pool,
        CreateUser {
            name,
            email,
            password_hash,
            role: UserRole::Admin,
        },
    )
    .await
    .context("Failed to create admin")?;

    tracing::info!(admin_id = %admin.id, email = %admin.email, "Admin seeded");
    close_pool(pool).await;

    Ok(())
}
