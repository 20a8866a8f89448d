/// Configuration for the API server
///
/// Loaded from environment variables (a `.env` file is read first if
/// present) and validated up front so a misconfigured server fails at startup.
///
/// # Environment Variables
///
/// - `API_HOST` (default `0.0.0.0`), `API_PORT` (default `8000`)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any (default `*`)
/// - `RUN_MIGRATIONS`: apply migrations at startup (default `true`)
/// - `DATABASE_URL` (required, `DB_URL` accepted), `DATABASE_MAX_CONNECTIONS` (default 10)
/// - `JWT_ACCESS_SECRET`, `JWT_REFRESH_SECRET`: required, at least 32 characters
/// - `JWT_ALGORITHM`: `HS256` (default), `HS384` or `HS512`
/// - `ACCESS_TOKEN_TTL_MINUTES` (default 15), `REFRESH_TOKEN_TTL_DAYS` (default 7)
/// - `ARGON2_MEMORY_KIB` (65536), `ARGON2_ITERATIONS` (3), `ARGON2_PARALLELISM` (4)
///
/// # Example
///
/// ```no_run
/// use postpulse_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use postpulse_shared::auth::jwt::{parse_algorithm, JwtSettings};
use postpulse_shared::auth::password::HashingParams;
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtSettings,
    pub hashing: HashingParams,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `["*"]` allows any
    pub cors_origins: Vec<String>,

    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

const MIN_SECRET_LEN: usize = 32;

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to
    /// parse or validate.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api = ApiConfig {
            host: lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "API_PORT", 8000)?,
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            run_migrations: parse_bool(&lookup, "RUN_MIGRATIONS", true)?,
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL")
                .or_else(|| lookup("DB_URL"))
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
        };

        let access_secret = required_secret(&lookup, "JWT_ACCESS_SECRET")?;
        let refresh_secret = required_secret(&lookup, "JWT_REFRESH_SECRET")?;

        if access_secret == refresh_secret {
            anyhow::bail!("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ");
        }

        let algorithm = parse_algorithm(&lookup("JWT_ALGORITHM").unwrap_or_else(|| "HS256".to_string()))?;

        let access_minutes: i64 = parse_or(&lookup, "ACCESS_TOKEN_TTL_MINUTES", 15)?;
        let refresh_days: i64 = parse_or(&lookup, "REFRESH_TOKEN_TTL_DAYS", 7)?;

        if access_minutes <= 0 || refresh_days <= 0 {
            anyhow::bail!("Token lifetimes must be positive");
        }

        let jwt = JwtSettings {
            access_secret,
            refresh_secret,
            algorithm,
            access_ttl: Duration::try_minutes(access_minutes)
                .ok_or_else(|| anyhow::anyhow!("ACCESS_TOKEN_TTL_MINUTES is out of range"))?,
            refresh_ttl: Duration::try_days(refresh_days)
                .ok_or_else(|| anyhow::anyhow!("REFRESH_TOKEN_TTL_DAYS is out of range"))?,
        };

        let hashing = hashing_from_lookup(&lookup)?;

        Ok(Self {
            api,
            database,
            jwt,
            hashing,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

/// Reads the `ARGON2_*` cost settings, falling back to the defaults
pub fn hashing_from_lookup<F>(lookup: &F) -> anyhow::Result<HashingParams>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = HashingParams::default();

    Ok(HashingParams {
        memory_kib: parse_or(lookup, "ARGON2_MEMORY_KIB", defaults.memory_kib)?,
        iterations: parse_or(lookup, "ARGON2_ITERATIONS", defaults.iterations)?,
        parallelism: parse_or(lookup, "ARGON2_PARALLELISM", defaults.parallelism)?,
    })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
    }
}

fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> anyhow::Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("FALSE") | Some("no") => Ok(false),
        Some(other) => anyhow::bail!("Invalid value for {}: {}", key, other),
    }
}

fn required_secret<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = lookup(key)
        .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))?;

    if secret.len() < MIN_SECRET_LEN {
        anyhow::bail!("{} must be at least {} characters long", key, MIN_SECRET_LEN);
    }

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postpulse_shared::auth::jwt::Algorithm;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgresql://localhost/postpulse"),
        ("JWT_ACCESS_SECRET", "access-secret-that-is-at-least-32-chars"),
        ("JWT_REFRESH_SECRET", "refresh-secret-that-is-at-least-32-chars"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&BASE)).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert!(config.allows_any_origin());
        assert!(config.api.run_migrations);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.algorithm, Algorithm::HS256);
        assert_eq!(config.jwt.access_ttl, Duration::minutes(15));
        assert_eq!(config.jwt.refresh_ttl, Duration::days(7));
        assert_eq!(config.hashing, HashingParams::default());
    }

    #[test]
    fn test_overrides() {
        let mut vars = BASE.to_vec();
        vars.extend([
            ("API_PORT", "9001"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("RUN_MIGRATIONS", "false"),
            ("JWT_ALGORITHM", "HS512"),
            ("ACCESS_TOKEN_TTL_MINUTES", "5"),
            ("ARGON2_MEMORY_KIB", "19456"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.api.port, 9001);
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.allows_any_origin());
        assert!(!config.api.run_migrations);
        assert_eq!(config.jwt.algorithm, Algorithm::HS512);
        assert_eq!(config.jwt.access_ttl, Duration::minutes(5));
        assert_eq!(config.hashing.memory_kib, 19456);
    }

    #[test]
    fn test_db_url_fallback() {
        let vars = [
            ("DB_URL", "postgresql://fallback/db"),
            BASE[1],
            BASE[2],
        ];
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.database.url, "postgresql://fallback/db");
    }

    #[test]
    fn test_missing_database_url() {
        let err = Config::from_lookup(lookup(&BASE[1..])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let vars = [BASE[0], ("JWT_ACCESS_SECRET", "short"), BASE[2]];
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let vars = [
            BASE[0],
            ("JWT_ACCESS_SECRET", "same-secret-that-is-at-least-32-chars"),
            ("JWT_REFRESH_SECRET", "same-secret-that-is-at-least-32-chars"),
        ];
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_asymmetric_algorithm_rejected() {
        let mut vars = BASE.to_vec();
        vars.push(("JWT_ALGORITHM", "RS256"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let mut vars = BASE.to_vec();
        vars.push(("API_PORT", "eighty"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));

        let mut vars = BASE.to_vec();
        vars.push(("REFRESH_TOKEN_TTL_DAYS", "0"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_huge_ttls_rejected() {
        let mut vars = BASE.to_vec();
        vars.push(("ACCESS_TOKEN_TTL_MINUTES", "9223372036854775807"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("ACCESS_TOKEN_TTL_MINUTES"));

        let mut vars = BASE.to_vec();
        vars.push(("REFRESH_TOKEN_TTL_DAYS", "9223372036854775807"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("REFRESH_TOKEN_TTL_DAYS"));
    }

    #[test]
    fn test_hashing_without_jwt_settings() {
        let hashing = hashing_from_lookup(&lookup(&[("ARGON2_ITERATIONS", "2")])).unwrap();
        assert_eq!(hashing.iterations, 2);
        assert_eq!(hashing.memory_kib, HashingParams::default().memory_kib);

        assert!(hashing_from_lookup(&lookup(&[("ARGON2_PARALLELISM", "many")])).is_err());
    }
}
