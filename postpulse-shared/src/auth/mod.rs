/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing with configurable cost
/// - [`jwt`]: access/refresh JWT encoding and validation
/// - [`tokens`]: refresh-token issuance, rotation and revocation
/// - [`middleware`]: bearer-token authentication of requests
/// - [`authorization`]: admin and ownership rules
///
/// # Example
///
/// ```no_run
/// use postpulse_shared::auth::password::{hash_password, verify_password};
/// use postpulse_shared::auth::jwt::JwtSettings;
/// use postpulse_shared::auth::tokens::TokenService;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = TokenService::new(&JwtSettings::hs256(
///     "access-secret-key-at-least-32-bytes-long",
///     "refresh-secret-key-at-least-32-bytes-long",
/// ));
/// let access = tokens.issue_access("user@example.com")?;
/// assert_eq!(tokens.verify_access(&access)?, "user@example.com");
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod tokens;
