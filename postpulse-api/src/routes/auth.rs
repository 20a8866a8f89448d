/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /signup` - Register a user
/// - `POST /admin/signup` - Register an admin (admin only)
/// - `POST /login` - Exchange credentials for an access/refresh token pair
/// - `POST /refresh` - Exchange a refresh token for a new access token
/// - `POST /logout` - Revoke a refresh token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
};
use axum::{extract::State, Extension, Json};
use postpulse_shared::{
    auth::{
        authorization::require_admin,
        middleware::AuthContext,
        password::{self, HashingParams},
    },
    models::user::{CreateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request (users and admins)
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user_name: String,
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminSignupResponse {
    pub admin_name: String,
    pub detail: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Body of `/refresh` and `/logout`
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

/// Hashes on the blocking pool; Argon2 is deliberately slow
async fn hash_off_thread(plaintext: String, params: HashingParams) -> ApiResult<String> {
    let hash = tokio::task::spawn_blocking(move || password::hash_password_with(&plaintext, &params))
        .await??;
    Ok(hash)
}

fn already_registered(role: UserRole) -> ApiError {
    ApiError::BadRequest(match role {
        UserRole::User => "User already registered".to_string(),
        UserRole::Admin => "Admin already registered".to_string(),
    })
}

async fn register(state: &AppState, req: SignupRequest, role: UserRole) -> ApiResult<User> {
    req.validate()?;

    if User::email_exists(&state.db, &req.email).await? {
        return Err(already_registered(role));
    }

    let password_hash = hash_off_thread(req.password, state.config.hashing).await?;

    // A concurrent signup can still win the race
    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role,
        },
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some("users_email_key") => {
            already_registered(role)
        }
        other => ApiError::from(other),
    })?;

    tracing::info!(user_id = %user.id, role = role.as_str(), "User registered");
    Ok(user)
}

/// Register a new user
///
/// ```text
/// POST /signup
/// { "name": "Jane", "email": "jane@example.com", "password": "..." }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or email already registered
pub async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> ApiResult<Json<SignupResponse>> {
    let user = register(&state, req, UserRole::User).await?;

    Ok(Json(SignupResponse {
        user_name: user.name,
        detail: "User registered successfully".to_string(),
    }))
}

/// Register a new admin; the caller must be an admin
pub async fn admin_signup(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    AppJson(req): AppJson<SignupRequest>,
) -> ApiResult<Json<AdminSignupResponse>> {
    require_admin(&auth)?;

    let admin = register(&state, req, UserRole::Admin).await?;
    tracing::info!(created_by = %auth.user_id, admin_id = %admin.id, "Admin created");

    Ok(Json(AdminSignupResponse {
        admin_name: admin.name,
        detail: "Admin registered successfully".to_string(),
    }))
}

/// Log in with email and password
///
/// ```text
/// POST /login
/// { "email": "jane@example.com", "password": "..." }
/// ```
///
/// ```json
/// { "access_token": "eyJ...", "refresh_token": "eyJ...", "token_type": "bearer" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password (indistinguishable)
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    let stored_hash = user.password_hash.clone();
    let password = req.password;
    let verified =
        tokio::task::spawn_blocking(move || password::verify_password(&password, &stored_hash))
            .await??;

    if !verified {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(invalid());
    }

    let access_token = state.tokens.issue_access(&user.email)?;
    let refresh = state.tokens.issue_refresh(&state.db, &user).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        access_token,
        refresh_token: refresh.token,
        token_type: "bearer".to_string(),
    }))
}

/// Trade a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: token invalid, expired, revoked or its user is gone
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = state.tokens.rotate(&state.db, &req.refresh_token).await?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Revoke a refresh token
///
/// # Errors
///
/// - `401 Unauthorized`: token signature or type invalid
/// - `404 Not Found`: token was never issued
/// - `400 Bad Request`: token already revoked
pub async fn logout(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshRequest>,
) -> ApiResult<Json<DetailResponse>> {
    state.tokens.revoke(&state.db, &req.refresh_token).await?;

    Ok(Json(DetailResponse {
        detail: "Logged out successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_validation() {
        let ok = SignupRequest {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            password: "pw".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = SignupRequest {
            name: String::new(),
            email: "jane".into(),
            password: String::new(),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_already_registered_names_the_role() {
        assert!(matches!(
            already_registered(UserRole::User),
            ApiError::BadRequest(ref m) if m == "User already registered"
        ));
        assert!(matches!(
            already_registered(UserRole::Admin),
            ApiError::BadRequest(ref m) if m == "Admin already registered"
        ));
    }

    #[test]
    fn test_signup_rejects_long_email() {
        let req = SignupRequest {
            name: "Jane".into(),
            email: format!("{}@example.com", "a".repeat(100)),
            password: "pw".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_login_response_shape() {
        let json = serde_json::to_value(LoginResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            token_type: "bearer".into(),
        })
        .unwrap();
        assert_eq!(json["token_type"], "bearer");
    }
}
