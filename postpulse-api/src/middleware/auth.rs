/// Bearer-token authentication layer
///
/// Applied with `axum::middleware::from_fn_with_state` to every protected
/// router. On success the caller's [`AuthContext`] is inserted as a request
/// extension for handlers to pick up with `Extension<AuthContext>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use postpulse_shared::auth::middleware::{authenticate_bearer, AuthContext};

use crate::{app::AppState, error::ApiError};

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth: AuthContext = authenticate_bearer(&state.db, &state.tokens, req.headers()).await?;

    tracing::debug!(user_id = %auth.user_id, role = auth.role.as_str(), "Authenticated request");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
