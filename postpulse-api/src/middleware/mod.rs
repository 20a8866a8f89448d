/// Middleware for the API server
///
/// - `auth`: bearer-token authentication for protected routes

pub mod auth;
