/// API route handlers
///
/// - `health`: liveness probe
/// - `auth`: signup, login, token refresh and logout
/// - `posts`: post CRUD and scheduling
/// - `analytics`: per-post counters, rankings, graph and summary

pub mod analytics;
pub mod auth;
pub mod health;
pub mod posts;
