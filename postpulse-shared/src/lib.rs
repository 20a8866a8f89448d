//! # PostPulse Shared Library
//!
//! Types and business rules used by both the API server and the publish
//! worker.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, JWTs, the refresh-token service, bearer
//!   authentication and role/ownership rules
//! - `db`: connection pool and embedded migrations
//! - `models`: database rows and their queries
//! - `analytics`: ranking metrics and graph synthesis
//! - `telemetry`: tracing subscriber setup

pub mod analytics;
pub mod auth;
pub mod db;
pub mod models;
pub mod telemetry;

/// Current version of the PostPulse shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
