/// Database layer
///
/// - [`pool`]: PostgreSQL connection pool with a startup health check
/// - [`migrations`]: embedded schema migrations
///
/// Row types and their queries live in [`crate::models`].

pub mod migrations;
pub mod pool;
