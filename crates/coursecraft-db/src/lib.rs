//! CourseCraft Database — SurrealDB connection management, schema
//! migrations, and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Implementations of the `coursecraft-core` repository traits

mod connection;
mod error;
mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{
    SurrealInstructorBalanceRepository, SurrealTokenRepository, SurrealUserRepository,
    SurrealUserSettingsRepository,
};
pub use schema::{run_migrations, schema_v1};
