//! `PostgreSQL` persistence for PadelSense.
//!
//! This crate implements the `MatchStore` and `PlayerDirectory` traits from
//! `padelsense-core` on top of sqlx:
//!
//! - Match rows with optimistic concurrency on `version`
//! - Append-only event log with bincode payloads
//! - Highlights
//! - Player lookup for match-end notifications
//!
//! # Example
//!
//! ```no_run
//! use padelsense_postgres::PostgresMatchStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::PgPool::connect("postgres://localhost/padelsense").await?;
//! let store = PostgresMatchStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod directory;
pub mod store;

pub use directory::PostgresPlayerDirectory;
pub use store::PostgresMatchStore;
