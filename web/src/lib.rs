//! HTTP surface for PadelSense match scoring.
//!
//! Axum handlers translate requests into `MatchController` calls and map
//! `MatchError` onto status codes:
//!
//! | Error | Status | Code |
//! |---|---|---|
//! | `NotFound` | 404 | `NOT_FOUND` |
//! | `InvalidState` | 409 | `CONFLICT` |
//! | `InvalidInput` | 422 | `VALIDATION_ERROR` |
//! | `ConcurrencyConflict` | 409 | `CONCURRENCY_CONFLICT` |
//! | `Store` | 503 / 500 | `SERVICE_UNAVAILABLE` / `INTERNAL_SERVER_ERROR` |
//!
//! # Example
//!
//! ```ignore
//! use padelsense_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(controller).with_metrics(recorder));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod notifier;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use config::{Config, ConfigError};
pub use error::AppError;
pub use notifier::{BotNotifier, NoopNotifier};
pub use routes::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
