//! # PadelSense Runtime
//!
//! Runtime that drives the pure match rules in `padelsense-core` against
//! real collaborators.
//!
//! ## Core Components
//!
//! - **`MatchController`**: serializes commands per match, loads, decides,
//!   commits, and dispatches match-end notifications
//! - **`NotificationDispatcher`**: detached player lookup and notifier call
//! - **Cache**: explicit `Cache` interface, in-memory TTL/LRU implementation,
//!   and a read-through `PlayerDirectory` decorator
//! - **Metrics**: Prometheus recorder and metric helpers
//!
//! ## Example
//!
//! ```ignore
//! use padelsense_runtime::{ControllerConfig, MatchController};
//!
//! let controller = MatchController::new(store, clock, ControllerConfig::new(court))
//!     .with_notifications(dispatcher);
//!
//! let m = controller.start(team_a, team_b, None).await?;
//! controller.add_point(m.id, Side::A).await?;
//! controller.end(m.id).await?;
//! ```

/// Read-through caching
pub mod cache;

/// Match command execution
pub mod controller;

/// Prometheus metrics for observability
pub mod metrics;

/// Match-end notification dispatch
pub mod notify;

pub use cache::{Cache, CachedPlayerDirectory, InMemoryCache};
pub use controller::{ControllerConfig, MatchController};
pub use notify::NotificationDispatcher;
