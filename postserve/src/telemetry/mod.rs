//! Request telemetry for observability and the shutdown summary.
//!
//! Counters are lock-free atomics updated from request handlers; readers take
//! a point-in-time [`TelemetrySnapshot`].
//!
//! ```text
//! Handlers / TileService ─────► TileMetrics ─────► TelemetrySnapshot ─────► CLI
//!                              (atomic counters)   (point-in-time copy)
//! ```
//!
//! # Example
//!
//! ```
//! use postserve::telemetry::TileMetrics;
//! use std::time::Duration;
//!
//! let metrics = TileMetrics::new();
//! metrics.tile_served(1024);
//! metrics.database_query(Duration::from_millis(12));
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.tiles_served, 1);
//! assert_eq!(snapshot.bytes_served, 1024);
//! ```

mod metrics;
mod snapshot;

pub use metrics::{ActiveRequest, TileMetrics};
pub use snapshot::TelemetrySnapshot;
