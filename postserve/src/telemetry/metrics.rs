//! Lock-free atomic metrics collection.

use super::TelemetrySnapshot;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Lock-free metrics for the tile server.
///
/// All operations use `Relaxed` ordering; the counters are independent
/// measurements and no reader relies on ordering between them.
#[derive(Debug)]
pub struct TileMetrics {
    /// When metrics collection started
    start_time: Instant,

    /// Requests currently being handled
    requests_active: AtomicUsize,

    /// Tiles returned with status 200 (including empty tiles)
    tiles_served: AtomicU64,
    /// Tiles returned with a zero-length body
    tiles_empty: AtomicU64,
    /// Total payload bytes returned
    bytes_served: AtomicU64,

    /// Requests rejected as malformed or out of range
    client_errors: AtomicU64,
    /// Requests failed by the database
    server_errors: AtomicU64,

    /// Completed database round trips
    database_queries: AtomicU64,
    /// Total database time in microseconds
    database_time_us: AtomicU64,
}

impl TileMetrics {
    /// Creates a new metrics instance.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            requests_active: AtomicUsize::new(0),
            tiles_served: AtomicU64::new(0),
            tiles_empty: AtomicU64::new(0),
            bytes_served: AtomicU64::new(0),
            client_errors: AtomicU64::new(0),
            server_errors: AtomicU64::new(0),
            database_queries: AtomicU64::new(0),
            database_time_us: AtomicU64::new(0),
        }
    }

    /// Mark a request as active until the returned guard is dropped.
    pub fn request_started(&self) -> ActiveRequest<'_> {
        self.requests_active.fetch_add(1, Ordering::Relaxed);
        ActiveRequest { metrics: self }
    }

    /// Record a tile returned to the client.
    pub fn tile_served(&self, bytes: usize) {
        self.tiles_served.fetch_add(1, Ordering::Relaxed);
        self.bytes_served.fetch_add(bytes as u64, Ordering::Relaxed);
        if bytes == 0 {
            self.tiles_empty.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn client_error(&self) {
        self.client_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn server_error(&self) {
        self.server_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed database round trip.
    pub fn database_query(&self, elapsed: Duration) {
        self.database_queries.fetch_add(1, Ordering::Relaxed);
        self.database_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let uptime = self.start_time.elapsed();
        let tiles_served = self.tiles_served.load(Ordering::Relaxed);
        let database_queries = self.database_queries.load(Ordering::Relaxed);
        let database_time_us = self.database_time_us.load(Ordering::Relaxed);

        let secs = uptime.as_secs_f64();
        let tiles_per_second = if secs > 0.0 {
            tiles_served as f64 / secs
        } else {
            0.0
        };
        let avg_database_ms = if database_queries > 0 {
            database_time_us as f64 / database_queries as f64 / 1000.0
        } else {
            0.0
        };

        TelemetrySnapshot {
            uptime,
            requests_active: self.requests_active.load(Ordering::Relaxed),
            tiles_served,
            tiles_empty: self.tiles_empty.load(Ordering::Relaxed),
            bytes_served: self.bytes_served.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            database_queries,
            total_database_time_ms: database_time_us / 1000,
            tiles_per_second,
            avg_database_ms,
        }
    }
}

impl Default for TileMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard decrementing the active request count on drop.
pub struct ActiveRequest<'a> {
    metrics: &'a TileMetrics,
}

impl Drop for ActiveRequest<'_> {
    fn drop(&mut self) {
        self.metrics.requests_active.fetch_sub(1, Ordering::Relaxed);
    }
}
