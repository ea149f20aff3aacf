//! Point-in-time telemetry snapshot.

use std::fmt;
use std::time::Duration;

/// A point-in-time copy of the server metrics.
///
/// Rates are pre-computed from the uptime at the time of the snapshot.
#[derive(Clone, Debug)]
pub struct TelemetrySnapshot {
    /// How long the server has been running
    pub uptime: Duration,

    /// Requests in flight
    pub requests_active: usize,

    /// Tiles returned with status 200
    pub tiles_served: u64,
    /// Tiles with a zero-length body
    pub tiles_empty: u64,
    /// Total payload bytes returned
    pub bytes_served: u64,

    /// Requests answered with a 4xx status
    pub client_errors: u64,
    /// Requests answered with a 5xx status
    pub server_errors: u64,

    /// Completed database round trips
    pub database_queries: u64,
    /// Total database time
    pub total_database_time_ms: u64,

    /// Tiles per second over the uptime
    pub tiles_per_second: f64,
    /// Mean database round trip
    pub avg_database_ms: f64,
}

impl TelemetrySnapshot {
    /// Total requests that reached a final status.
    pub fn requests_total(&self) -> u64 {
        self.tiles_served + self.client_errors + self.server_errors
    }

    /// Returns the server error rate (0.0 - 1.0).
    pub fn error_rate(&self) -> f64 {
        let total = self.requests_total();
        if total == 0 {
            0.0
        } else {
            self.server_errors as f64 / total as f64
        }
    }

    /// Returns uptime in human-readable format.
    pub fn uptime_human(&self) -> String {
        format_duration(self.uptime)
    }

    /// Returns total bytes served in human-readable format.
    pub fn bytes_served_human(&self) -> String {
        format_bytes(self.bytes_served)
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session Summary (uptime: {})", self.uptime_human())?;
        writeln!(f, "─────────────────────────────────────────")?;
        writeln!(
            f,
            "  Tiles served: {} ({:.1}/s, {} empty)",
            self.tiles_served, self.tiles_per_second, self.tiles_empty
        )?;
        writeln!(f, "  Data served:  {}", self.bytes_served_human())?;
        writeln!(
            f,
            "  Database:     {} queries, {:.1} ms avg",
            self.database_queries, self.avg_database_ms
        )?;
        writeln!(
            f,
            "  Errors:       {} client, {} server ({:.2}%)",
            self.client_errors,
            self.server_errors,
            self.error_rate() * 100.0
        )?;
        Ok(())
    }
}

/// Format bytes in human-readable form.
fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration in human-readable form.
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_snapshot() -> TelemetrySnapshot {
        TelemetrySnapshot {
            uptime: Duration::from_secs(3661), // 1:01:01
            requests_active: 3,
            tiles_served: 95,
            tiles_empty: 12,
            bytes_served: 4_500_000,
            client_errors: 3,
            server_errors: 2,
            database_queries: 97,
            total_database_time_ms: 4850,
            tiles_per_second: 0.026,
            avg_database_ms: 50.0,
        }
    }

    #[test]
    fn test_error_rate() {
        let snapshot = test_snapshot();
        // 2 server errors out of 100 finished requests
        assert!((snapshot.error_rate() - 0.02).abs() < 0.0001);
    }

    #[test]
    fn test_error_rate_no_requests() {
        let snapshot = TelemetrySnapshot {
            tiles_served: 0,
            client_errors: 0,
            server_errors: 0,
            ..test_snapshot()
        };
        assert_eq!(snapshot.error_rate(), 0.0);
    }

    #[test]
    fn test_uptime_human() {
        assert_eq!(test_snapshot().uptime_human(), "01:01:01");
        assert_eq!(format_duration(Duration::from_secs(75)), "01:15");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(1_500), "1.5 KB");
        assert_eq!(format_bytes(4_500_000), "4.5 MB");
        assert_eq!(format_bytes(2_000_000_000), "2.0 GB");
    }

    #[test]
    fn test_display() {
        let output = test_snapshot().to_string();

        assert!(output.starts_with("Session Summary (uptime: 01:01:01)"));
        assert!(output.contains("Tiles served: 95"));
        assert!(output.contains("12 empty"));
        assert!(output.contains("3 client, 2 server"));
    }
}
