//! Geometry database access.
//!
//! The tile pipeline talks to the database through the [`TileDatabase`]
//! trait so the service can be exercised without a live PostGIS instance.
//! [`PgTileDatabase`] is the production implementation backed by a
//! `deadpool-postgres` connection pool.
//!
//! # Connection discipline
//!
//! Every call checks a connection out of the pool for the duration of one
//! query. The pooled object returns itself to the pool when dropped, so the
//! connection is released on every exit path, errors and timeouts included.
//! No connection is ever shared between two in-flight requests.

mod postgres;

pub use postgres::{pool_config, PgTileDatabase};

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

/// Binary columns of one result row, in column order.
///
/// `None` marks a NULL value (a layer without features in this tile).
pub type FragmentRow = Vec<Option<Vec<u8>>>;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised by the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    /// No connection could be checked out of the pool.
    #[error("Database connection unavailable: {0}")]
    Pool(String),

    /// The query failed to execute.
    #[error("Query failed: {0}")]
    Query(String),

    /// The query did not complete within the deadline.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The pool could not be created from the configuration.
    #[error("Invalid database configuration: {0}")]
    Config(String),
}

/// Executes materialized tile queries.
///
/// # Thread Safety
///
/// Implementations are shared across request handlers and must be
/// `Send + Sync`. Each call must use its own connection (or otherwise
/// serialize access) so concurrent requests never race on one session.
pub trait TileDatabase: Send + Sync {
    /// Run a query and return the binary columns of every result row.
    ///
    /// Non-binary columns are dropped. Row order is preserved.
    fn query_fragments<'a>(
        &'a self,
        sql: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FragmentRow>, DatabaseError>>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock database returning canned rows and recording every query.
    pub struct MockTileDatabase {
        pub response: Result<Vec<FragmentRow>, DatabaseError>,
        pub queries: Mutex<Vec<String>>,
        pub delay: Option<Duration>,
    }

    impl MockTileDatabase {
        pub fn returning(rows: Vec<FragmentRow>) -> Self {
            Self {
                response: Ok(rows),
                queries: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn failing(error: DatabaseError) -> Self {
            Self {
                response: Err(error),
                queries: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    impl TileDatabase for MockTileDatabase {
        fn query_fragments<'a>(
            &'a self,
            sql: &'a str,
        ) -> BoxFuture<'a, Result<Vec<FragmentRow>, DatabaseError>> {
            Box::pin(async move {
                self.queries.lock().unwrap().push(sql.to_string());
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                self.response.clone()
            })
        }
    }

    #[tokio::test]
    async fn test_mock_records_queries() {
        let db = MockTileDatabase::returning(vec![vec![Some(vec![1, 2])]]);

        let rows = db.query_fragments("SELECT 1;").await.unwrap();

        assert_eq!(rows, vec![vec![Some(vec![1, 2])]]);
        assert_eq!(db.queries.lock().unwrap().as_slice(), &["SELECT 1;"]);
    }

    #[tokio::test]
    async fn test_mock_error() {
        let db = MockTileDatabase::failing(DatabaseError::Query("syntax error".to_string()));
        assert!(db.query_fragments("SELECT").await.is_err());
    }

    #[test]
    fn test_database_error_display() {
        assert_eq!(
            DatabaseError::Pool("timed out".to_string()).to_string(),
            "Database connection unavailable: timed out"
        );
        assert_eq!(
            DatabaseError::Timeout(Duration::from_secs(5)).to_string(),
            "Query timed out after 5s"
        );
    }
}
