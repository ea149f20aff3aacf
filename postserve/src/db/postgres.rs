//! PostgreSQL implementation of [`TileDatabase`].

use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime,
};
use tokio_postgres::types::Type;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};

use super::{BoxFuture, DatabaseError, FragmentRow, TileDatabase};
use crate::config::DatabaseConfig;

/// Application name reported to the server in `pg_stat_activity`.
const APPLICATION_NAME: &str = "postserve";

/// Tile database backed by a `deadpool-postgres` pool.
///
/// Connections are opened lazily. The pool never holds more than
/// `pool_size` sessions, and a request waiting for a free one gives up after
/// the configured query timeout.
#[derive(Clone)]
pub struct PgTileDatabase {
    pool: Pool,
}

impl PgTileDatabase {
    /// Create the pool. No connection is attempted until first use.
    pub fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = pool_config(config)
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| DatabaseError::Config(e.to_string()))?;

        info!(
            target = %config.redacted_url(),
            pool_size = config.pool_size,
            "Database pool created"
        );

        Ok(Self { pool })
    }

    /// Check a connection out and run a trivial query.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        client
            .execute("SELECT 1", &[])
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;

        Ok(())
    }

    /// Number of connections currently open (idle or checked out).
    pub fn open_connections(&self) -> usize {
        self.pool.status().size
    }
}

impl TileDatabase for PgTileDatabase {
    fn query_fragments<'a>(
        &'a self,
        sql: &'a str,
    ) -> BoxFuture<'a, Result<Vec<FragmentRow>, DatabaseError>> {
        Box::pin(async move {
            let client = self
                .pool
                .get()
                .await
                .map_err(|e| DatabaseError::Pool(e.to_string()))?;

            let rows = client
                .query(sql, &[])
                .await
                .map_err(|e| DatabaseError::Query(e.to_string()))?;

            debug!(rows = rows.len(), "Tile query returned");

            rows.iter().map(binary_columns).collect()
        })
    }
}

/// Extract the `bytea` columns of a row, keeping their order.
fn binary_columns(row: &Row) -> Result<FragmentRow, DatabaseError> {
    row.columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| *column.type_() == Type::BYTEA)
        .map(|(index, _)| {
            row.try_get::<_, Option<Vec<u8>>>(index)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .collect()
}

/// Translate a [`DatabaseConfig`] into a pool configuration.
///
/// The query timeout is applied twice: as the server-side
/// `statement_timeout` of every session, and as the wait/create deadline for
/// pool checkouts.
pub fn pool_config(config: &DatabaseConfig) -> Config {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.dbname = Some(config.dbname.clone());
    cfg.user = Some(config.user.clone());
    cfg.password = Some(config.password.clone());
    cfg.application_name = Some(APPLICATION_NAME.to_string());
    cfg.options = Some(format!(
        "-c statement_timeout={}",
        config.query_timeout.as_millis()
    ));
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let mut pool = PoolConfig::new(config.pool_size);
    pool.timeouts.wait = Some(config.query_timeout);
    pool.timeouts.create = Some(config.query_timeout);
    cfg.pool = Some(pool);

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> DatabaseConfig {
        DatabaseConfig {
            host: "db.internal".to_string(),
            port: 5433,
            dbname: "tiles".to_string(),
            user: "reader".to_string(),
            password: "secret".to_string(),
            pool_size: 4,
            query_timeout: Duration::from_millis(2500),
            connect_on_start: false,
        }
    }

    #[test]
    fn test_pool_config_connection_fields() {
        let cfg = pool_config(&config());

        assert_eq!(cfg.host.as_deref(), Some("db.internal"));
        assert_eq!(cfg.port, Some(5433));
        assert_eq!(cfg.dbname.as_deref(), Some("tiles"));
        assert_eq!(cfg.user.as_deref(), Some("reader"));
        assert_eq!(cfg.password.as_deref(), Some("secret"));
        assert_eq!(cfg.application_name.as_deref(), Some("postserve"));
    }

    #[test]
    fn test_pool_config_statement_timeout() {
        let cfg = pool_config(&config());
        assert_eq!(cfg.options.as_deref(), Some("-c statement_timeout=2500"));
    }

    #[test]
    fn test_pool_config_size_and_timeouts() {
        let pool = pool_config(&config()).pool.unwrap();

        assert_eq!(pool.max_size, 4);
        assert_eq!(pool.timeouts.wait, Some(Duration::from_millis(2500)));
        assert_eq!(pool.timeouts.create, Some(Duration::from_millis(2500)));
    }

    #[tokio::test]
    async fn test_pool_creation_is_lazy() {
        // Nothing listens on this host; creating the pool must still succeed.
        let db = PgTileDatabase::new(&config()).unwrap();
        assert_eq!(db.open_connections(), 0);
    }
}
