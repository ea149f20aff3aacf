//! Tile rendering service.
//!
//! [`TileService`] owns the shared, read-only pieces of the pipeline (the
//! query template, the database handle and the metrics) and renders one tile
//! per call. It is cheap to share behind an `Arc`; every call is independent.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::coord::{scale_denominator, tile_bounds, CoordError, TileCoord};
use crate::db::{DatabaseError, TileDatabase};
use crate::query::{materialize, QueryTemplate};
use crate::telemetry::TileMetrics;
use crate::tile::{assemble, TilePayload};

/// Errors raised while rendering a tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Renders vector tiles from the geometry database.
pub struct TileService {
    template: QueryTemplate,
    database: Arc<dyn TileDatabase>,
    metrics: Arc<TileMetrics>,
    query_timeout: Duration,
}

impl TileService {
    /// Create a service with fresh metrics.
    pub fn new(
        template: QueryTemplate,
        database: Arc<dyn TileDatabase>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            template,
            database,
            metrics: Arc::new(TileMetrics::new()),
            query_timeout,
        }
    }

    /// Share an existing metrics instance.
    pub fn with_metrics(mut self, metrics: Arc<TileMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<TileMetrics> {
        &self.metrics
    }

    pub fn template(&self) -> &QueryTemplate {
        &self.template
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// The fully materialized query for a tile.
    pub fn tile_sql(&self, tile: &TileCoord) -> Result<String, ServiceError> {
        let bbox = tile_bounds(tile)?;
        Ok(materialize(
            &self.template,
            &bbox,
            scale_denominator(tile.zoom),
        ))
    }

    /// Render one tile.
    ///
    /// Database failures and timeouts are returned as errors; they are never
    /// turned into an empty tile. An empty payload means the region has no
    /// features.
    pub async fn render(&self, tile: TileCoord) -> Result<TilePayload, ServiceError> {
        let sql = self.tile_sql(&tile)?;

        let started = Instant::now();
        let rows = tokio::time::timeout(self.query_timeout, self.database.query_fragments(&sql))
            .await
            .map_err(|_| DatabaseError::Timeout(self.query_timeout))??;
        let elapsed = started.elapsed();
        self.metrics.database_query(elapsed);

        let payload = assemble(rows);

        debug!(
            tile = %tile,
            bytes = payload.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Tile rendered"
        );

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::MockTileDatabase;
    use crate::layers::LayerSpec;

    const LAYERS: &str = r#"
Layer:
  - id: water
    properties: { buffer-size: 4 }
    Datasource: { table: "(SELECT geometry FROM layer_water(!bbox!, z(!scale_denominator!))) AS t" }
  - id: roads
    properties: { buffer-size: 8 }
    Datasource: { table: "(SELECT geometry, name FROM roads) AS t" }
"#;

    fn service(db: MockTileDatabase) -> (TileService, Arc<MockTileDatabase>) {
        let db = Arc::new(db);
        let template = QueryTemplate::build(&LayerSpec::from_yaml_str(LAYERS).unwrap());
        let service = TileService::new(template, db.clone(), Duration::from_secs(5));
        (service, db)
    }

    fn tile(zoom: u8, x: u32, y: u32) -> TileCoord {
        TileCoord::new(zoom, x, y).unwrap()
    }

    #[tokio::test]
    async fn test_render_concatenates_layers() {
        let (service, _) = service(MockTileDatabase::returning(vec![
            vec![Some(vec![1, 1])],
            vec![Some(vec![2, 2])],
        ]));

        let payload = service.render(tile(0, 0, 0)).await.unwrap();
        assert_eq!(payload.as_bytes(), &[1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn test_render_sends_materialized_sql() {
        let (service, db) = service(MockTileDatabase::returning(Vec::new()));

        service.render(tile(6, 33, 22)).await.unwrap();

        let queries = db.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(!queries[0].contains("!bbox!"));
        assert!(!queries[0].contains("!scale_denominator!"));
        assert!(queries[0].contains("ST_MakeBox2D(ST_Point("));
        assert_eq!(queries[0], service.tile_sql(&tile(6, 33, 22)).unwrap());
    }

    #[tokio::test]
    async fn test_empty_region_is_empty_payload() {
        let (service, _) = service(MockTileDatabase::returning(vec![vec![None], vec![None]]));

        let payload = service.render(tile(14, 0, 0)).await.unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_database_error_propagates() {
        let (service, _) = service(MockTileDatabase::failing(DatabaseError::Query(
            "relation does not exist".to_string(),
        )));

        let err = service.render(tile(0, 0, 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Database(DatabaseError::Query(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_query_times_out() {
        let (service, _) = service(
            MockTileDatabase::returning(Vec::new()).with_delay(Duration::from_secs(60)),
        );

        let err = service.render(tile(0, 0, 0)).await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Database(DatabaseError::Timeout(Duration::from_secs(5)))
        );
    }

    #[tokio::test]
    async fn test_render_records_database_time() {
        let (service, _) = service(MockTileDatabase::returning(Vec::new()));

        service.render(tile(1, 1, 1)).await.unwrap();
        service.render(tile(1, 0, 1)).await.unwrap();

        assert_eq!(service.metrics().snapshot().database_queries, 2);
    }

    #[tokio::test]
    async fn test_render_is_idempotent() {
        let (service, _) = service(MockTileDatabase::returning(vec![vec![Some(vec![7; 16])]]));

        let first = service.render(tile(3, 4, 2)).await.unwrap();
        let second = service.render(tile(3, 4, 2)).await.unwrap();
        assert_eq!(first, second);
    }
}
