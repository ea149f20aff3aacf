//! Application bootstrap implementation.
//!
//! Startup order matters: the layer specification is loaded and compiled
//! into a query template first, so a broken layer file fails before any
//! database work. The pool is then created and, unless disabled, checked
//! with a trivial query before the listener is bound.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::db::{PgTileDatabase, TileDatabase};
use crate::layers::LayerSpec;
use crate::query::QueryTemplate;
use crate::server;
use crate::service::TileService;
use crate::telemetry::TelemetrySnapshot;

/// Tile server with its lifecycle.
///
/// # Example
///
/// ```ignore
/// use postserve::app::{AppConfig, PostserveApp};
///
/// let app = PostserveApp::start(AppConfig::default()).await?;
/// let summary = app.run().await?; // returns after Ctrl-C
/// println!("{}", summary);
/// ```
pub struct PostserveApp {
    config: AppConfig,
    service: Arc<TileService>,
    layer_count: usize,
    shutdown: CancellationToken,
}

impl PostserveApp {
    /// Load layers, create the database pool and prepare the service.
    ///
    /// # Errors
    ///
    /// Returns an error if the layer file is invalid, the pool cannot be
    /// created, or the startup connectivity check fails.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        let spec = LayerSpec::load(&config.layers_path)?;
        info!(
            path = %config.layers_path.display(),
            layers = spec.len(),
            "Layer specification loaded"
        );

        let database = PgTileDatabase::new(&config.database)?;
        if config.database.connect_on_start {
            database.ping().await?;
            info!(target = %config.database.redacted_url(), "Database reachable");
        } else {
            warn!("Skipping database connectivity check");
        }

        Ok(Self::with_database(config, &spec, Arc::new(database)))
    }

    /// Assemble the application around an existing database handle.
    pub fn with_database(
        config: AppConfig,
        spec: &LayerSpec,
        database: Arc<dyn TileDatabase>,
    ) -> Self {
        let template = QueryTemplate::build(spec);
        let service = Arc::new(TileService::new(
            template,
            database,
            config.database.query_timeout,
        ));

        Self {
            config,
            service,
            layer_count: spec.len(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn service(&self) -> Arc<TileService> {
        Arc::clone(&self.service)
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Token cancelled when the server should stop.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Request a graceful shutdown.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the session telemetry once the server has stopped.
    pub async fn run(&self) -> Result<TelemetrySnapshot, AppError> {
        let addr = self.config.listen;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| AppError::Bind { addr, source })?;

        self.run_on(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    ///
    /// Ctrl-C cancels the shutdown token.
    pub async fn run_on(&self, listener: TcpListener) -> Result<TelemetrySnapshot, AppError> {
        info!(
            listen = %self.config.listen,
            layers = self.layer_count,
            pool_size = self.config.database.pool_size,
            "Postserve starting"
        );

        let token = self.shutdown.clone();
        let signal_task = tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Shutdown requested"),
                        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
                    }
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        });

        let result = server::serve(listener, self.service(), self.shutdown.clone()).await;

        self.shutdown.cancel();
        let _ = signal_task.await;

        result.map_err(AppError::Serve)?;
        Ok(self.service.metrics().snapshot())
    }
}
