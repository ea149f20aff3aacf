//! HTTP front end.
//!
//! | Route                          | Response                                  |
//! |--------------------------------|-------------------------------------------|
//! | `GET /tiles/{zoom}/{x}/{y}.pbf` | MVT payload (`application/x-protobuf`)    |
//! | `GET /healthcheck`             | `OK`                                      |
//!
//! The `{y}.pbf` segment is captured whole; the extension is checked while
//! parsing so a missing `.pbf` is reported as a bad request.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::MVT_CONTENT_TYPE;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::service::TileService;

/// Build the application router.
pub fn router(service: Arc<TileService>) -> Router {
    Router::new()
        .route("/tiles/:zoom/:x/:y", get(handlers::get_tile))
        .route("/healthcheck", get(handlers::healthcheck))
        .with_state(service)
}

/// Serve requests until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(
    listener: TcpListener,
    service: Arc<TileService>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Listening for tile requests");
    }

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}
