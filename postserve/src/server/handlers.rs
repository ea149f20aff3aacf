//! Route handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use crate::service::TileService;
use crate::tile::parse_tile_path;

pub const MVT_CONTENT_TYPE: &str = "application/x-protobuf";

/// `GET /tiles/{zoom}/{x}/{y}.pbf`
pub async fn get_tile(
    State(service): State<Arc<TileService>>,
    Path((zoom, x, y)): Path<(String, String, String)>,
) -> Response {
    let metrics = service.metrics().clone();
    let _active = metrics.request_started();

    match render(&service, &zoom, &x, &y).await {
        Ok(response) => response,
        Err(e) => {
            if e.is_client_error() {
                metrics.client_error();
            } else {
                metrics.server_error();
            }
            e.into_response()
        }
    }
}

async fn render(service: &TileService, zoom: &str, x: &str, y: &str) -> Result<Response, ApiError> {
    let tile = parse_tile_path(zoom, x, y)?;
    let payload = service.render(tile).await?;

    service.metrics().tile_served(payload.len());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, MVT_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, "attachment"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::CACHE_CONTROL, "private"),
        ],
        payload.into_bytes(),
    )
        .into_response())
}

/// `GET /healthcheck`
pub async fn healthcheck() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "OK",
    )
}
