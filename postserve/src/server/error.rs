//! Mapping of pipeline errors to HTTP responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::db::DatabaseError;
use crate::service::ServiceError;
use crate::tile::TileRequestError;

/// Error returned from the tile handler.
///
/// Client errors echo the validation message; server errors return a
/// generic message and log the database detail instead.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(TileRequestError),
    Service(ServiceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::Coord(_)) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::Database(DatabaseError::Pool(_))) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Service(ServiceError::Database(DatabaseError::Timeout(_))) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ApiError::Service(ServiceError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(e) => e.to_string(),
            ApiError::Service(ServiceError::Coord(e)) => e.to_string(),
            ApiError::Service(ServiceError::Database(DatabaseError::Pool(_))) => {
                "Database unavailable".to_string()
            }
            ApiError::Service(ServiceError::Database(DatabaseError::Timeout(_))) => {
                "Tile query timed out".to_string()
            }
            ApiError::Service(ServiceError::Database(_)) => "Tile query failed".to_string(),
        }
    }
}

impl From<TileRequestError> for ApiError {
    fn from(e: TileRequestError) -> Self {
        ApiError::BadRequest(e)
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::BadRequest(e) => warn!(error = %e, "Rejected tile request"),
            ApiError::Service(ServiceError::Coord(e)) => warn!(error = %e, "Rejected tile request"),
            ApiError::Service(ServiceError::Database(e)) => {
                error!(error = %e, status = status.as_u16(), "Tile request failed")
            }
        }

        (
            status,
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            ],
            self.message(),
        )
            .into_response()
    }
}
