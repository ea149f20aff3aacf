//! Application error types.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use crate::db::DatabaseError;
use crate::layers::LayerError;

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// The layer specification could not be loaded.
    Layers(LayerError),

    /// The database pool could not be created or reached.
    Database(DatabaseError),

    /// The listen address could not be bound.
    Bind { addr: SocketAddr, source: io::Error },

    /// The server failed while running.
    Serve(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Layers(e) => write!(f, "Failed to load layers: {}", e),
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Bind { addr, source } => {
                write!(f, "Failed to bind {}: {}", addr, source)
            }
            AppError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Layers(e) => Some(e),
            AppError::Database(e) => Some(e),
            AppError::Bind { source, .. } => Some(source),
            AppError::Serve(e) => Some(e),
        }
    }
}

impl From<LayerError> for AppError {
    fn from(e: LayerError) -> Self {
        AppError::Layers(e)
    }
}

impl From<DatabaseError> for AppError {
    fn from(e: DatabaseError) -> Self {
        AppError::Database(e)
    }
}
