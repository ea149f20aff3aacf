//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use postserve::app::AppError;
use postserve::config::ConfigFileError;
use postserve::layers::LayerError;
use postserve::tile::TileRequestError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file or environment error
    Config(ConfigFileError),
    /// Failed to create the Tokio runtime
    Runtime(std::io::Error),
    /// Layer specification error
    Layers(LayerError),
    /// Invalid tile address on the command line
    Tile(TileRequestError),
    /// Server startup or runtime error
    Serve(AppError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Serve(AppError::Database(_)) => {
                eprintln!();
                eprintln!("Check the database connection settings:");
                eprintln!("  1. POSTGRES_HOST / POSTGRES_PORT point at a running PostGIS server");
                eprintln!("  2. POSTGRES_DB / POSTGRES_USER / POSTGRES_PASSWORD are correct");
                eprintln!("  3. Use --no-db-check to start without verifying the connection");
            }
            CliError::Serve(AppError::Bind { .. }) => {
                eprintln!();
                eprintln!("Another process may be using the port; pick one with --listen.");
            }
            CliError::Layers(_) | CliError::Serve(AppError::Layers(_)) => {
                eprintln!();
                eprintln!("Validate the layer file with: postserve check --layers <path>");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
            CliError::Layers(e) => write!(f, "Layer specification error: {}", e),
            CliError::Tile(e) => write!(f, "Invalid tile: {}", e),
            CliError::Serve(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Layers(e) => Some(e),
            CliError::Tile(e) => Some(e),
            CliError::Serve(e) => Some(e),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<LayerError> for CliError {
    fn from(e: LayerError) -> Self {
        CliError::Layers(e)
    }
}

impl From<TileRequestError> for CliError {
    fn from(e: TileRequestError) -> Self {
        CliError::Tile(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Serve(e)
    }
}
