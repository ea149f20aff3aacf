//! CLI runner for common setup and operations.
//!
//! Encapsulates configuration loading, logging initialization and runtime
//! creation so command handlers stay small.

use std::path::{Path, PathBuf};

use tracing::info;

use postserve::config::ConfigFile;
use postserve::layers::LayerSpec;
use postserve::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Loaded configuration (file + environment)
    config: ConfigFile,
    /// Logging guard - keeps logging active while runner exists
    logging_guard: Option<LoggingGuard>,
}

impl CliRunner {
    /// Load configuration from `--config` or the default location, then
    /// apply environment overrides.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = ConfigFile::load(config_path)?.with_env_overrides()?;
        Ok(Self {
            config,
            logging_guard: None,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Start file and stdout logging for long-running commands.
    pub fn init_logging(&mut self) -> Result<(), CliError> {
        let guard = init_logging(&self.config.logging.directory, &self.config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;
        self.logging_guard = Some(guard);
        Ok(())
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Postserve v{}", postserve::VERSION);
        info!("Postserve CLI: {} command", command);
        if let Some(guard) = &self.logging_guard {
            info!("Logging to {}", guard.log_path().display());
        }
    }

    /// Layer file from the command line, falling back to the configuration.
    pub fn layers_path(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.server.layers.clone())
    }

    /// Load and validate the layer specification.
    pub fn load_layers(&self, override_path: Option<&Path>) -> Result<LayerSpec, CliError> {
        Ok(LayerSpec::load(&self.layers_path(override_path))?)
    }

    /// Build the multi-threaded runtime used by the server.
    pub fn runtime(&self) -> Result<tokio::runtime::Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }
}
