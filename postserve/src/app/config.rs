//! Application configuration for `PostserveApp`.
//!
//! `AppConfig` is the fully resolved configuration handed to
//! [`super::PostserveApp::start`]: the config file and environment have
//! already been applied, and CLI flags are layered on with the `with_*`
//! builder methods.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ConfigFile, DatabaseConfig, ServerSettings};

/// Application configuration combining all component configs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub listen: SocketAddr,

    /// Layer specification document.
    pub layers_path: PathBuf,

    /// Database connection and pool settings.
    pub database: DatabaseConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let server = ServerSettings::default();
        Self {
            listen: server.listen,
            layers_path: server.layers,
            database: DatabaseConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create application config from a loaded configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            listen: config.server.listen,
            layers_path: config.server.layers.clone(),
            database: config.database.clone(),
        }
    }

    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    pub fn with_layers_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.layers_path = path.into();
        self
    }

    /// Set the maximum number of pooled database connections.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.database.pool_size = size;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.database.query_timeout = timeout;
        self
    }

    /// Enable or disable the startup connectivity check.
    pub fn with_connect_on_start(mut self, check: bool) -> Self {
        self.database.connect_on_start = check;
        self
    }
}
