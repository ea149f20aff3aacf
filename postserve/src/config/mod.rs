//! Configuration loading.
//!
//! Settings are layered: built-in defaults, then the optional INI file, then
//! the `POSTGRES_*` environment variables for the database section. CLI flags
//! are applied last by the caller through [`crate::app::AppConfig`].

mod database;
mod file;

pub use database::{
    DatabaseConfig, DEFAULT_DB_HOST, DEFAULT_DB_NAME, DEFAULT_DB_PASSWORD, DEFAULT_DB_PORT,
    DEFAULT_DB_USER, DEFAULT_POOL_SIZE, DEFAULT_QUERY_TIMEOUT_SECS, ENV_DB_HOST, ENV_DB_NAME,
    ENV_DB_PASSWORD, ENV_DB_PORT, ENV_DB_USER,
};
pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, LoggingSettings,
    ServerSettings, DEFAULT_LISTEN, DEFAULT_LOG_DIRECTORY, DEFAULT_LOG_FILE,
};
