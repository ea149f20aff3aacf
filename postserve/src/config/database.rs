//! Database connection settings.

use std::time::Duration;

use super::ConfigFileError;

pub const DEFAULT_DB_HOST: &str = "postgres";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_NAME: &str = "openmaptiles";
pub const DEFAULT_DB_USER: &str = "openmaptiles";
pub const DEFAULT_DB_PASSWORD: &str = "openmaptiles";
pub const DEFAULT_POOL_SIZE: usize = 16;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

pub const ENV_DB_HOST: &str = "POSTGRES_HOST";
pub const ENV_DB_PORT: &str = "POSTGRES_PORT";
pub const ENV_DB_NAME: &str = "POSTGRES_DB";
pub const ENV_DB_USER: &str = "POSTGRES_USER";
pub const ENV_DB_PASSWORD: &str = "POSTGRES_PASSWORD";

/// Connection parameters for the geometry database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum number of pooled connections
    pub pool_size: usize,
    /// Deadline for pool checkout and query execution
    pub query_timeout: Duration,
    /// Verify connectivity before accepting requests
    pub connect_on_start: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            dbname: DEFAULT_DB_NAME.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: DEFAULT_DB_PASSWORD.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            connect_on_start: true,
        }
    }
}

impl DatabaseConfig {
    /// Override connection fields from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigFileError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Override connection fields from an arbitrary variable source.
    ///
    /// Unset variables leave the current value in place.
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigFileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_DB_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_DB_PORT) {
            self.port = port.trim().parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "env".to_string(),
                key: ENV_DB_PORT.to_string(),
                value: port.clone(),
                reason: "must be a port number (0-65535)".to_string(),
            })?;
        }
        if let Some(dbname) = lookup(ENV_DB_NAME) {
            self.dbname = dbname;
        }
        if let Some(user) = lookup(ENV_DB_USER) {
            self.user = user;
        }
        if let Some(password) = lookup(ENV_DB_PASSWORD) {
            self.password = password;
        }
        Ok(self)
    }

    /// Connection URL with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        format!(
            "postgresql://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.dbname
        )
    }
}
