//! Configuration file handling for `config.ini`.
//!
//! A missing file is not an error: every setting has a default matching
//! the stock OpenMapTiles container setup.

use ini::{Ini, Properties};
use std::fmt::Display;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use super::DatabaseConfig;
use crate::layers::DEFAULT_LAYERS_PATH;

pub const DEFAULT_LISTEN: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8080));
pub const DEFAULT_LOG_DIRECTORY: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "postserve.log";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// An explicitly requested config file does not exist
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub listen: SocketAddr,
    pub layers: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN,
            layers: PathBuf::from(DEFAULT_LAYERS_PATH),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub database: DatabaseConfig,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from an explicit path, or from the default location.
    ///
    /// An explicit path must exist; the default location may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigFileError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigFileError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from(path),
            None => Self::load_from(&config_file_path()),
        }
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Apply `POSTGRES_*` environment overrides to the database section.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigFileError> {
        self.database = self.database.apply_env()?;
        Ok(self)
    }
}

fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("server")) {
        if let Some(listen) = parse_value(section, "server", "listen", "must be HOST:PORT")? {
            config.server.listen = listen;
        }
        if let Some(layers) = section.get("layers") {
            config.server.layers = PathBuf::from(layers);
        }
    }

    if let Some(section) = ini.section(Some("database")) {
        let db = &mut config.database;
        if let Some(host) = section.get("host") {
            db.host = host.to_string();
        }
        if let Some(port) = parse_value(section, "database", "port", "must be a port number")? {
            db.port = port;
        }
        if let Some(dbname) = section.get("dbname") {
            db.dbname = dbname.to_string();
        }
        if let Some(user) = section.get("user") {
            db.user = user.to_string();
        }
        if let Some(password) = section.get("password") {
            db.password = password.to_string();
        }
        if let Some(size) =
            parse_value::<usize>(section, "database", "pool_size", "must be a positive integer")?
        {
            if size == 0 {
                return Err(invalid("database", "pool_size", "0", "must be at least 1"));
            }
            db.pool_size = size;
        }
        if let Some(secs) =
            parse_value::<u64>(section, "database", "query_timeout", "must be whole seconds")?
        {
            if secs == 0 {
                return Err(invalid("database", "query_timeout", "0", "must be at least 1"));
            }
            db.query_timeout = Duration::from_secs(secs);
        }
        if let Some(check) =
            parse_value(section, "database", "connect_on_start", "must be true or false")?
        {
            db.connect_on_start = check;
        }
    }

    if let Some(section) = ini.section(Some("logging")) {
        if let Some(directory) = section.get("directory") {
            config.logging.directory = PathBuf::from(directory);
        }
        if let Some(file) = section.get("file") {
            config.logging.file = file.to_string();
        }
    }

    Ok(config)
}

/// Parse an optional key, reporting failures with their location.
fn parse_value<T>(
    section: &Properties,
    section_name: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError>
where
    T: FromStr,
    T::Err: Display,
{
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| invalid(section_name, key, raw, &format!("{} ({})", reason, e))),
    }
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Get the path to the config directory (`<config dir>/postserve`).
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("postserve")
}

/// Get the path to the config file (`<config dir>/postserve/config.ini`).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.server.listen, DEFAULT_LISTEN);
        assert_eq!(config.server.listen.to_string(), "0.0.0.0:8080");
        assert_eq!(config.server.layers, PathBuf::from("/mapping/data.yml"));
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.logging.directory, PathBuf::from("logs"));
        assert_eq!(config.logging.file, "postserve.log");
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let result = ConfigFile::load(Some(&config_path));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_load_full_file() {
        let (_dir, path) = write_config(
            "[server]\n\
             listen = 127.0.0.1:9000\n\
             layers = /srv/tiles/data.yml\n\
             \n\
             [database]\n\
             host = localhost\n\
             port = 5433\n\
             dbname = gis\n\
             user = reader\n\
             password = s3cret\n\
             pool_size = 4\n\
             query_timeout = 10\n\
             connect_on_start = false\n\
             \n\
             [logging]\n\
             directory = /var/log/postserve\n\
             file = tiles.log\n",
        );

        let config = ConfigFile::load_from(&path).unwrap();

        assert_eq!(config.server.listen.to_string(), "127.0.0.1:9000");
        assert_eq!(config.server.layers, PathBuf::from("/srv/tiles/data.yml"));
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5433);
        assert_eq!(config.database.dbname, "gis");
        assert_eq!(config.database.user, "reader");
        assert_eq!(config.database.password, "s3cret");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.database.query_timeout, Duration::from_secs(10));
        assert!(!config.database.connect_on_start);
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/postserve"));
        assert_eq!(config.logging.file, "tiles.log");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let (_dir, path) = write_config("[database]\nhost = localhost\n");

        let config = ConfigFile::load_from(&path).unwrap();

        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.server, ServerSettings::default());
    }

    #[test]
    fn test_invalid_port() {
        let (_dir, path) = write_config("[database]\nport = abc\n");

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigFileError::InvalidValue { ref section, ref key, ref value, .. }
                if section == "database" && key == "port" && value == "abc"
        ));
    }

    #[test]
    fn test_invalid_listen_address() {
        let (_dir, path) = write_config("[server]\nlisten = not-an-address\n");

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration: server.listen"));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let (_dir, path) = write_config("[database]\npool_size = 0\n");

        assert!(matches!(
            ConfigFile::load_from(&path),
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with("postserve/config.ini"));
    }
}
