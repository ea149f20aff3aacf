//! Serve command - run the tile server until Ctrl-C.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use tracing::info;

use postserve::app::{AppConfig, PostserveApp};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the serve command.
#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Layer specification file (TM2Source YAML)
    #[arg(long)]
    pub layers: Option<PathBuf>,

    /// Address to listen on (e.g. 0.0.0.0:8080)
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Maximum number of pooled database connections
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub pool_size: Option<u32>,

    /// Per-tile database deadline in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub query_timeout: Option<u64>,

    /// Start without checking that the database is reachable
    #[arg(long)]
    pub no_db_check: bool,
}

impl ServeArgs {
    /// Layer CLI flags over the configuration file settings.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(layers) = &self.layers {
            config = config.with_layers_path(layers);
        }
        if let Some(listen) = self.listen {
            config = config.with_listen(listen);
        }
        if let Some(size) = self.pool_size {
            config = config.with_pool_size(size as usize);
        }
        if let Some(secs) = self.query_timeout {
            config = config.with_query_timeout(Duration::from_secs(secs));
        }
        if self.no_db_check {
            config = config.with_connect_on_start(false);
        }
        config
    }
}

/// Run the serve command.
pub fn run(config_path: Option<&Path>, args: ServeArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(config_path)?;
    runner.init_logging()?;
    runner.log_startup("serve");

    let config = args.apply(AppConfig::from_config_file(runner.config()));
    let runtime = runner.runtime()?;

    let summary = runtime.block_on(async {
        let app = PostserveApp::start(config).await?;
        println!(
            "Serving {} layers on http://{}/tiles/{{z}}/{{x}}/{{y}}.pbf (Ctrl-C to stop)",
            app.layer_count(),
            app.config().listen
        );
        app.run().await
    })?;

    info!(
        tiles = summary.tiles_served,
        errors = summary.client_errors + summary.server_errors,
        "Postserve stopped"
    );
    println!();
    print!("{}", summary);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_keeps_config() {
        let config = AppConfig::default();
        assert_eq!(ServeArgs::default().apply(config.clone()), config);
    }

    #[test]
    fn test_flags_override_config() {
        let args = ServeArgs {
            layers: Some(PathBuf::from("/tmp/data.yml")),
            listen: Some("127.0.0.1:9999".parse().unwrap()),
            pool_size: Some(3),
            query_timeout: Some(12),
            no_db_check: true,
        };

        let config = args.apply(AppConfig::default());

        assert_eq!(config.layers_path, PathBuf::from("/tmp/data.yml"));
        assert_eq!(config.listen.port(), 9999);
        assert_eq!(config.database.pool_size, 3);
        assert_eq!(config.database.query_timeout, Duration::from_secs(12));
        assert!(!config.database.connect_on_start);
    }
}
