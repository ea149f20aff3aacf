//! Postserve CLI - Command-line interface
//!
//! This binary provides a command-line interface to the Postserve library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::check::CheckArgs;
use commands::serve::ServeArgs;
use commands::sql::SqlArgs;

#[derive(Parser)]
#[command(name = "postserve")]
#[command(version = postserve::VERSION)]
#[command(about = "Serve Mapbox Vector Tiles straight from PostGIS", long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/postserve/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tile server (default when no command is given)
    Serve(ServeArgs),
    /// Print the query template, or the query for one tile
    Sql(SqlArgs),
    /// Validate the layer specification
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Some(Commands::Serve(args)) => commands::serve::run(config, args),
        Some(Commands::Sql(args)) => commands::sql::run(config, args),
        Some(Commands::Check(args)) => commands::check::run(config, args),
        None => commands::serve::run(config, ServeArgs::default()),
    };

    if let Err(e) = result {
        e.exit();
    }
}
