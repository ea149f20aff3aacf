//! SQL command - print the generated query for offline debugging.

use std::path::{Path, PathBuf};

use clap::Args;

use postserve::coord::{scale_denominator, tile_bounds};
use postserve::query::{materialize, QueryTemplate};
use postserve::tile::{parse_tile_indices, TileRequestError};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the sql command.
#[derive(Debug, Args)]
pub struct SqlArgs {
    /// Layer specification file (TM2Source YAML)
    #[arg(long)]
    pub layers: Option<PathBuf>,

    /// Zoom level; with X and Y, print the query for that tile
    #[arg(requires_all = ["x", "y"])]
    pub zoom: Option<String>,

    /// Tile column
    pub x: Option<String>,

    /// Tile row
    pub y: Option<String>,
}

/// Run the sql command.
pub fn run(config_path: Option<&Path>, args: SqlArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    let spec = runner.load_layers(args.layers.as_deref())?;
    let template = QueryTemplate::build(&spec);

    println!("{}", render(&template, &args)?);
    Ok(())
}

/// The template itself, or the query for the requested tile.
fn render(template: &QueryTemplate, args: &SqlArgs) -> Result<String, CliError> {
    match (&args.zoom, &args.x, &args.y) {
        (Some(zoom), Some(x), Some(y)) => {
            let tile = parse_tile_indices(zoom, x, y)?;
            let bbox = tile_bounds(&tile).map_err(TileRequestError::from)?;
            Ok(materialize(template, &bbox, scale_denominator(tile.zoom)))
        }
        _ => Ok(template.to_string()),
    }
}
