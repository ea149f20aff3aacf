//! Check command - validate the layer specification.

use std::path::{Path, PathBuf};

use clap::Args;

use postserve::layers::LayerSpec;
use postserve::query::QueryTemplate;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the check command.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Layer specification file (TM2Source YAML)
    #[arg(long)]
    pub layers: Option<PathBuf>,
}

/// Run the check command.
pub fn run(config_path: Option<&Path>, args: CheckArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path)?;
    let path = runner.layers_path(args.layers.as_deref());
    let spec = runner.load_layers(Some(&path))?;

    println!("{}", path.display());
    print!("{}", report(&spec));
    Ok(())
}

/// One line per layer plus a summary.
fn report(spec: &LayerSpec) -> String {
    let width = spec
        .layers()
        .iter()
        .map(|layer| layer.id().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for layer in spec.layers() {
        out.push_str(&format!(
            "  {:<width$}  buffer {:>4}  {} columns\n",
            layer.id(),
            layer.buffer_size(),
            layer.fragment().projection().len(),
            width = width
        ));
    }

    let template = QueryTemplate::build(spec);
    out.push_str(&format!(
        "OK: {} layers, template {} bytes\n",
        template.layer_count(),
        template.as_str().len()
    ));
    out
}
