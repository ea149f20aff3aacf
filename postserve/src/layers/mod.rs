//! Layer specification loading.
//!
//! Reads the TM2Source-style YAML document (the `data.yml` shipped with
//! OpenMapTiles) and validates it into an ordered, immutable [`LayerSpec`].
//! Only the keys the tile pipeline needs are read:
//!
//! ```yaml
//! Layer:
//!   - id: water
//!     properties:
//!       buffer-size: 4
//!     Datasource:
//!       table: "(SELECT geometry, class FROM layer_water(!bbox!, z(!scale_denominator!))) AS t"
//! ```
//!
//! Everything else in the document (descriptions, field docs, srs strings)
//! is ignored. Any problem is reported as a [`LayerError`] so the server
//! refuses to start instead of serving broken tiles.

mod fragment;

pub use fragment::{parse_fragment, FragmentError, LayerFragment, GEOMETRY_COLUMN};

use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;
use thiserror::Error;

/// Default location of the layer specification inside the container image.
pub const DEFAULT_LAYERS_PATH: &str = "/mapping/data.yml";

/// Errors raised while loading a layer specification.
#[derive(Debug, Error)]
pub enum LayerError {
    /// The file could not be read.
    #[error("Failed to read layer file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or lacks required keys.
    #[error("Invalid layer document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document declares no layers.
    #[error("Layer document declares no layers")]
    Empty,

    /// A layer id is empty or contains characters outside `[A-Za-z0-9_.-]`.
    #[error("Invalid layer id '{0}' (allowed: letters, digits, '_', '-', '.')")]
    InvalidId(String),

    /// Two layers share an id.
    #[error("Duplicate layer id '{0}'")]
    DuplicateId(String),

    /// A layer's datasource could not be parsed.
    #[error("Layer '{layer}': {source}")]
    Fragment {
        layer: String,
        #[source]
        source: FragmentError,
    },
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "Layer")]
    layers: Vec<RawLayer>,
}

#[derive(Debug, Deserialize)]
struct RawLayer {
    id: String,
    properties: RawProperties,
    #[serde(rename = "Datasource")]
    datasource: RawDatasource,
}

#[derive(Debug, Deserialize)]
struct RawProperties {
    #[serde(rename = "buffer-size")]
    buffer_size: u32,
}

#[derive(Debug, Deserialize)]
struct RawDatasource {
    table: String,
}

/// A single validated layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    id: String,
    buffer_size: u32,
    fragment: LayerFragment,
}

impl Layer {
    /// Layer name as it appears in the encoded tile.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Geometry buffer around the tile, in tile pixels.
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// Parsed datasource query.
    pub fn fragment(&self) -> &LayerFragment {
        &self.fragment
    }
}

/// Ordered set of layers loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSpec {
    layers: Vec<Layer>,
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap())
}

impl LayerSpec {
    /// Load and validate a layer specification file.
    pub fn load(path: &Path) -> Result<Self, LayerError> {
        let text = std::fs::read_to_string(path).map_err(|source| LayerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate a layer specification from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, LayerError> {
        let document: RawDocument = serde_yaml::from_str(text)?;
        Self::from_raw(document)
    }

    fn from_raw(document: RawDocument) -> Result<Self, LayerError> {
        if document.layers.is_empty() {
            return Err(LayerError::Empty);
        }

        let mut seen = HashSet::new();
        let mut layers = Vec::with_capacity(document.layers.len());

        for raw in document.layers {
            if !id_pattern().is_match(&raw.id) {
                return Err(LayerError::InvalidId(raw.id));
            }
            if !seen.insert(raw.id.clone()) {
                return Err(LayerError::DuplicateId(raw.id));
            }

            let fragment =
                parse_fragment(&raw.datasource.table).map_err(|source| LayerError::Fragment {
                    layer: raw.id.clone(),
                    source,
                })?;

            layers.push(Layer {
                id: raw.id,
                buffer_size: raw.properties.buffer_size,
                fragment,
            });
        }

        Ok(Self { layers })
    }

    /// Layers in document order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_LAYERS: &str = r#"
name: OpenMapTiles
description: "A tileset showcasing all layers"
Layer:
  - id: water
    description: Water polygons
    srid: 900913
    properties:
      minzoom: 0
      maxzoom: 14
      buffer-size: 4
    Datasource:
      type: postgis
      table: "(SELECT geometry, class FROM layer_water(!bbox!, z(!scale_denominator!))) AS t"
  - id: transportation_name
    properties:
      buffer-size: 8
    Datasource:
      table: |-
        (SELECT geometry, name, ref
         FROM layer_transportation_name(!bbox!, z(!scale_denominator!))
        ) AS t
"#;

    #[test]
    fn test_loads_layers_in_document_order() {
        let spec = LayerSpec::from_yaml_str(TWO_LAYERS).unwrap();

        assert_eq!(spec.len(), 2);
        assert_eq!(spec.layers()[0].id(), "water");
        assert_eq!(spec.layers()[0].buffer_size(), 4);
        assert_eq!(spec.layers()[1].id(), "transportation_name");
        assert_eq!(spec.layers()[1].buffer_size(), 8);
        assert_eq!(
            spec.layers()[1].fragment().projection(),
            &["geometry", "name", "ref"]
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_LAYERS.as_bytes()).unwrap();

        let spec = LayerSpec::load(file.path()).unwrap();
        assert_eq!(spec.len(), 2);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = LayerSpec::load(&dir.path().join("missing.yml"));
        assert!(matches!(result, Err(LayerError::Read { .. })));
    }

    #[test]
    fn test_empty_layer_list_rejected() {
        let result = LayerSpec::from_yaml_str("Layer: []");
        assert!(matches!(result, Err(LayerError::Empty)));
    }

    #[test]
    fn test_missing_layer_key_is_parse_error() {
        let result = LayerSpec::from_yaml_str("name: nothing here");
        assert!(matches!(result, Err(LayerError::Parse(_))));
    }

    #[test]
    fn test_negative_buffer_size_is_parse_error() {
        let yaml = r#"
Layer:
  - id: water
    properties:
      buffer-size: -4
    Datasource:
      table: "(SELECT geometry FROM water) AS t"
"#;
        assert!(matches!(
            LayerSpec::from_yaml_str(yaml),
            Err(LayerError::Parse(_))
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let yaml = r#"
Layer:
  - id: water
    properties: { buffer-size: 4 }
    Datasource: { table: "(SELECT geometry FROM a) AS t" }
  - id: water
    properties: { buffer-size: 4 }
    Datasource: { table: "(SELECT geometry FROM b) AS t" }
"#;
        let err = LayerSpec::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, LayerError::DuplicateId(ref id) if id == "water"));
    }

    #[test]
    fn test_quote_in_id_rejected() {
        let yaml = r#"
Layer:
  - id: "wat'er"
    properties: { buffer-size: 4 }
    Datasource: { table: "(SELECT geometry FROM a) AS t" }
"#;
        assert!(matches!(
            LayerSpec::from_yaml_str(yaml),
            Err(LayerError::InvalidId(_))
        ));
    }

    #[test]
    fn test_malformed_fragment_names_layer() {
        let yaml = r#"
Layer:
  - id: broken
    properties: { buffer-size: 4 }
    Datasource: { table: "SELECT geometry FROM a" }
"#;
        let err = LayerSpec::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(
            err,
            LayerError::Fragment {
                ref layer,
                source: FragmentError::MissingSubquery
            } if layer == "broken"
        ));
        assert!(err.to_string().starts_with("Layer 'broken':"));
    }

    #[test]
    fn test_union_datasource_rejected_at_load() {
        let yaml = r#"
Layer:
  - id: water
    properties: { buffer-size: 4 }
    Datasource: { table: "(SELECT geometry, name FROM lakes UNION ALL SELECT geometry, name FROM rivers) AS t" }
"#;
        assert!(matches!(
            LayerSpec::from_yaml_str(yaml),
            Err(LayerError::Fragment {
                source: FragmentError::SetOperation(_),
                ..
            })
        ));
    }
}
