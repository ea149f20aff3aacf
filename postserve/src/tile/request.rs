//! Tile request path parsing.
//!
//! Turns the raw `{zoom}/{x}/{y}.pbf` path segments into a validated
//! [`TileCoord`]. Nothing from the request text survives past this point:
//! the rest of the pipeline only sees typed integers.

use thiserror::Error;

use crate::coord::{CoordError, TileCoord};

/// Extension required on the last path segment.
pub const TILE_EXTENSION: &str = ".pbf";

/// Errors raised while parsing a tile request path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileRequestError {
    /// The `y` segment does not end in `.pbf`.
    #[error("Tile path must end in .pbf: '{0}'")]
    MissingExtension(String),

    /// A segment is not a number at all.
    #[error("Invalid {field} '{value}': not a number")]
    NotNumeric { field: &'static str, value: String },

    /// A segment is a negative number.
    #[error("Invalid {field} '{value}': must not be negative")]
    Negative { field: &'static str, value: String },

    /// A segment has a fractional part.
    #[error("Invalid {field} '{value}': must be a whole number")]
    Fractional { field: &'static str, value: String },

    /// A segment exceeds the representable range.
    #[error("Invalid {field} '{value}': too large")]
    TooLarge { field: &'static str, value: String },

    /// The indices are well formed but outside the tile grid.
    #[error(transparent)]
    OutOfRange(#[from] CoordError),
}

/// Parse one non-negative tile index.
///
/// Plain integers are accepted, as are numbers written in float notation
/// when their value is integral (`"3.0"`). Anything else is rejected.
///
/// # Example
///
/// ```
/// use postserve::tile::parse_tile_index;
///
/// assert_eq!(parse_tile_index("x", "17").unwrap(), 17);
/// assert_eq!(parse_tile_index("x", "3.0").unwrap(), 3);
/// assert!(parse_tile_index("x", "3.5").is_err());
/// assert!(parse_tile_index("x", "abc").is_err());
/// ```
pub fn parse_tile_index(field: &'static str, value: &str) -> Result<u32, TileRequestError> {
    if let Ok(index) = value.parse::<u32>() {
        return Ok(index);
    }

    let number: f64 = value
        .parse()
        .ok()
        .filter(|n: &f64| n.is_finite())
        .ok_or_else(|| TileRequestError::NotNumeric {
            field,
            value: value.to_string(),
        })?;

    if number < 0.0 {
        return Err(TileRequestError::Negative {
            field,
            value: value.to_string(),
        });
    }
    if number.fract() != 0.0 {
        return Err(TileRequestError::Fractional {
            field,
            value: value.to_string(),
        });
    }
    if number > u32::MAX as f64 {
        return Err(TileRequestError::TooLarge {
            field,
            value: value.to_string(),
        });
    }

    Ok(number as u32)
}

/// Parse the three path segments of a tile request.
///
/// The last segment must carry the `.pbf` extension. Range checks against
/// the zoom level are delegated to [`TileCoord::new`].
///
/// # Example
///
/// ```
/// use postserve::tile::parse_tile_path;
///
/// let tile = parse_tile_path("14", "8529", "5974.pbf").unwrap();
/// assert_eq!(tile.to_string(), "14/8529/5974");
///
/// assert!(parse_tile_path("1", "2", "0.pbf").is_err()); // x >= 2^1
/// ```
pub fn parse_tile_path(zoom: &str, x: &str, y_with_ext: &str) -> Result<TileCoord, TileRequestError> {
    let y = y_with_ext
        .strip_suffix(TILE_EXTENSION)
        .ok_or_else(|| TileRequestError::MissingExtension(y_with_ext.to_string()))?;

    parse_tile_indices(zoom, x, y)
}

/// Parse a `zoom`/`x`/`y` triple into a validated tile address.
pub fn parse_tile_indices(zoom: &str, x: &str, y: &str) -> Result<TileCoord, TileRequestError> {
    let zoom_index = parse_tile_index("zoom", zoom)?;
    let zoom = u8::try_from(zoom_index).map_err(|_| TileRequestError::TooLarge {
        field: "zoom",
        value: zoom.to_string(),
    })?;
    let x = parse_tile_index("x", x)?;
    let y = parse_tile_index("y", y)?;

    Ok(TileCoord::new(zoom, x, y)?)
}
