//! SQL query construction.
//!
//! The layer specification is compiled once into a [`QueryTemplate`] holding
//! placeholder tokens. Each request then [`materialize`]s the template with
//! the tile's bounding box and scale denominator.
//!
//! ```text
//! LayerSpec ──build (startup)──► QueryTemplate ──materialize (per tile)──► SQL
//! ```

mod materialize;
mod template;

pub use materialize::{bbox_expression, materialize};
pub use template::QueryTemplate;

/// Placeholder for the tile bounding box (a `box2d` expression).
pub const BBOX_TOKEN: &str = "!bbox!";

/// Placeholder for the map scale denominator.
pub const SCALE_DENOMINATOR_TOKEN: &str = "!scale_denominator!";

/// Placeholder for the tile width in pixels.
pub const PIXEL_WIDTH_TOKEN: &str = "!pixel_width!";

/// Placeholder for the tile height in pixels.
pub const PIXEL_HEIGHT_TOKEN: &str = "!pixel_height!";

/// All placeholder tokens recognised in templates.
pub const TOKENS: [&str; 4] = [
    BBOX_TOKEN,
    SCALE_DENOMINATOR_TOKEN,
    PIXEL_WIDTH_TOKEN,
    PIXEL_HEIGHT_TOKEN,
];

/// MVT tile extent in integer geometry units.
pub const MVT_EXTENT: u32 = 4096;

/// Column name carrying the clipped tile geometry.
pub const MVT_GEOMETRY_COLUMN: &str = "mvtgeometry";
