//! Coordinate types for tile addresses and projected bounds.

use std::fmt;

use thiserror::Error;

/// Lowest zoom level in the slippy-map scheme.
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level accepted for tile requests.
///
/// At zoom 30 the grid is 2^30 tiles wide, which still fits tile indices in `u32`.
pub const MAX_ZOOM: u8 = 30;

/// Web Mercator latitude limits (degrees).
pub const MAX_LAT: f64 = 85.05112878;
pub const MIN_LAT: f64 = -85.05112878;

/// Longitude limits (degrees).
pub const MAX_LON: f64 = 180.0;
pub const MIN_LON: f64 = -180.0;

/// Errors raised while validating tile addresses or projecting coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Zoom level above [`MAX_ZOOM`].
    #[error("Invalid zoom level {0} (max {max})", max = MAX_ZOOM)]
    InvalidZoom(u8),

    /// Tile index outside the grid for its zoom level.
    #[error("Tile {x}/{y} is outside the {size}x{size} grid at zoom {zoom}")]
    OutOfRange { zoom: u8, x: u32, y: u32, size: u64 },

    /// Latitude outside the Web Mercator range, or not finite.
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180], or not finite.
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// Projected bounds that are not finite or not ordered.
    #[error("Invalid bounding box: {0}")]
    InvalidBounds(String),
}

/// A tile address in the slippy-map (XYZ) tiling scheme.
///
/// `x` increases eastward and `y` increases southward. Construction through
/// [`TileCoord::new`] guarantees `0 <= x, y < 2^zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Create a validated tile address.
    ///
    /// # Errors
    ///
    /// Returns [`CoordError::InvalidZoom`] when `zoom > MAX_ZOOM` and
    /// [`CoordError::OutOfRange`] when `x` or `y` fall outside the grid.
    pub fn new(zoom: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }

        let size = tiles_per_side(zoom);
        if u64::from(x) >= size || u64::from(y) >= size {
            return Err(CoordError::OutOfRange { zoom, x, y, size });
        }

        Ok(Self { zoom, x, y })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one side of the grid at `zoom`.
#[inline]
pub fn tiles_per_side(zoom: u8) -> u64 {
    1u64 << zoom
}

/// Geographic (EPSG:4326) bounds of a tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Projected (EPSG:3857) bounds of a tile, in metres.
///
/// Values are always finite with `west < east` and `south < north`, so they
/// can be formatted into SQL without further checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl BoundingBox {
    /// Create a bounding box, rejecting non-finite or inverted edges.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, CoordError> {
        if ![west, south, east, north].iter().all(|v| v.is_finite()) {
            return Err(CoordError::InvalidBounds(format!(
                "non-finite edge in ({}, {}, {}, {})",
                west, south, east, north
            )));
        }
        if west >= east || south >= north {
            return Err(CoordError::InvalidBounds(format!(
                "edges out of order: west={} east={} south={} north={}",
                west, east, south, north
            )));
        }

        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn north(&self) -> f64 {
        self.north
    }
}

/// Map scale denominator for a zoom level (e.g. 559082264 at zoom 0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ScaleDenominator(f64);

impl ScaleDenominator {
    pub(crate) fn new(value: f64) -> Self {
        debug_assert!(value.is_finite() && value > 0.0);
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for ScaleDenominator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
