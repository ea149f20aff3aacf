//! Coordinate conversion module
//!
//! Converts slippy-map tile addresses into geographic bounds (EPSG:4326),
//! projects them into Web Mercator (EPSG:3857), and derives the cartographic
//! scale denominator used by layer queries.

mod types;

pub use types::{
    tiles_per_side, BoundingBox, CoordError, LonLatBounds, ScaleDenominator, TileCoord, MAX_LAT,
    MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// WGS84 semi-major axis used by spherical Web Mercator (metres).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Equatorial circumference of the Web Mercator plane (metres).
pub const MAP_WIDTH_IN_METRES: f64 = 40_075_016.685_578_49;

/// Reference tile width in pixels.
pub const TILE_SIZE_PX: u32 = 256;

/// OGC standardized rendering pixel size (0.28mm) in metres.
pub const STANDARDIZED_PIXEL_SIZE_M: f64 = 0.00028;

/// Computes the geographic bounds of a tile.
///
/// West/north come from the tile's own index, east/south from the index of
/// the next tile along each axis.
#[inline]
pub fn tile_lon_lat_bounds(tile: &TileCoord) -> LonLatBounds {
    let n = tiles_per_side(tile.zoom) as f64;

    LonLatBounds {
        west: tile_x_to_lon(tile.x as f64, n),
        south: tile_y_to_lat(tile.y as f64 + 1.0, n),
        east: tile_x_to_lon(tile.x as f64 + 1.0, n),
        north: tile_y_to_lat(tile.y as f64, n),
    }
}

#[inline]
fn tile_x_to_lon(x: f64, n: f64) -> f64 {
    x / n * 360.0 - 180.0
}

#[inline]
fn tile_y_to_lat(y: f64, n: f64) -> f64 {
    // Inverse Web Mercator
    let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
    lat_rad * 180.0 / PI
}

/// Projects a longitude/latitude pair (EPSG:4326) into Web Mercator (EPSG:3857).
///
/// # Errors
///
/// Returns an error instead of a NaN or infinite result when either input is
/// outside the projectable range or not finite.
#[inline]
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> Result<(f64, f64), CoordError> {
    if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if !lat.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }

    let x = lon.to_radians() * EARTH_RADIUS_M;
    let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M;

    Ok((x, y))
}

/// Computes a tile's bounding box in Web Mercator metres.
///
/// # Example
///
/// ```
/// use postserve::coord::{tile_bounds, TileCoord};
///
/// let world = tile_bounds(&TileCoord::new(0, 0, 0).unwrap()).unwrap();
/// assert!((world.west() + 20_037_508.34).abs() < 0.01);
/// assert!((world.north() - 20_037_508.34).abs() < 0.01);
/// ```
pub fn tile_bounds(tile: &TileCoord) -> Result<BoundingBox, CoordError> {
    let lnglat = tile_lon_lat_bounds(tile);

    let (west, south) = lon_lat_to_mercator(lnglat.west, lnglat.south)?;
    let (east, north) = lon_lat_to_mercator(lnglat.east, lnglat.north)?;

    BoundingBox::new(west, south, east, north)
}

/// Computes the map scale denominator for a zoom level.
///
/// Follows the Mapnik zoom-to-scale convention: map width in metres divided
/// by the map width in pixels times the standardized pixel size.
#[inline]
pub fn scale_denominator(zoom: u8) -> ScaleDenominator {
    let map_width_in_pixels = TILE_SIZE_PX as f64 * 2.0_f64.powi(zoom as i32);
    ScaleDenominator::new(MAP_WIDTH_IN_METRES / (map_width_in_pixels * STANDARDIZED_PIXEL_SIZE_M))
}
