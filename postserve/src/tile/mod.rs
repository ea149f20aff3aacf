//! Tile request parsing and payload assembly.
//!
//! ```text
//! "/tiles/6/33/22.pbf" ──► parse_tile_path ──► TileCoord
//!                                                  │
//!                              (service: bounds, query, database)
//!                                                  │
//!           TilePayload ◄── assemble ◄── Vec<FragmentRow>
//! ```

mod assembler;
mod request;

pub use assembler::assemble;
pub use request::{
    parse_tile_index, parse_tile_indices, parse_tile_path, TileRequestError, TILE_EXTENSION,
};

use bytes::Bytes;

/// An encoded vector tile: the concatenated per-layer MVT fragments.
///
/// A zero-length payload is a valid tile with no features.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TilePayload(Bytes);

impl TilePayload {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the payload, returning the shared buffer.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Vec<u8>> for TilePayload {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}
