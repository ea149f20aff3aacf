//! Concatenation of per-layer fragments into one tile.

use super::TilePayload;
use crate::db::FragmentRow;

/// Concatenate every non-null fragment, in row order then column order.
///
/// Each fragment is a complete MVT layer message, and a tile is a plain
/// sequence of layer messages, so no re-encoding is needed.
///
/// # Example
///
/// ```
/// use postserve::tile::assemble;
///
/// let rows = vec![vec![Some(b"water".to_vec())], vec![None], vec![Some(b"roads".to_vec())]];
/// assert_eq!(assemble(rows).as_bytes(), b"waterroads");
/// ```
pub fn assemble(rows: Vec<FragmentRow>) -> TilePayload {
    let total: usize = rows.iter().flatten().flatten().map(Vec::len).sum();

    let mut buffer = Vec::with_capacity(total);
    for fragment in rows.into_iter().flatten().flatten() {
        buffer.extend_from_slice(&fragment);
    }

    TilePayload::from(buffer)
}
