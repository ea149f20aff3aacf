//! Per-request token substitution.
//!
//! Only typed values reach this module: a [`BoundingBox`] whose edges are
//! guaranteed finite and a [`ScaleDenominator`]. They are written with
//! `f64`'s `Display`, which never produces exponents, so no request text
//! can end up in the SQL.

use super::{
    QueryTemplate, BBOX_TOKEN, PIXEL_HEIGHT_TOKEN, PIXEL_WIDTH_TOKEN, SCALE_DENOMINATOR_TOKEN,
};
use crate::coord::{BoundingBox, ScaleDenominator, TILE_SIZE_PX};

/// Build the `box2d` expression for a bounding box.
///
/// ```
/// use postserve::coord::BoundingBox;
/// use postserve::query::bbox_expression;
///
/// let bbox = BoundingBox::new(-1.5, -2.0, 3.0, 4.25).unwrap();
/// assert_eq!(
///     bbox_expression(&bbox),
///     "ST_MakeBox2D(ST_Point(-1.5, -2), ST_Point(3, 4.25))"
/// );
/// ```
pub fn bbox_expression(bbox: &BoundingBox) -> String {
    format!(
        "ST_MakeBox2D(ST_Point({}, {}), ST_Point({}, {}))",
        bbox.west(),
        bbox.south(),
        bbox.east(),
        bbox.north()
    )
}

/// Substitute every placeholder token in the template.
///
/// Tokens are disjoint strings, so the replacement order does not matter.
pub fn materialize(
    template: &QueryTemplate,
    bbox: &BoundingBox,
    scale_denominator: ScaleDenominator,
) -> String {
    let pixel_size = TILE_SIZE_PX.to_string();

    template
        .as_str()
        .replace(BBOX_TOKEN, &bbox_expression(bbox))
        .replace(SCALE_DENOMINATOR_TOKEN, &scale_denominator.to_string())
        .replace(PIXEL_WIDTH_TOKEN, &pixel_size)
        .replace(PIXEL_HEIGHT_TOKEN, &pixel_size)
}
