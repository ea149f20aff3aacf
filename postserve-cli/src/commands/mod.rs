//! CLI command implementations.
//!
//! - [`serve`] - Run the tile server (default)
//! - [`sql`] - Print the query template or a materialized tile query
//! - [`check`] - Validate the layer specification

pub mod check;
pub mod serve;
pub mod sql;
