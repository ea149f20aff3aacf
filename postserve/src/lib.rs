//! Postserve - Mapbox Vector Tiles straight from PostGIS
//!
//! Serves `/tiles/{zoom}/{x}/{y}.pbf` by compiling a TM2Source layer
//! specification (the OpenMapTiles `data.yml`) into one SQL template at
//! startup, then materializing it per request and letting PostGIS encode
//! each layer with `ST_AsMVT`.
//!
//! # High-Level API
//!
//! ```ignore
//! use postserve::app::{AppConfig, PostserveApp};
//! use postserve::config::ConfigFile;
//!
//! let file = ConfigFile::load(None)?.with_env_overrides()?;
//! let app = PostserveApp::start(AppConfig::from_config_file(&file)).await?;
//! app.run().await?;
//! ```
//!
//! # Pipeline
//!
//! ```text
//! request path ─► tile::parse_tile_path ─► coord::tile_bounds
//!                                              │
//!      layers::LayerSpec ─► query::QueryTemplate ─► query::materialize
//!                                                        │
//!                         db::TileDatabase ◄─────────────┘
//!                                │
//!                  tile::assemble ─► HTTP response
//! ```

pub mod app;
pub mod config;
pub mod coord;
pub mod db;
pub mod layers;
pub mod logging;
pub mod query;
pub mod server;
pub mod service;
pub mod telemetry;
pub mod tile;

/// Version of the Postserve library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
