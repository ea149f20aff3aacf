//! Application bootstrap and lifecycle management.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        PostserveApp                          │
//! │                                                              │
//! │  1. LayerSpec ──────► QueryTemplate   (built once, shared)   │
//! │  2. PgTileDatabase    (deadpool pool, optional ping)         │
//! │  3. TileService ────► axum Router ──► TcpListener            │
//! │                                                              │
//! │  Ctrl-C ──► CancellationToken ──► graceful shutdown          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::PostserveApp;
pub use config::AppConfig;
pub use error::AppError;
