//! Data-driven production lines for Batchworks.
//!
//! A line directory holds `items.{ron,toml,json}` and
//! `stations.{ron,toml,json}`. [`load_line`] reads both, registers the items
//! in file order, and resolves every station into a validated core
//! configuration.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, LineData, load_line};
