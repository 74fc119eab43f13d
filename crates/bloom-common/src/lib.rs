//! Common types and utilities shared across the bloom pipeline crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod layer;
pub mod meta;
pub mod scene;
pub mod tile;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::Epsg;
pub use error::{BloomError, BloomResult};
pub use grid::{BandSet, Baseline, Grid, GridGeometry, Mask, NODATA_MARKER};
pub use layer::LayerKind;
pub use meta::{round_to, BaselineDescriptor, DateRecord, JobInput, Thresholds, TimeseriesPoint};
pub use scene::{BandRole, Scene, SceneAsset};
pub use tile::{TileCoord, TILE_SIZE};
pub use time::{date_series, parse_date, search_window, DateWindow, DATE_FORMAT};
