//! Band reading and alignment.
//!
//! Turns a catalog [`Scene`](bloom_common::Scene) into a co-registered
//! [`BandSet`](bloom_common::BandSet):
//!
//! - href resolution and ranged, block-cached reads through `object_store`
//! - GeoTIFF header parsing (tiepoint, pixel scale, GeoKey EPSG)
//! - query bbox reprojection into each band's native CRS and pixel windowing
//! - resampling onto the finest band's grid

pub mod aligner;
pub mod config;
pub mod error;
pub mod geotiff;
pub mod range_reader;
pub mod source;
pub mod window;

// Re-exports
pub use aligner::BandAligner;
pub use config::{ReprojectionPolicy, DEFAULT_BLOCK_SIZE};
pub use error::{IngestionError, Result};
pub use range_reader::RangeReader;
pub use source::{GeoTiffBand, ObjectStoreSource, RasterBand, RasterSource};
pub use window::{PixelWindow, RasterInfo};
