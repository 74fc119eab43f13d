//! Tile rendering for bloom and anomaly grids.
//!
//! - [`tiles`]: slippy-map tile enumeration and inverse-sampled rendering
//! - [`colormap`]: per-layer RGBA ramps
//! - [`png`]: indexed/RGBA PNG encoder
//! - [`pyramid`]: parallel render plus bounded-concurrency writes to storage

pub mod colormap;
pub mod png;
pub mod pyramid;
pub mod tiles;

pub use colormap::{anomaly_color, bloom_color, colormap, Color};
pub use png::encode_png;
pub use pyramid::{transparent_tile, PyramidTarget, PyramidWriter};
pub use tiles::{count_tiles, enumerate_tiles, render_tile, TileSampler};
