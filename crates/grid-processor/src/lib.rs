//! Numeric kernels of the bloom pipeline.
//!
//! Everything here is synchronous and allocation-light: the crate takes
//! aligned [`Grid`](bloom_common::Grid)s and [`Mask`](bloom_common::Mask)s
//! and produces new grids.
//!
//! ```text
//! BandSet ──► mask::build_valid_mask ──► mask::apply_mask
//!                                            │
//!                                            ▼
//!                                  index::compute_index ──► history
//!                                            │                 │
//!                                            ▼                 ▼
//!                                     index::delta   baseline::rolling_baseline
//!                                            │                 │
//!                                            │          index::z_score
//!                                            ▼                 │
//!                                   index::bloom_score ◄───────┘
//! ```
//!
//! Missing samples are NaN and propagate through every operation.

pub mod baseline;
pub mod config;
pub mod index;
pub mod mask;
pub mod resample;

pub use baseline::rolling_baseline;
pub use config::IndexConfig;
pub use index::{bloom_score, bloom_score_with, compute_index, delta, z_score};
pub use mask::{apply_mask, build_valid_mask, cloud_fraction, SclClass};
pub use resample::{
    bilinear_interpolate, resample_bilinear, resample_grid_bilinear, resample_mask_nearest,
    resample_nearest,
};
