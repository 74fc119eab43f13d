//! Coordinate reference system transformations.
//!
//! Web Mercator tiling math is implemented directly since it sits in the
//! per-pixel rendering loop. Transforms between arbitrary EPSG codes (the
//! UTM zones scene rasters are delivered in) go through proj4rs with
//! definitions from the crs-definitions database.

pub mod error;
pub mod mercator;
pub mod transform;

pub use error::ProjectionError;
pub use mercator::{
    lon_lat_to_mercator, lon_lat_to_tile, mercator_to_lon_lat, tile_bounds, MAX_LATITUDE,
    ORIGIN_SHIFT,
};
pub use transform::CrsTransformer;
