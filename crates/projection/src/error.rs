//! Projection errors.

use bloom_common::{BloomError, Epsg};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("{0} is not in the crs-definitions database")]
    UnknownCrs(Epsg),

    #[error("invalid projection definition for {epsg}: {message}")]
    InvalidDefinition { epsg: Epsg, message: String },

    #[error("transform from {from} to {to} failed for ({x}, {y}): {message}")]
    TransformFailed {
        from: Epsg,
        to: Epsg,
        x: f64,
        y: f64,
        message: String,
    },
}

impl From<ProjectionError> for BloomError {
    fn from(err: ProjectionError) -> Self {
        BloomError::Reprojection(err.to_string())
    }
}
