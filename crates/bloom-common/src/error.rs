//! Error types for the bloom pipeline.

use thiserror::Error;

/// Result type alias using BloomError.
pub type BloomResult<T> = Result<T, BloomError>;

/// Primary error type for pipeline operations.
#[derive(Debug, Error)]
pub enum BloomError {
    // === Catalog / Scene Errors ===
    #[error("Scene search failed: {0}")]
    SceneSearch(String),

    #[error("Scene {scene_id} is missing required bands: {}", missing.join(", "))]
    MissingBand {
        scene_id: String,
        missing: Vec<String>,
    },

    // === Raster Errors ===
    #[error("Failed to read raster {href}: {message}")]
    RasterRead { href: String, message: String },

    #[error("Reprojection failed: {0}")]
    Reprojection(String),

    #[error(
        "Grid shape mismatch: expected {}x{}, got {}x{}",
        expected.0, expected.1, actual.0, actual.1
    )]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    // === Output Errors ===
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    // === Input Errors ===
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BloomError {
    /// Create a RasterRead error.
    pub fn raster_read(href: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RasterRead {
            href: href.into(),
            message: message.into(),
        }
    }

    /// Create a ShapeMismatch error from two (width, height) pairs.
    pub fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    /// Short machine-friendly label, used for metrics and date records.
    pub fn kind(&self) -> &'static str {
        match self {
            BloomError::SceneSearch(_) => "scene_search",
            BloomError::MissingBand { .. } => "missing_band",
            BloomError::RasterRead { .. } => "raster_read",
            BloomError::Reprojection(_) => "reprojection",
            BloomError::ShapeMismatch { .. } => "shape_mismatch",
            BloomError::Storage(_) => "storage",
            BloomError::Encode(_) => "encode",
            BloomError::InvalidInput(_) => "invalid_input",
            BloomError::Config(_) => "config",
        }
    }
}

impl From<std::io::Error> for BloomError {
    fn from(err: std::io::Error) -> Self {
        BloomError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for BloomError {
    fn from(err: serde_json::Error) -> Self {
        BloomError::InvalidInput(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_band_message_lists_bands() {
        let err = BloomError::MissingBand {
            scene_id: "S2A_10SFH".to_string(),
            missing: vec!["B05".to_string(), "SCL".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Scene S2A_10SFH is missing required bands: B05, SCL"
        );
        assert_eq!(err.kind(), "missing_band");
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = BloomError::shape_mismatch((4, 3), (2, 2));
        assert_eq!(err.to_string(), "Grid shape mismatch: expected 4x3, got 2x2");
    }
}
