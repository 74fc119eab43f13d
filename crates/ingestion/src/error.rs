//! Error types for the ingestion crate.

use thiserror::Error;

use bloom_common::BloomError;

/// Errors raised while reading a raster.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to decode TIFF: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Object store error: {0}")]
    Store(#[from] object_store::Error),

    #[error("Missing required metadata: {0}")]
    MissingMetadata(String),

    #[error("Unsupported raster layout: {0}")]
    Unsupported(String),

    #[error("Unsupported href: {0}")]
    InvalidHref(String),
}

impl IngestionError {
    /// Attach the href being read and convert to the pipeline error.
    pub fn into_bloom(self, href: &str) -> BloomError {
        BloomError::raster_read(href, self.to_string())
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
