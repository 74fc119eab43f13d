//! Catalog request errors.

use thiserror::Error;

/// A single failed catalog request.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Connection, TLS or timeout failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Rate limiting, server errors and transport failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Transport(_) => true,
            CatalogError::Status { status, .. } => *status == 429 || *status >= 500,
            CatalogError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> CatalogError {
        CatalogError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(status(429).is_transient());
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(404).is_transient());
        assert!(CatalogError::Transport("reset".into()).is_transient());
        assert!(!CatalogError::Decode("eof".into()).is_transient());
    }
}
