//! The storage surface consumed by the renderer and the orchestrator.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use bloom_common::{BloomError, BloomResult};

/// Content types written by the pipeline.
pub mod content_types {
    pub const PNG: &str = "image/png";
    pub const JSON: &str = "application/json";
}

/// Destination for tiles and JSON documents.
///
/// Writes are independent per path; there is no cross-path transaction.
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Write `data` to `path`, replacing any existing object.
    async fn write(&self, path: &str, data: Bytes, content_type: &str) -> BloomResult<()>;

    /// Read the full object at `path`.
    async fn read(&self, path: &str) -> BloomResult<Bytes>;

    /// Whether an object exists at `path`.
    async fn exists(&self, path: &str) -> BloomResult<bool>;

    /// All object paths under `prefix`.
    async fn list(&self, prefix: &str) -> BloomResult<Vec<String>>;
}

/// Serialize `value` as pretty JSON and write it with the JSON content type.
pub async fn write_json<T>(sink: &dyn StorageSink, path: &str, value: &T) -> BloomResult<()>
where
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec_pretty(value)
        .map_err(|e| BloomError::Encode(format!("Failed to serialize {}: {}", path, e)))?;
    sink.write(path, Bytes::from(body), content_types::JSON).await
}
