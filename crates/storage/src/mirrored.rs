//! Primary + mirror storage, used in cloud mode (local disk plus bucket).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::instrument;

use bloom_common::BloomResult;

use crate::StorageSink;

/// Writes go to both sinks, reads come from the primary.
pub struct MirroredStorage {
    primary: Arc<dyn StorageSink>,
    mirror: Arc<dyn StorageSink>,
}

impl MirroredStorage {
    pub fn new(primary: Arc<dyn StorageSink>, mirror: Arc<dyn StorageSink>) -> Self {
        Self { primary, mirror }
    }
}

#[async_trait]
impl StorageSink for MirroredStorage {
    #[instrument(skip(self, data), fields(path = %path))]
    async fn write(&self, path: &str, data: Bytes, content_type: &str) -> BloomResult<()> {
        self.primary.write(path, data.clone(), content_type).await?;
        self.mirror.write(path, data, content_type).await
    }

    async fn read(&self, path: &str) -> BloomResult<Bytes> {
        self.primary.read(path).await
    }

    async fn exists(&self, path: &str) -> BloomResult<bool> {
        self.primary.exists(path).await
    }

    async fn list(&self, prefix: &str) -> BloomResult<Vec<String>> {
        self.primary.list(prefix).await
    }
}
