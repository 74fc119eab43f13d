//! Object storage sink (local filesystem, S3 compatible, in-memory).

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use object_store::{
    aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory, path::Path, Attribute,
    Attributes, ObjectStore, PutOptions,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use bloom_common::{BloomError, BloomResult, LayerKind, TileCoord};

use crate::sink::{content_types, StorageSink};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// Custom endpoint (MinIO, R2, ...). `None` uses AWS.
    pub endpoint: Option<String>,
    pub bucket: String,
    /// Explicit credentials; when absent the AWS environment chain is used.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub region: String,
    /// Allow HTTP (for local MinIO)
    pub allow_http: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            bucket: "bloomium-tiles".to_string(),
            access_key_id: None,
            secret_access_key: None,
            region: "us-east-1".to_string(),
            allow_http: false,
        }
    }
}

/// Object storage client implementing [`StorageSink`].
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    /// Label used in logs (bucket name or root directory).
    location: String,
    /// Whether the backend accepts object attributes (content type, cache control).
    attributes: bool,
}

impl ObjectStorage {
    /// S3-compatible bucket.
    pub fn s3(config: &ObjectStorageConfig) -> BloomResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            builder = builder
                .with_access_key_id(key)
                .with_secret_access_key(secret);
        }
        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| BloomError::Storage(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            location: format!("s3://{}", config.bucket),
            attributes: true,
        })
    }

    /// Directory on the local filesystem; created if missing.
    pub fn local(root: impl Into<PathBuf>) -> BloomResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        let store = LocalFileSystem::new_with_prefix(&root).map_err(|e| {
            BloomError::Storage(format!("Failed to open {}: {}", root.display(), e))
        })?;

        Ok(Self {
            store: Arc::new(store),
            location: root.display().to_string(),
            attributes: false,
        })
    }

    /// Process-local store, used for tests and dry runs.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            location: "memory".to_string(),
            attributes: true,
        }
    }

    /// Underlying store, e.g. to read band rasters from the same backend.
    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    fn put_options(&self, content_type: &str) -> PutOptions {
        let mut attributes = Attributes::new();
        if self.attributes {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
            if let Some(cache) = cache_control(content_type) {
                attributes.insert(Attribute::CacheControl, cache.into());
            }
        }
        PutOptions {
            attributes,
            ..Default::default()
        }
    }
}

/// Cache-Control for a given content type.
fn cache_control(content_type: &str) -> Option<&'static str> {
    match content_type {
        content_types::PNG => Some("public, max-age=3600"),
        content_types::JSON => Some("public, max-age=300"),
        _ => None,
    }
}

#[async_trait]
impl StorageSink for ObjectStorage {
    #[instrument(skip(self, data), fields(location = %self.location, path = %path))]
    async fn write(&self, path: &str, data: Bytes, content_type: &str) -> BloomResult<()> {
        let location = Path::from(path);
        debug!(size = data.len(), content_type, "Writing object");

        self.store
            .put_opts(&location, data.into(), self.put_options(content_type))
            .await
            .map_err(|e| BloomError::Storage(format!("Failed to write {}: {}", path, e)))?;

        Ok(())
    }

    #[instrument(skip(self), fields(location = %self.location, path = %path))]
    async fn read(&self, path: &str) -> BloomResult<Bytes> {
        let location = Path::from(path);

        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| BloomError::Storage(format!("Failed to read {}: {}", path, e)))?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| BloomError::Storage(format!("Failed to read bytes: {}", e)))?;

        debug!(size = bytes.len(), "Read object");
        Ok(bytes)
    }

    async fn exists(&self, path: &str) -> BloomResult<bool> {
        let location = Path::from(path);

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(BloomError::Storage(format!(
                "Failed to check {}: {}",
                path, e
            ))),
        }
    }

    async fn list(&self, prefix: &str) -> BloomResult<Vec<String>> {
        use futures::TryStreamExt;

        let prefix_path = Path::from(prefix);
        let mut paths = Vec::new();

        let mut stream = self.store.list(Some(&prefix_path));
        loop {
            match stream.try_next().await {
                Ok(Some(meta)) => paths.push(meta.location.to_string()),
                Ok(None) => break,
                // A prefix that was never written to is an empty listing.
                Err(object_store::Error::NotFound { .. }) => break,
                Err(e) => return Err(BloomError::Storage(format!("List failed: {}", e))),
            }
        }

        paths.sort();
        Ok(paths)
    }
}

/// Path builder for the output layout.
pub struct StoragePath;

impl StoragePath {
    /// Build path for a rendered tile.
    /// Format: {aoi}/{date}/tiles/{layer}/{z}/{x}/{y}.png
    pub fn tile(aoi_id: &str, date: NaiveDate, layer: LayerKind, coord: TileCoord) -> String {
        format!(
            "{}/{}/tiles/{}/{}/{}/{}.png",
            aoi_id, date, layer, coord.z, coord.x, coord.y
        )
    }

    /// Build path for the date record.
    /// Format: {aoi}/{date}/meta.json
    pub fn meta(aoi_id: &str, date: NaiveDate) -> String {
        format!("{}/{}/meta.json", aoi_id, date)
    }

    /// Build path for the timeseries document.
    /// Format: {aoi}/{date}/timeseries.json
    pub fn timeseries(aoi_id: &str, date: NaiveDate) -> String {
        format!("{}/{}/timeseries.json", aoi_id, date)
    }

    /// Whether `path` is a timeseries document.
    pub fn is_timeseries(path: &str) -> bool {
        path.ends_with("/timeseries.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    #[test]
    fn test_storage_paths() {
        assert_eq!(
            StoragePath::tile("delta", date(), LayerKind::Bloom, TileCoord::new(7, 20, 49)),
            "delta/2025-09-01/tiles/bloom/7/20/49.png"
        );
        assert_eq!(StoragePath::meta("delta", date()), "delta/2025-09-01/meta.json");
        assert_eq!(
            StoragePath::timeseries("delta", date()),
            "delta/2025-09-01/timeseries.json"
        );
        assert!(StoragePath::is_timeseries("delta/2025-09-01/timeseries.json"));
        assert!(!StoragePath::is_timeseries("delta/2025-09-01/meta.json"));
    }

    #[test]
    fn test_cache_control() {
        assert_eq!(cache_control(content_types::PNG), Some("public, max-age=3600"));
        assert_eq!(cache_control(content_types::JSON), Some("public, max-age=300"));
        assert_eq!(cache_control("text/plain"), None);
    }

    #[tokio::test]
    async fn test_in_memory_roundtrip() {
        let storage = ObjectStorage::in_memory();
        storage
            .write("a/b.png", Bytes::from_static(b"png"), content_types::PNG)
            .await
            .unwrap();

        assert!(storage.exists("a/b.png").await.unwrap());
        assert!(!storage.exists("a/c.png").await.unwrap());
        assert_eq!(storage.read("a/b.png").await.unwrap(), Bytes::from_static(b"png"));
        assert_eq!(storage.list("a").await.unwrap(), vec!["a/b.png".to_string()]);
    }

    #[tokio::test]
    async fn test_local_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ObjectStorage::local(dir.path().join("out")).unwrap();

        storage
            .write("aoi/2025-09-01/meta.json", Bytes::from_static(b"{}"), content_types::JSON)
            .await
            .unwrap();

        assert!(dir.path().join("out/aoi/2025-09-01/meta.json").exists());
        assert_eq!(
            storage.list("aoi").await.unwrap(),
            vec!["aoi/2025-09-01/meta.json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_local_list_missing_prefix_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ObjectStorage::local(dir.path()).unwrap();
        assert!(storage.list("nothing-here").await.unwrap().is_empty());
    }
}
