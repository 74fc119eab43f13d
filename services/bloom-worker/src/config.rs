//! Worker configuration from environment variables.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bloom_common::BloomResult;
use grid_processor::IndexConfig;
use ingestion::ReprojectionPolicy;
use scene_catalog::{CatalogConfig, RetryPolicy};
use storage::{MirroredStorage, ObjectStorage, ObjectStorageConfig, StorageSink};

/// Where outputs are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Local filesystem under `STORAGE_PATH`.
    Local,
    /// Local filesystem mirrored to an S3-compatible bucket.
    Cloud,
    /// In-process store, nothing persists.
    Memory,
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageMode::Local),
            "cloud" => Ok(StorageMode::Cloud),
            "memory" => Ok(StorageMode::Memory),
            other => Err(format!("unknown MODE '{}'", other)),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageMode::Local => "local",
            StorageMode::Cloud => "cloud",
            StorageMode::Memory => "memory",
        })
    }
}

/// What a failing date does to the rest of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFailurePolicy {
    /// Write the empty output for the date and continue with the next one.
    #[default]
    Isolate,
    /// Stop the job with the first error.
    Abort,
}

impl FromStr for DateFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolate" => Ok(DateFailurePolicy::Isolate),
            "abort" => Ok(DateFailurePolicy::Abort),
            other => Err(format!(
                "unknown date failure policy '{}' (expected isolate or abort)",
                other
            )),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub mode: StorageMode,
    pub storage_path: PathBuf,
    /// Bucket settings, used in cloud mode.
    pub bucket: ObjectStorageConfig,

    pub stac_endpoint: String,
    pub stac_collection: String,
    pub max_scenes: usize,
    /// Days searched on each side of a date.
    pub search_window_days: u32,
    pub catalog_max_attempts: u32,
    pub catalog_backoff_base: Duration,

    pub zoom_min: u32,
    pub zoom_max: u32,
    pub render_concurrency: usize,

    pub epsilon: f32,
    /// Index grids kept across dates, also the baseline window.
    pub history_size: usize,

    pub failure_policy: DateFailurePolicy,
    pub reprojection_policy: ReprojectionPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::Local,
            storage_path: PathBuf::from("local-data"),
            bucket: ObjectStorageConfig::default(),
            stac_endpoint: "https://earth-search.aws.element84.com/v1".to_string(),
            stac_collection: "sentinel-2-l2a".to_string(),
            max_scenes: 2,
            search_window_days: 3,
            catalog_max_attempts: 3,
            catalog_backoff_base: Duration::from_millis(1000),
            zoom_min: 7,
            zoom_max: 14,
            render_concurrency: 4,
            epsilon: 1e-4,
            history_size: 5,
            failure_policy: DateFailurePolicy::Isolate,
            reprojection_policy: ReprojectionPolicy::Fail,
        }
    }
}

impl WorkerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup. Unparseable values keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        set_parsed(&mut config.mode, var("MODE"));
        if let Some(path) = var("STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }

        if let Some(bucket) = var("S3_BUCKET").or_else(|| var("GCS_BUCKET")) {
            config.bucket.bucket = bucket;
        }
        if let Some(region) = var("S3_REGION") {
            config.bucket.region = region;
        }
        config.bucket.endpoint = var("S3_ENDPOINT");
        config.bucket.access_key_id = var("S3_ACCESS_KEY");
        config.bucket.secret_access_key = var("S3_SECRET_KEY");
        set_parsed(&mut config.bucket.allow_http, var("S3_ALLOW_HTTP"));

        if let Some(endpoint) = var("STAC_ENDPOINT") {
            config.stac_endpoint = endpoint;
        }
        if let Some(collection) = var("STAC_COLLECTION") {
            config.stac_collection = collection;
        }
        set_parsed(&mut config.max_scenes, var("MAX_SCENES_PER_WEEK"));
        set_parsed(&mut config.search_window_days, var("SEARCH_WINDOW_DAYS"));
        set_parsed(&mut config.catalog_max_attempts, var("CATALOG_MAX_ATTEMPTS"));
        if let Some(ms) = var("CATALOG_BACKOFF_BASE_MS").and_then(|v| v.trim().parse().ok()) {
            config.catalog_backoff_base = Duration::from_millis(ms);
        }

        set_parsed(&mut config.zoom_min, var("TILE_Z_MIN"));
        set_parsed(&mut config.zoom_max, var("TILE_Z_MAX"));
        set_parsed(&mut config.render_concurrency, var("RENDER_CONCURRENCY"));

        set_parsed(&mut config.epsilon, var("EPSILON"));
        set_parsed(&mut config.history_size, var("HISTORY_SIZE"));

        set_parsed(&mut config.failure_policy, var("DATE_FAILURE_POLICY"));
        set_parsed(&mut config.reprojection_policy, var("REPROJECTION_POLICY"));

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.zoom_min > self.zoom_max {
            return Err(format!(
                "TILE_Z_MIN ({}) must not exceed TILE_Z_MAX ({})",
                self.zoom_min, self.zoom_max
            ));
        }
        if self.zoom_max > 22 {
            return Err(format!("TILE_Z_MAX ({}) must be <= 22", self.zoom_max));
        }
        if self.max_scenes == 0 {
            return Err("MAX_SCENES_PER_WEEK must be > 0".to_string());
        }
        if self.catalog_max_attempts == 0 {
            return Err("CATALOG_MAX_ATTEMPTS must be > 0".to_string());
        }
        if self.render_concurrency == 0 {
            return Err("RENDER_CONCURRENCY must be > 0".to_string());
        }
        if self.history_size == 0 {
            return Err("HISTORY_SIZE must be > 0".to_string());
        }
        if !(self.epsilon > 0.0) {
            return Err("EPSILON must be > 0".to_string());
        }
        if self.stac_endpoint.trim().is_empty() {
            return Err("STAC_ENDPOINT must not be empty".to_string());
        }
        self.index_config().validate()
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            collection: self.stac_collection.clone(),
            max_scenes: self.max_scenes,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.catalog_max_attempts, self.catalog_backoff_base)
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            epsilon: self.epsilon,
            baseline_window: self.history_size,
            ..IndexConfig::default()
        }
    }

    /// Open the storage sink for the configured mode.
    pub fn open_storage(&self) -> BloomResult<Arc<dyn StorageSink>> {
        let sink: Arc<dyn StorageSink> = match self.mode {
            StorageMode::Local => Arc::new(ObjectStorage::local(self.storage_path.clone())?),
            StorageMode::Cloud => {
                let local = Arc::new(ObjectStorage::local(self.storage_path.clone())?);
                let bucket = Arc::new(ObjectStorage::s3(&self.bucket)?);
                Arc::new(MirroredStorage::new(local, bucket))
            }
            StorageMode::Memory => Arc::new(ObjectStorage::in_memory()),
        };
        Ok(sink)
    }
}

fn set_parsed<T: FromStr>(target: &mut T, value: Option<String>) {
    if let Some(parsed) = value.and_then(|v| v.trim().parse().ok()) {
        *target = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> WorkerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_vars(&[]);
        assert_eq!(config.mode, StorageMode::Local);
        assert_eq!(config.storage_path, PathBuf::from("local-data"));
        assert_eq!(config.bucket.bucket, "bloomium-tiles");
        assert_eq!((config.zoom_min, config.zoom_max), (7, 14));
        assert_eq!(config.max_scenes, 2);
        assert_eq!(config.search_window_days, 3);
        assert_eq!(config.history_size, 5);
        assert_eq!(config.failure_policy, DateFailurePolicy::Isolate);
        assert_eq!(config.reprojection_policy, ReprojectionPolicy::Fail);
        assert_eq!(config.retry_policy().backoff_for_attempt(1), Duration::from_secs(2));
        config.validate().unwrap();
    }

    #[test]
    fn test_overrides() {
        let config = from_vars(&[
            ("MODE", "cloud"),
            ("GCS_BUCKET", "legacy-bucket"),
            ("TILE_Z_MIN", "5"),
            ("TILE_Z_MAX", "9"),
            ("CATALOG_BACKOFF_BASE_MS", "10"),
            ("DATE_FAILURE_POLICY", "abort"),
            ("REPROJECTION_POLICY", "fallback"),
            ("S3_ALLOW_HTTP", "true"),
        ]);
        assert_eq!(config.mode, StorageMode::Cloud);
        assert_eq!(config.bucket.bucket, "legacy-bucket");
        assert!(config.bucket.allow_http);
        assert_eq!((config.zoom_min, config.zoom_max), (5, 9));
        assert_eq!(config.catalog_backoff_base, Duration::from_millis(10));
        assert_eq!(config.failure_policy, DateFailurePolicy::Abort);
        assert_eq!(config.reprojection_policy, ReprojectionPolicy::Fallback);
    }

    #[test]
    fn test_s3_bucket_wins() {
        let config = from_vars(&[("S3_BUCKET", "tiles"), ("GCS_BUCKET", "legacy")]);
        assert_eq!(config.bucket.bucket, "tiles");
    }

    #[test]
    fn test_invalid_numbers_keep_defaults() {
        let config = from_vars(&[("TILE_Z_MAX", "fourteen"), ("EPSILON", "")]);
        assert_eq!(config.zoom_max, 14);
        assert_eq!(config.epsilon, 1e-4);
    }

    #[test]
    fn test_validate_zoom_order() {
        let config = from_vars(&[("TILE_Z_MIN", "12"), ("TILE_Z_MAX", "8")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_index_config_follows_history() {
        let config = from_vars(&[("HISTORY_SIZE", "3"), ("EPSILON", "0.001")]);
        let index = config.index_config();
        assert_eq!(index.baseline_window, 3);
        assert_eq!(index.epsilon, 0.001);
    }
}
