//! Resolving band hrefs to readable rasters.

use std::sync::Arc;

use async_trait::async_trait;
use object_store::{
    aws::AmazonS3Builder, http::HttpBuilder, local::LocalFileSystem, path::Path, ObjectStore,
};
use tiff::decoder::Decoder;
use tokio::runtime::Handle;
use tracing::{debug, instrument};

use bloom_common::{BloomError, BloomResult};

use crate::config::DEFAULT_BLOCK_SIZE;
use crate::error::{IngestionError, Result};
use crate::geotiff;
use crate::range_reader::RangeReader;
use crate::window::{PixelWindow, RasterInfo};

/// An opened single-band raster.
#[async_trait]
pub trait RasterBand: Send + Sync {
    fn href(&self) -> &str;

    fn info(&self) -> &RasterInfo;

    /// Samples of `window` as f32, row-major.
    async fn read_window(&self, window: PixelWindow) -> BloomResult<Vec<f32>>;
}

/// Opens band assets by href.
#[async_trait]
pub trait RasterSource: Send + Sync {
    async fn open(&self, href: &str) -> BloomResult<Box<dyn RasterBand>>;
}

/// GeoTIFF reader over `object_store`.
///
/// Without a fixed store, hrefs are resolved by scheme: `http(s)://` uses
/// the HTTP store, `s3://bucket/key` the S3 store (credentials and region
/// from the environment), anything else is a local file path.
pub struct ObjectStoreSource {
    store: Option<Arc<dyn ObjectStore>>,
    block_size: u64,
}

impl ObjectStoreSource {
    pub fn new() -> Self {
        Self {
            store: None,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Treat every href as a path inside `store`.
    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store: Some(store),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size;
        self
    }

    fn resolve(&self, href: &str) -> Result<(Arc<dyn ObjectStore>, Path)> {
        if let Some(store) = &self.store {
            return Ok((store.clone(), Path::from(href.trim_start_matches('/'))));
        }

        if href.starts_with("http://") || href.starts_with("https://") {
            let (base, key) = split_url(href)?;
            let store = HttpBuilder::new().with_url(base).build()?;
            return Ok((Arc::new(store), Path::from(key)));
        }

        if let Some(rest) = href.strip_prefix("s3://") {
            let (bucket, key) = rest
                .split_once('/')
                .ok_or_else(|| IngestionError::InvalidHref(href.to_string()))?;
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()?;
            return Ok((Arc::new(store), Path::from(key)));
        }

        let local = href.strip_prefix("file://").unwrap_or(href);
        let path = Path::from_filesystem_path(local)
            .map_err(|e| IngestionError::InvalidHref(format!("{}: {}", href, e)))?;
        Ok((Arc::new(LocalFileSystem::new()), path))
    }
}

impl Default for ObjectStoreSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `scheme://host/key` into `scheme://host` and `key`.
fn split_url(href: &str) -> Result<(&str, &str)> {
    let host_start = href
        .find("://")
        .map(|i| i + 3)
        .ok_or_else(|| IngestionError::InvalidHref(href.to_string()))?;
    let slash = href[host_start..]
        .find('/')
        .map(|i| host_start + i)
        .ok_or_else(|| IngestionError::InvalidHref(href.to_string()))?;
    Ok((&href[..slash], &href[slash + 1..]))
}

#[async_trait]
impl RasterSource for ObjectStoreSource {
    #[instrument(skip(self))]
    async fn open(&self, href: &str) -> BloomResult<Box<dyn RasterBand>> {
        let (store, path) = self.resolve(href).map_err(|e| e.into_bloom(href))?;

        let meta = store
            .head(&path)
            .await
            .map_err(|e| IngestionError::from(e).into_bloom(href))?;

        let reader = RangeReader::new(
            store,
            path,
            meta.size as u64,
            self.block_size,
            Handle::current(),
        );

        let header_reader = reader.clone();
        let info = tokio::task::spawn_blocking(move || -> Result<RasterInfo> {
            let mut decoder = Decoder::new(header_reader)?;
            geotiff::read_info(&mut decoder)
        })
        .await
        .map_err(|e| BloomError::raster_read(href, format!("header task failed: {}", e)))?
        .map_err(|e| e.into_bloom(href))?;

        debug!(
            width = info.width,
            height = info.height,
            epsg = %info.epsg,
            res = info.res_x,
            "Opened raster"
        );

        Ok(Box::new(GeoTiffBand {
            href: href.to_string(),
            info,
            reader,
        }))
    }
}

/// A GeoTIFF opened through a [`RangeReader`].
pub struct GeoTiffBand {
    href: String,
    info: RasterInfo,
    reader: RangeReader,
}

#[async_trait]
impl RasterBand for GeoTiffBand {
    fn href(&self) -> &str {
        &self.href
    }

    fn info(&self) -> &RasterInfo {
        &self.info
    }

    #[instrument(skip(self), fields(href = %self.href))]
    async fn read_window(&self, window: PixelWindow) -> BloomResult<Vec<f32>> {
        let reader = self.reader.clone();
        let info = self.info;

        tokio::task::spawn_blocking(move || -> Result<Vec<f32>> {
            let mut decoder = Decoder::new(reader)?;
            geotiff::read_window(&mut decoder, &info, window)
        })
        .await
        .map_err(|e| BloomError::raster_read(&self.href, format!("read task failed: {}", e)))?
        .map_err(|e| e.into_bloom(&self.href))
    }
}
