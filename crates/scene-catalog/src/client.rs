//! Scene search with retry and ranking.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use bloom_common::{BloomError, BloomResult, BoundingBox, DateWindow, Scene};

use crate::error::CatalogError;
use crate::retry::RetryPolicy;
use crate::stac::{StacItemCollection, StacSearchRequest};
use crate::transport::CatalogTransport;

/// Search parameters that do not change between calls.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// STAC collection identifier.
    pub collection: String,
    /// Scenes kept after ranking.
    pub max_scenes: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            collection: "sentinel-2-l2a".to_string(),
            max_scenes: 2,
        }
    }
}

/// Catalog client returning the clearest scenes for a bbox and date range.
pub struct SceneCatalog {
    transport: Arc<dyn CatalogTransport>,
    retry: RetryPolicy,
    config: CatalogConfig,
}

impl SceneCatalog {
    pub fn new(
        transport: Arc<dyn CatalogTransport>,
        retry: RetryPolicy,
        config: CatalogConfig,
    ) -> Self {
        Self {
            transport,
            retry,
            config,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Scenes overlapping `bbox` between `start` and `end` (whole days),
    /// clearest first, at most `max_scenes` of them.
    ///
    /// An empty result is not an error.
    #[instrument(skip(self), fields(collection = %self.config.collection))]
    pub async fn search(
        &self,
        bbox: &BoundingBox,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BloomResult<Vec<Scene>> {
        let request = StacSearchRequest::new(
            &self.config.collection,
            bbox,
            DateWindow { start, end },
        );

        let collection = self.search_with_retry(&request).await?;
        let found = collection.features.len();

        let scenes = rank_scenes(
            collection.features.into_iter().map(Scene::from).collect(),
            self.config.max_scenes,
        );

        info!(
            found,
            selected = scenes.len(),
            cloud_cover = ?scenes.iter().map(|s| s.cloud_cover).collect::<Vec<_>>(),
            "Scene search complete"
        );
        Ok(scenes)
    }

    async fn search_with_retry(
        &self,
        request: &StacSearchRequest,
    ) -> BloomResult<StacItemCollection> {
        let mut attempt = 1;

        loop {
            metrics::counter!("bloom_catalog_requests_total").increment(1);

            match self.transport.search(request).await {
                Ok(collection) => return Ok(collection),
                Err(e) if e.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.backoff_for_attempt(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Scene search failed, retrying"
                    );
                    metrics::counter!("bloom_catalog_retries_total").increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(search_error(e, attempt)),
            }
        }
    }
}

fn search_error(err: CatalogError, attempts: u32) -> BloomError {
    if err.is_transient() {
        BloomError::SceneSearch(format!("{} (after {} attempts)", err, attempts))
    } else {
        BloomError::SceneSearch(err.to_string())
    }
}

/// Stable sort by ascending cloud cover (missing ranks as 100 %), then truncate.
pub fn rank_scenes(mut scenes: Vec<Scene>, max_scenes: usize) -> Vec<Scene> {
    scenes.sort_by(|a, b| a.cloud_cover_percent().total_cmp(&b.cloud_cover_percent()));
    scenes.truncate(max_scenes);
    scenes
}
