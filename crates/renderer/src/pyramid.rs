//! Writing a grid as a tile pyramid through a [`StorageSink`].

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt, TryStreamExt};
use metrics::{counter, histogram};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use bloom_common::{BloomError, BloomResult, BoundingBox, Grid, LayerKind, TileCoord, TILE_SIZE};
use storage::{content_types, StoragePath, StorageSink};

use crate::png::encode_png;
use crate::tiles::{enumerate_tiles, TileSampler};

/// Where a pyramid goes and which tiles it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidTarget {
    pub aoi_id: String,
    pub date: NaiveDate,
    /// WGS84 AOI; pixels outside it are transparent.
    pub aoi: BoundingBox,
    pub zoom_min: u32,
    pub zoom_max: u32,
}

impl PyramidTarget {
    pub fn zoom_levels(&self) -> std::ops::RangeInclusive<u32> {
        self.zoom_min..=self.zoom_max
    }

    fn tile_path(&self, kind: LayerKind, coord: TileCoord) -> String {
        StoragePath::tile(&self.aoi_id, self.date, kind, coord)
    }
}

/// Renders zoom levels in parallel and writes tiles with bounded concurrency.
#[derive(Clone)]
pub struct PyramidWriter {
    sink: Arc<dyn StorageSink>,
    concurrency: usize,
}

impl PyramidWriter {
    pub fn new(sink: Arc<dyn StorageSink>, concurrency: usize) -> Self {
        Self {
            sink,
            concurrency: concurrency.max(1),
        }
    }

    /// Render and write every tile of `grid` for one layer. Returns the number
    /// of tiles written.
    #[instrument(skip(self, grid, target), fields(aoi_id = %target.aoi_id, date = %target.date, layer = %kind))]
    pub async fn write(
        &self,
        grid: Arc<Grid>,
        target: &PyramidTarget,
        kind: LayerKind,
    ) -> BloomResult<usize> {
        let started = Instant::now();
        let mut written = 0;

        for z in target.zoom_levels() {
            let coords = enumerate_tiles(&target.aoi, z);
            let grid = grid.clone();
            let aoi = target.aoi;

            let tiles = tokio::task::spawn_blocking(move || render_level(&grid, &coords, &aoi, kind))
                .await
                .map_err(|e| BloomError::Encode(format!("tile render task failed: {}", e)))??;

            debug!(z, tiles = tiles.len(), "Rendered zoom level");
            written += self.put_tiles(target, kind, tiles).await?;
        }

        counter!("bloom_tiles_written_total", "layer" => kind.as_str()).increment(written as u64);
        histogram!("bloom_pyramid_duration_seconds").record(started.elapsed().as_secs_f64());
        info!(
            tiles = written,
            zoom_min = target.zoom_min,
            zoom_max = target.zoom_max,
            "Wrote pyramid"
        );
        Ok(written)
    }

    /// Write a fully transparent tile at every coordinate of the pyramid.
    #[instrument(skip(self, target), fields(aoi_id = %target.aoi_id, date = %target.date, layer = %kind))]
    pub async fn write_empty(&self, target: &PyramidTarget, kind: LayerKind) -> BloomResult<usize> {
        let blank = Bytes::from(transparent_tile()?);
        let mut written = 0;

        for z in target.zoom_levels() {
            let tiles = enumerate_tiles(&target.aoi, z)
                .into_iter()
                .map(|coord| (coord, blank.clone()))
                .collect();
            written += self.put_tiles(target, kind, tiles).await?;
        }

        counter!("bloom_tiles_written_total", "layer" => kind.as_str()).increment(written as u64);
        info!(tiles = written, "Wrote empty pyramid");
        Ok(written)
    }

    async fn put_tiles(
        &self,
        target: &PyramidTarget,
        kind: LayerKind,
        tiles: Vec<(TileCoord, Bytes)>,
    ) -> BloomResult<usize> {
        let count = tiles.len();
        stream::iter(tiles.into_iter().map(|(coord, png)| {
            let sink = self.sink.clone();
            let path = target.tile_path(kind, coord);
            async move { sink.write(&path, png, content_types::PNG).await }
        }))
        .buffer_unordered(self.concurrency)
        .try_collect::<Vec<()>>()
        .await?;
        Ok(count)
    }
}

/// Render and encode all tiles of one zoom level on the rayon pool.
fn render_level(
    grid: &Grid,
    coords: &[TileCoord],
    aoi: &BoundingBox,
    kind: LayerKind,
) -> BloomResult<Vec<(TileCoord, Bytes)>> {
    coords
        .par_iter()
        .map_init(
            || TileSampler::new(grid),
            |sampler, &coord| {
                let sampler = sampler
                    .as_ref()
                    .map_err(|e| BloomError::Reprojection(e.to_string()))?;
                let pixels = sampler.render(coord, aoi, kind);
                let png = encode_png(&pixels, TILE_SIZE, TILE_SIZE)?;
                Ok((coord, Bytes::from(png)))
            },
        )
        .collect()
}

/// PNG of a 256x256 tile with every pixel `(0, 0, 0, 0)`.
pub fn transparent_tile() -> BloomResult<Vec<u8>> {
    encode_png(&vec![0u8; TILE_SIZE * TILE_SIZE * 4], TILE_SIZE, TILE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_tile_is_indexed() {
        let png = transparent_tile().unwrap();
        // IHDR color type
        assert_eq!(png[25], 3);
        assert_eq!(png, transparent_tile().unwrap());
    }

    #[test]
    fn test_zoom_levels() {
        let target = PyramidTarget {
            aoi_id: "delta".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            aoi: BoundingBox::new(-121.5, 38.2, -121.0, 38.6),
            zoom_min: 7,
            zoom_max: 9,
        };
        assert_eq!(target.zoom_levels().collect::<Vec<_>>(), vec![7, 8, 9]);
        assert_eq!(
            target.tile_path(LayerKind::Bloom, TileCoord::new(7, 20, 49)),
            "delta/2025-09-01/tiles/bloom/7/20/49.png"
        );
    }
}
