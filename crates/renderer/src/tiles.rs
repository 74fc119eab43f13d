//! Tile enumeration and inverse-sampled tile rendering.
//!
//! Every output pixel is mapped back to the source grid: pixel corner in
//! Web Mercator, then longitude/latitude, then the grid's own CRS, where the
//! value is bilinearly sampled. Tiles share no state, so any number of them
//! can be rendered concurrently from the same [`TileSampler`].

use bloom_common::{BloomResult, BoundingBox, Epsg, Grid, LayerKind, TileCoord, TILE_SIZE};
use grid_processor::bilinear_interpolate;
use projection::{lon_lat_to_tile, mercator_to_lon_lat, tile_bounds, CrsTransformer};

use crate::colormap::colormap;

/// All tiles at zoom `z` whose bounds intersect a WGS84 bbox.
///
/// The set is the rectangle spanned by the tiles containing the north-west
/// and south-east corners, in row-major order.
pub fn enumerate_tiles(bbox: &BoundingBox, z: u32) -> Vec<TileCoord> {
    let top_left = lon_lat_to_tile(bbox.min_x, bbox.max_y, z);
    let bottom_right = lon_lat_to_tile(bbox.max_x, bbox.min_y, z);

    let cols = bottom_right.x.saturating_sub(top_left.x) as usize + 1;
    let rows = bottom_right.y.saturating_sub(top_left.y) as usize + 1;
    let mut tiles = Vec::with_capacity(cols * rows);
    for y in top_left.y..=bottom_right.y {
        for x in top_left.x..=bottom_right.x {
            tiles.push(TileCoord::new(z, x, y));
        }
    }
    tiles
}

/// Number of tiles [`enumerate_tiles`] yields over `zoom_min..=zoom_max`.
pub fn count_tiles(bbox: &BoundingBox, zoom_min: u32, zoom_max: u32) -> usize {
    (zoom_min..=zoom_max)
        .map(|z| enumerate_tiles(bbox, z).len())
        .sum()
}

/// Read-only view of a grid prepared for sampling at WGS84 positions.
pub struct TileSampler<'a> {
    grid: &'a Grid,
    to_grid: CrsTransformer,
}

impl<'a> TileSampler<'a> {
    pub fn new(grid: &'a Grid) -> BloomResult<Self> {
        let to_grid = CrsTransformer::new(Epsg::WGS84, grid.geometry().crs)?;
        Ok(Self { grid, to_grid })
    }

    /// Bilinear sample at a longitude/latitude. NaN outside the grid's
    /// interior, next to a NaN sample, or when the point cannot be projected.
    pub fn sample(&self, lon: f64, lat: f64) -> f32 {
        let (gx, gy) = match self.to_grid.transform(lon, lat) {
            Ok(p) => p,
            Err(_) => return f32::NAN,
        };
        let geom = self.grid.geometry();
        let (x, y) = geom.to_pixel(gx, gy);
        bilinear_interpolate(self.grid.data(), geom.width, geom.height, x, y)
    }

    /// Render one 256x256 tile as RGBA bytes.
    ///
    /// Pixels whose position falls outside `aoi` (edges inclusive) are fully
    /// transparent; the rest go through the layer's colormap.
    pub fn render(&self, coord: TileCoord, aoi: &BoundingBox, kind: LayerKind) -> Vec<u8> {
        let bounds = tile_bounds(coord);
        let size = TILE_SIZE as f64;
        let mut pixels = vec![0u8; TILE_SIZE * TILE_SIZE * 4];

        for py in 0..TILE_SIZE {
            let merc_y = bounds.max_y - (py as f64 / size) * bounds.height();
            for px in 0..TILE_SIZE {
                let merc_x = bounds.min_x + (px as f64 / size) * bounds.width();
                let (lon, lat) = mercator_to_lon_lat(merc_x, merc_y);
                if !aoi.contains_point(lon, lat) {
                    continue;
                }

                let rgba = colormap(kind, self.sample(lon, lat));
                let i = (py * TILE_SIZE + px) * 4;
                pixels[i..i + 4].copy_from_slice(&rgba);
            }
        }

        pixels
    }
}

/// Render a single tile of `grid` as RGBA bytes.
pub fn render_tile(
    grid: &Grid,
    coord: TileCoord,
    aoi: &BoundingBox,
    kind: LayerKind,
) -> BloomResult<Vec<u8>> {
    Ok(TileSampler::new(grid)?.render(coord, aoi, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::lon_lat_to_mercator;
    use test_utils::{aoi, constant_grid, grid_with_nans, wgs84_geometry};

    fn delta_grid(value: f32) -> Grid {
        // -121.6..-120.9, 38.1..38.7
        constant_grid(wgs84_geometry(70, 60, (-121.6, 38.7), 0.01), value)
    }

    fn center_tile(z: u32) -> TileCoord {
        lon_lat_to_tile(-121.25, 38.4, z)
    }

    #[test]
    fn test_enumerate_world() {
        let world = BoundingBox::new(-180.0, -85.0, 179.999, 85.0);
        assert_eq!(enumerate_tiles(&world, 0), vec![TileCoord::new(0, 0, 0)]);
        assert_eq!(enumerate_tiles(&world, 2).len(), 16);
    }

    #[test]
    fn test_enumerate_rectangle() {
        let bbox = BoundingBox::from(aoi::DELTA);
        for z in 7..=12 {
            let tiles = enumerate_tiles(&bbox, z);
            let first = tiles[0];
            let last = tiles[tiles.len() - 1];
            let cols = last.x - first.x + 1;
            let rows = last.y - first.y + 1;
            assert_eq!(tiles.len() as u32, cols * rows);
            assert_eq!(first, lon_lat_to_tile(bbox.min_x, bbox.max_y, z));
            assert_eq!(last, lon_lat_to_tile(bbox.max_x, bbox.min_y, z));
        }
    }

    #[test]
    fn test_enumerated_tiles_intersect_bbox() {
        let bbox = BoundingBox::from(aoi::DELTA);
        let (min_x, min_y) = lon_lat_to_mercator(bbox.min_x, bbox.min_y);
        let (max_x, max_y) = lon_lat_to_mercator(bbox.max_x, bbox.max_y);
        let merc = BoundingBox::new(min_x, min_y, max_x, max_y);

        for coord in enumerate_tiles(&bbox, 11) {
            assert!(tile_bounds(coord).intersects(&merc), "{} misses bbox", coord);
        }
    }

    #[test]
    fn test_count_tiles() {
        let bbox = BoundingBox::from(aoi::DELTA);
        let expected: usize = (7..=9).map(|z| enumerate_tiles(&bbox, z).len()).sum();
        assert_eq!(count_tiles(&bbox, 7, 9), expected);
    }

    #[test]
    fn test_tile_inside_aoi_is_colored() {
        let grid = delta_grid(0.0);
        let aoi = BoundingBox::from(aoi::DELTA);
        let pixels = render_tile(&grid, center_tile(12), &aoi, LayerKind::Bloom).unwrap();

        assert_eq!(pixels.len(), TILE_SIZE * TILE_SIZE * 4);
        for px in pixels.chunks_exact(4) {
            assert_eq!(px, &[255, 150, 200, 50]);
        }
    }

    #[test]
    fn test_tile_outside_aoi_is_transparent() {
        let grid = delta_grid(0.0);
        let aoi = BoundingBox::from(aoi::DELTA);
        let far = lon_lat_to_tile(10.0, 50.0, 12);
        let pixels = render_tile(&grid, far, &aoi, LayerKind::Anomaly).unwrap();
        assert!(pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_aoi_edge_clips_pixels() {
        let grid = delta_grid(0.0);
        let aoi = BoundingBox::from(aoi::DELTA);
        // tile straddling the western AOI edge
        let coord = lon_lat_to_tile(aoi.min_x, 38.4, 10);
        let pixels = render_tile(&grid, coord, &aoi, LayerKind::Anomaly).unwrap();

        let opaque = pixels.chunks_exact(4).filter(|px| px[3] > 0).count();
        assert!(opaque > 0);
        assert!(opaque < TILE_SIZE * TILE_SIZE);
    }

    #[test]
    fn test_nan_grid_is_transparent() {
        let grid = delta_grid(f32::NAN);
        let aoi = BoundingBox::from(aoi::DELTA);
        let pixels = render_tile(&grid, center_tile(12), &aoi, LayerKind::Bloom).unwrap();
        assert!(pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_nan_sample_neighbourhood_is_transparent() {
        let grid = grid_with_nans(wgs84_geometry(70, 60, (-121.6, 38.7), 0.01), 0.0, &[(35, 30)]);
        let sampler = TileSampler::new(&grid).unwrap();

        // pixel (35, 30) spans lon -121.25..-121.24, lat 38.39..38.40
        assert!(sampler.sample(-121.245, 38.395).is_nan());
        assert!(sampler.sample(-121.255, 38.405).is_nan());
        assert_eq!(sampler.sample(-121.4, 38.5), 0.0);
    }

    #[test]
    fn test_sample_outside_grid_is_nan() {
        let grid = delta_grid(0.25);
        let sampler = TileSampler::new(&grid).unwrap();
        assert!(sampler.sample(-122.0, 38.4).is_nan());
        // last column is not part of the interpolable interior
        assert!(sampler.sample(-120.9, 38.4).is_nan());
    }

    #[test]
    fn test_render_is_deterministic() {
        let grid = test_utils::ramp_grid(wgs84_geometry(70, 60, (-121.6, 38.7), 0.01), -2.0, 0.001);
        let aoi = BoundingBox::from(aoi::DELTA);
        let coord = center_tile(11);
        let a = render_tile(&grid, coord, &aoi, LayerKind::Anomaly).unwrap();
        let b = render_tile(&grid, coord, &aoi, LayerKind::Anomaly).unwrap();
        assert_eq!(a, b);
    }
}
