//! Raster grids, classification masks and the aligned band set.
//!
//! Grids are north-up and row-major: `origin_x`/`origin_y` address the
//! top-left corner of pixel (0, 0), x grows east by `pixel_size` and y grows
//! south by `pixel_size`. Missing samples are NaN and every arithmetic kernel
//! propagates them.

use crate::{BloomError, BloomResult, BoundingBox, Epsg};
use serde::{Deserialize, Serialize};

/// Marker written into the nodata field of grids produced by band alignment.
pub const NODATA_MARKER: f32 = -9999.0;

/// Shared geometry of a [`Grid`] or [`Mask`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub width: usize,
    pub height: usize,
    /// X of the top-left corner, in `crs` units.
    pub origin_x: f64,
    /// Y of the top-left corner, in `crs` units.
    pub origin_y: f64,
    /// Pixel edge length in `crs` units (always positive).
    pub pixel_size: f64,
    pub crs: Epsg,
}

impl GridGeometry {
    pub fn new(
        width: usize,
        height: usize,
        origin_x: f64,
        origin_y: f64,
        pixel_size: f64,
        crs: Epsg,
    ) -> Self {
        Self {
            width,
            height,
            origin_x,
            origin_y,
            pixel_size,
            crs,
        }
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(width, height)`
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Extent covered by the grid in its own CRS.
    pub fn extent(&self) -> BoundingBox {
        BoundingBox::new(
            self.origin_x,
            self.origin_y - self.height as f64 * self.pixel_size,
            self.origin_x + self.width as f64 * self.pixel_size,
            self.origin_y,
        )
    }

    /// Fractional pixel position of a point given in the grid CRS.
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_size,
            (self.origin_y - y) / self.pixel_size,
        )
    }

    fn check_len(&self, len: usize) -> BloomResult<()> {
        if len != self.len() {
            return Err(BloomError::InvalidInput(format!(
                "grid data has {} samples, expected {}x{} = {}",
                len,
                self.width,
                self.height,
                self.len()
            )));
        }
        Ok(())
    }
}

/// A single-band floating point raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    geometry: GridGeometry,
    data: Vec<f32>,
    /// Nodata value of the source raster, if any. Informational only,
    /// missing samples inside `data` are always NaN.
    pub nodata: Option<f32>,
}

impl Grid {
    /// Create a grid, failing if `data.len() != width * height`.
    pub fn new(geometry: GridGeometry, data: Vec<f32>) -> BloomResult<Self> {
        geometry.check_len(data.len())?;
        Ok(Self {
            geometry,
            data,
            nodata: None,
        })
    }

    /// A grid with every sample set to `value`.
    pub fn filled(geometry: GridGeometry, value: f32) -> Self {
        Self {
            geometry,
            data: vec![value; geometry.len()],
            nodata: None,
        }
    }

    /// A grid with every sample missing.
    pub fn nan(geometry: GridGeometry) -> Self {
        Self::filled(geometry, f32::NAN)
    }

    /// A grid of zeros with the same geometry as `self`.
    pub fn zeros_like(&self) -> Self {
        Self::filled(self.geometry, 0.0)
    }

    pub fn with_nodata(mut self, nodata: f32) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn width(&self) -> usize {
        self.geometry.width
    }

    pub fn height(&self) -> usize {
        self.geometry.height
    }

    pub fn shape(&self) -> (usize, usize) {
        self.geometry.shape()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Sample at integer pixel position, `None` outside the grid.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.geometry.width || row >= self.geometry.height {
            return None;
        }
        Some(self.data[row * self.geometry.width + col])
    }

    /// Fail with a shape mismatch unless `other` has the same width/height.
    pub fn ensure_same_shape(&self, other_shape: (usize, usize)) -> BloomResult<()> {
        if self.shape() != other_shape {
            return Err(BloomError::shape_mismatch(self.shape(), other_shape));
        }
        Ok(())
    }

    /// Apply `f` to every sample.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Grid {
        Grid {
            geometry: self.geometry,
            data: self.data.iter().map(|&v| f(v)).collect(),
            nodata: self.nodata,
        }
    }

    /// Combine two equally shaped grids sample by sample.
    pub fn zip_map(&self, other: &Grid, f: impl Fn(f32, f32) -> f32) -> BloomResult<Grid> {
        self.ensure_same_shape(other.shape())?;
        Ok(Grid {
            geometry: self.geometry,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
            nodata: self.nodata,
        })
    }

    /// Count of non-NaN samples.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

/// A byte-coded classification raster (one code per pixel).
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    geometry: GridGeometry,
    data: Vec<u8>,
}

impl Mask {
    /// Create a mask, failing if `data.len() != width * height`.
    pub fn new(geometry: GridGeometry, data: Vec<u8>) -> BloomResult<Self> {
        geometry.check_len(data.len())?;
        Ok(Self { geometry, data })
    }

    pub fn filled(geometry: GridGeometry, value: u8) -> Self {
        Self {
            geometry,
            data: vec![value; geometry.len()],
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn width(&self) -> usize {
        self.geometry.width
    }

    pub fn height(&self) -> usize {
        self.geometry.height
    }

    pub fn shape(&self) -> (usize, usize) {
        self.geometry.shape()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn map(&self, f: impl Fn(u8) -> u8) -> Mask {
        Mask {
            geometry: self.geometry,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// The three co-registered inputs of one scene.
#[derive(Debug, Clone)]
pub struct BandSet {
    /// Green reflectance (B03).
    pub primary: Grid,
    /// Red-edge reflectance (B05), resampled onto the primary's grid.
    pub secondary: Grid,
    /// Scene classification codes (SCL), nearest-resampled.
    pub classification: Mask,
}

impl BandSet {
    /// Geometry shared by all three members.
    pub fn geometry(&self) -> &GridGeometry {
        self.primary.geometry()
    }
}

/// Per-pixel statistics over a trailing window of index grids.
#[derive(Debug, Clone)]
pub struct Baseline {
    pub mean: Grid,
    pub std: Grid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(w: usize, h: usize) -> GridGeometry {
        GridGeometry::new(w, h, 500_000.0, 4_200_000.0, 10.0, Epsg(32610))
    }

    #[test]
    fn test_grid_rejects_wrong_length() {
        let err = Grid::new(geom(3, 2), vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, BloomError::InvalidInput(_)));
        assert!(Grid::new(geom(3, 2), vec![0.0; 6]).is_ok());
    }

    #[test]
    fn test_mask_rejects_wrong_length() {
        assert!(Mask::new(geom(2, 2), vec![4; 3]).is_err());
        assert_eq!(Mask::filled(geom(2, 2), 4).data().len(), 4);
    }

    #[test]
    fn test_extent_and_pixel() {
        let g = geom(10, 5);
        let e = g.extent();
        assert_eq!(e.min_x, 500_000.0);
        assert_eq!(e.max_x, 500_100.0);
        assert_eq!(e.max_y, 4_200_000.0);
        assert_eq!(e.min_y, 4_199_950.0);

        let (px, py) = g.to_pixel(500_025.0, 4_199_985.0);
        assert_eq!(px, 2.5);
        assert_eq!(py, 1.5);
    }

    #[test]
    fn test_zip_map_shape_mismatch() {
        let a = Grid::filled(geom(2, 2), 1.0);
        let b = Grid::filled(geom(3, 2), 1.0);
        let err = a.zip_map(&b, |x, y| x + y).unwrap_err();
        assert!(matches!(
            err,
            BloomError::ShapeMismatch {
                expected: (2, 2),
                actual: (3, 2)
            }
        ));
    }

    #[test]
    fn test_get_bounds() {
        let g = Grid::new(geom(2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(g.get(1, 1), Some(4.0));
        assert_eq!(g.get(2, 0), None);
    }
}
