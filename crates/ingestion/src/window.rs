//! Raster georeferencing and pixel windows.

use bloom_common::{BoundingBox, Epsg, GridGeometry};

/// Georeferencing of a north-up raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    /// Top-left corner in `epsg` units.
    pub origin_x: f64,
    pub origin_y: f64,
    /// Pixel width, positive.
    pub res_x: f64,
    /// Pixel height, positive (rows grow south).
    pub res_y: f64,
    pub epsg: Epsg,
}

impl RasterInfo {
    /// Extent covered by the raster in its own CRS.
    pub fn extent(&self) -> BoundingBox {
        BoundingBox::new(
            self.origin_x,
            self.origin_y - self.height as f64 * self.res_y,
            self.origin_x + self.width as f64 * self.res_x,
            self.origin_y,
        )
    }
}

/// A rectangular block of pixels, `[x, x + width) x [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelWindow {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Pixels covering `bbox` (given in the raster's CRS).
    ///
    /// Bounds are floored/ceiled against the raster origin, clamped to the
    /// raster, and never smaller than 1x1. A bbox entirely past an edge
    /// yields the last row/column on that edge.
    pub fn from_bbox(info: &RasterInfo, bbox: &BoundingBox) -> Self {
        let (x, width) = axis_span(
            (bbox.min_x - info.origin_x) / info.res_x,
            (bbox.max_x - info.origin_x) / info.res_x,
            info.width,
        );
        let (y, height) = axis_span(
            (info.origin_y - bbox.max_y) / info.res_y,
            (info.origin_y - bbox.min_y) / info.res_y,
            info.height,
        );
        Self::new(x, y, width, height)
    }

    pub fn x_end(&self) -> u32 {
        self.x + self.width
    }

    pub fn y_end(&self) -> u32 {
        self.y + self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Geometry of the grid read from this window.
    pub fn geometry(&self, info: &RasterInfo) -> GridGeometry {
        GridGeometry::new(
            self.width as usize,
            self.height as usize,
            info.origin_x + self.x as f64 * info.res_x,
            info.origin_y - self.y as f64 * info.res_y,
            info.res_x,
            info.epsg,
        )
    }
}

/// Start and length along one axis for fractional pixel bounds.
fn axis_span(lo: f64, hi: f64, size: u32) -> (u32, u32) {
    let size = size.max(1) as i64;
    let start = (lo.floor() as i64).max(0);
    let end = (hi.ceil() as i64).min(size);
    let length = (end - start).max(1);

    let start = start.min(size - 1);
    let length = length.min(size - start);
    (start as u32, length as u32)
}
