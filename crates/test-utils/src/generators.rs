//! Generators for synthetic grids and classification masks.
//!
//! Values are predictable so tests can assert exact outputs.

use bloom_common::{Epsg, Grid, GridGeometry, Mask};

/// A WGS84 geometry with power-of-two pixel size so window arithmetic
/// is exact in floating point.
pub fn wgs84_geometry(width: usize, height: usize, origin: (f64, f64), pixel_size: f64) -> GridGeometry {
    GridGeometry::new(width, height, origin.0, origin.1, pixel_size, Epsg::WGS84)
}

/// A UTM zone 10N geometry with 10 m pixels.
pub fn utm_geometry(width: usize, height: usize) -> GridGeometry {
    GridGeometry::new(width, height, 600_000.0, 4_250_000.0, 10.0, Epsg(32610))
}

/// Grid with every sample set to `value`.
pub fn constant_grid(geometry: GridGeometry, value: f32) -> Grid {
    Grid::filled(geometry, value)
}

/// Grid whose value is `start + (col + row * width) * step`.
pub fn ramp_grid(geometry: GridGeometry, start: f32, step: f32) -> Grid {
    let data = (0..geometry.len())
        .map(|i| start + i as f32 * step)
        .collect();
    Grid::new(geometry, data).expect("ramp grid has the right length")
}

/// Grid with NaN at the given `(col, row)` positions and `value` elsewhere.
pub fn grid_with_nans(geometry: GridGeometry, value: f32, nan_positions: &[(usize, usize)]) -> Grid {
    let mut grid = Grid::filled(geometry, value);
    let width = geometry.width;
    for &(col, row) in nan_positions {
        grid.data_mut()[row * width + col] = f32::NAN;
    }
    grid
}

/// Classification mask filled with one code.
pub fn scl_mask(geometry: GridGeometry, code: u8) -> Mask {
    Mask::filled(geometry, code)
}

/// Classification mask where the left half is vegetation (4) and the right
/// half is cloud (9).
pub fn half_cloudy_mask(geometry: GridGeometry) -> Mask {
    let data = (0..geometry.len())
        .map(|i| if i % geometry.width < geometry.width / 2 { 4 } else { 9 })
        .collect();
    Mask::new(geometry, data).expect("mask has the right length")
}

/// Reflectance-like values in digital numbers (Sentinel-2 L2A scale).
pub fn reflectance_values(width: usize, height: usize, base: u16) -> Vec<u16> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(base + ((col + row) % 50) as u16);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_grid() {
        let g = ramp_grid(utm_geometry(3, 2), 1.0, 0.5);
        assert_eq!(g.data(), &[1.0, 1.5, 2.0, 2.5, 3.0, 3.5]);
    }

    #[test]
    fn test_grid_with_nans() {
        let g = grid_with_nans(utm_geometry(2, 2), 1.0, &[(1, 0)]);
        assert!(g.data()[1].is_nan());
        assert_eq!(g.valid_count(), 3);
    }

    #[test]
    fn test_half_cloudy_mask() {
        let m = half_cloudy_mask(utm_geometry(4, 1));
        assert_eq!(m.data(), &[4, 4, 9, 9]);
    }

    #[test]
    fn test_reflectance_values() {
        let v = reflectance_values(4, 4, 1000);
        assert_eq!(v.len(), 16);
        assert_eq!(v[0], 1000);
        assert_eq!(v[5], 1002);
    }
}
