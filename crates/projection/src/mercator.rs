//! Spherical Web Mercator (EPSG:3857) and slippy-map tile math.

use bloom_common::{BoundingBox, TileCoord};
use std::f64::consts::PI;

/// WGS84 semi-major axis used by Web Mercator (meters).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half the projected world width (meters), `PI * EARTH_RADIUS`.
pub const ORIGIN_SHIFT: f64 = 20037508.342789244;

/// Latitude at which the Web Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.05112877980659;

/// Project longitude/latitude (degrees) to Web Mercator meters.
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Inverse of [`lon_lat_to_mercator`].
pub fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// Tile containing a longitude/latitude at zoom `z`, clamped to the
/// zoom level's matrix.
pub fn lon_lat_to_tile(lon: f64, lat: f64, z: u32) -> TileCoord {
    let n = TileCoord::tiles_per_axis(z) as f64;
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor();

    let max = n - 1.0;
    TileCoord::new(z, x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
}

/// Bounds of a tile in Web Mercator meters.
pub fn tile_bounds(coord: TileCoord) -> BoundingBox {
    let n = TileCoord::tiles_per_axis(coord.z) as f64;
    let span = 2.0 * ORIGIN_SHIFT / n;

    let min_x = -ORIGIN_SHIFT + coord.x as f64 * span;
    let max_y = ORIGIN_SHIFT - coord.y as f64 * span;

    BoundingBox::new(min_x, max_y - span, min_x + span, max_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = lon_lat_to_mercator(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_world_edge() {
        let (x, _) = lon_lat_to_mercator(180.0, 0.0);
        assert!((x - ORIGIN_SHIFT).abs() < 1e-6);
        let (_, y) = lon_lat_to_mercator(0.0, MAX_LATITUDE);
        assert!((y - ORIGIN_SHIFT).abs() < 1e-3, "y = {}", y);
    }

    #[test]
    fn test_mercator_roundtrip() {
        for &(lon, lat) in &[(-121.25, 38.4), (151.2, -33.9), (0.0, 60.0)] {
            let (x, y) = lon_lat_to_mercator(lon, lat);
            let (lon2, lat2) = mercator_to_lon_lat(x, y);
            assert!((lon - lon2).abs() < 1e-9, "lon {} vs {}", lon, lon2);
            assert!((lat - lat2).abs() < 1e-9, "lat {} vs {}", lat, lat2);
        }
    }

    #[test]
    fn test_tile_zero() {
        let b = tile_bounds(TileCoord::new(0, 0, 0));
        assert!((b.min_x + ORIGIN_SHIFT).abs() < 1e-6);
        assert!((b.max_y - ORIGIN_SHIFT).abs() < 1e-6);
        assert_eq!(lon_lat_to_tile(-121.0, 38.0, 0), TileCoord::new(0, 0, 0));
    }

    #[test]
    fn test_known_tile() {
        // Sacramento delta at zoom 7
        assert_eq!(lon_lat_to_tile(-121.5, 38.6, 7), TileCoord::new(7, 20, 49));
    }

    #[test]
    fn test_tile_center_roundtrip() {
        for z in [0u32, 3, 7, 10, 14] {
            let n = TileCoord::tiles_per_axis(z);
            for &(x, y) in &[(0, 0), (n / 3, n / 2), (n - 1, n - 1)] {
                let coord = TileCoord::new(z, x, y);
                let (cx, cy) = tile_bounds(coord).center();
                let (lon, lat) = mercator_to_lon_lat(cx, cy);
                assert_eq!(lon_lat_to_tile(lon, lat, z), coord);
            }
        }
    }

    #[test]
    fn test_clamps_outside_world() {
        assert_eq!(lon_lat_to_tile(180.0, -89.0, 2), TileCoord::new(2, 3, 3));
        assert_eq!(lon_lat_to_tile(-200.0, 89.0, 2), TileCoord::new(2, 0, 0));
    }
}
