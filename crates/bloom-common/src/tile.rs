//! Slippy-map tile addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tile edge length in pixels for every rendered tile.
pub const TILE_SIZE: usize = 256;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x), growing east
    pub x: u32,
    /// Row (y), growing south
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at this zoom.
    pub fn tiles_per_axis(z: u32) -> u32 {
        1u32 << z
    }

    /// True when x and y are inside the zoom level's matrix.
    pub fn is_valid(&self) -> bool {
        let n = Self::tiles_per_axis(self.z);
        self.x < n && self.y < n
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TileCoord::new(7, 20, 49).to_string(), "7/20/49");
    }

    #[test]
    fn test_validity() {
        assert!(TileCoord::new(1, 1, 1).is_valid());
        assert!(!TileCoord::new(1, 2, 0).is_valid());
        assert_eq!(TileCoord::tiles_per_axis(14), 16384);
    }
}
