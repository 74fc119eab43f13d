//! Coordinate reference system identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An EPSG coordinate reference system code.
///
/// Scene rasters arrive in whatever CRS the provider uses (UTM zones for
/// Sentinel-2), so this is an open code rather than a closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epsg(pub u16);

impl Epsg {
    /// WGS84 geographic (lon/lat in degrees).
    pub const WGS84: Epsg = Epsg(4326);
    /// Web Mercator (meters).
    pub const WEB_MERCATOR: Epsg = Epsg(3857);

    pub fn code(&self) -> u16 {
        self.0
    }

    /// True for WGS84 geographic coordinates.
    pub fn is_wgs84(&self) -> bool {
        *self == Epsg::WGS84
    }

    /// UTM zone number for WGS84 UTM codes (326xx north, 327xx south).
    pub fn utm_zone(&self) -> Option<(u8, bool)> {
        match self.0 {
            32601..=32660 => Some(((self.0 - 32600) as u8, true)),
            32701..=32760 => Some(((self.0 - 32700) as u8, false)),
            _ => None,
        }
    }
}

impl Default for Epsg {
    fn default() -> Self {
        Epsg::WGS84
    }
}

impl fmt::Display for Epsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for Epsg {
    type Err = CrsParseError;

    /// Accepts "EPSG:32610", "epsg:32610" or a bare "32610".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let digits = upper.strip_prefix("EPSG:").unwrap_or(&upper);
        digits
            .parse::<u16>()
            .map(Epsg)
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg() {
        assert_eq!("EPSG:4326".parse::<Epsg>().unwrap(), Epsg::WGS84);
        assert_eq!("epsg:32610".parse::<Epsg>().unwrap(), Epsg(32610));
        assert_eq!("3857".parse::<Epsg>().unwrap(), Epsg::WEB_MERCATOR);
        assert!("CRS:84x".parse::<Epsg>().is_err());
    }

    #[test]
    fn test_utm_zone() {
        assert_eq!(Epsg(32610).utm_zone(), Some((10, true)));
        assert_eq!(Epsg(32733).utm_zone(), Some((33, false)));
        assert_eq!(Epsg::WGS84.utm_zone(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Epsg(32610).to_string(), "EPSG:32610");
    }
}
