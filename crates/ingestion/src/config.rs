//! Band alignment configuration.

use std::fmt;
use std::str::FromStr;

/// What to do when the query bbox cannot be transformed into a band's CRS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReprojectionPolicy {
    /// Fail the band's alignment with a reprojection error.
    #[default]
    Fail,
    /// Use the untransformed bbox and log a warning.
    Fallback,
}

impl FromStr for ReprojectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(ReprojectionPolicy::Fail),
            "fallback" => Ok(ReprojectionPolicy::Fallback),
            other => Err(format!(
                "unknown reprojection policy '{}' (expected fail or fallback)",
                other
            )),
        }
    }
}

impl fmt::Display for ReprojectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReprojectionPolicy::Fail => f.write_str("fail"),
            ReprojectionPolicy::Fallback => f.write_str("fallback"),
        }
    }
}

/// Block size used when fetching byte ranges of remote rasters.
pub const DEFAULT_BLOCK_SIZE: u64 = 256 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        assert_eq!("fail".parse::<ReprojectionPolicy>(), Ok(ReprojectionPolicy::Fail));
        assert_eq!(
            " Fallback ".parse::<ReprojectionPolicy>(),
            Ok(ReprojectionPolicy::Fallback)
        );
        assert!("guess".parse::<ReprojectionPolicy>().is_err());
        assert_eq!(ReprojectionPolicy::default(), ReprojectionPolicy::Fail);
    }
}
