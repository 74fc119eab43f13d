//! Output layer kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two rendered layers of a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Fused bloom probability in [0, 1].
    Bloom,
    /// Z-score anomaly against the rolling baseline.
    Anomaly,
}

impl LayerKind {
    pub const ALL: [LayerKind; 2] = [LayerKind::Bloom, LayerKind::Anomaly];

    /// Path segment used in tile paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Bloom => "bloom",
            LayerKind::Anomaly => "anomaly",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
