//! Scenes returned by the catalog.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A downloadable asset of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAsset {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// The role a band plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandRole {
    /// Green band defining the canonical 10 m grid.
    Primary,
    /// Red-edge band, continuous, bilinear-resampled.
    Secondary,
    /// Scene classification, categorical, nearest-resampled.
    Classification,
}

impl BandRole {
    pub const ALL: [BandRole; 3] = [
        BandRole::Primary,
        BandRole::Secondary,
        BandRole::Classification,
    ];

    /// Asset names accepted for this role, matched case-insensitively.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            BandRole::Primary => &["B03", "green"],
            BandRole::Secondary => &["B05", "rededge1"],
            BandRole::Classification => &["SCL"],
        }
    }

    pub fn canonical_name(&self) -> &'static str {
        self.aliases()[0]
    }

    /// Whether values are categorical codes rather than measurements.
    pub fn is_categorical(&self) -> bool {
        matches!(self, BandRole::Classification)
    }
}

impl fmt::Display for BandRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// An immutable catalog scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    /// `eo:cloud_cover`, when the catalog reports one.
    pub cloud_cover: Option<f64>,
    pub assets: BTreeMap<String, SceneAsset>,
    pub bbox: Option<BoundingBox>,
    pub datetime: Option<String>,
}

impl Scene {
    /// Cloud cover used for ranking. Scenes without one rank last.
    pub fn cloud_cover_percent(&self) -> f64 {
        self.cloud_cover.unwrap_or(100.0)
    }

    /// Find the asset for a role using its aliases in order.
    pub fn asset(&self, role: BandRole) -> Option<&SceneAsset> {
        role.aliases().iter().find_map(|alias| {
            self.assets
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(alias))
                .map(|(_, asset)| asset)
        })
    }

    /// Roles with no matching asset.
    pub fn missing_roles(&self) -> Vec<BandRole> {
        BandRole::ALL
            .into_iter()
            .filter(|role| self.asset(*role).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(names: &[&str]) -> Scene {
        Scene {
            id: "S2B_10SFH_20250901_0_L2A".to_string(),
            cloud_cover: Some(4.2),
            assets: names
                .iter()
                .map(|n| {
                    (
                        n.to_string(),
                        SceneAsset {
                            href: format!("https://example.test/{}.tif", n),
                            media_type: None,
                        },
                    )
                })
                .collect(),
            bbox: None,
            datetime: None,
        }
    }

    #[test]
    fn test_asset_aliases_case_insensitive() {
        let s = scene(&["green", "RedEdge1", "scl"]);
        assert!(s.asset(BandRole::Primary).unwrap().href.ends_with("green.tif"));
        assert!(s
            .asset(BandRole::Secondary)
            .unwrap()
            .href
            .ends_with("RedEdge1.tif"));
        assert!(s.asset(BandRole::Classification).is_some());
        assert!(s.missing_roles().is_empty());
    }

    #[test]
    fn test_canonical_name_preferred() {
        let s = scene(&["B03", "green", "B05", "SCL"]);
        assert!(s.asset(BandRole::Primary).unwrap().href.ends_with("B03.tif"));
    }

    #[test]
    fn test_missing_roles() {
        let s = scene(&["B03"]);
        assert_eq!(
            s.missing_roles(),
            vec![BandRole::Secondary, BandRole::Classification]
        );
    }

    #[test]
    fn test_missing_cloud_cover_ranks_last() {
        let mut s = scene(&[]);
        s.cloud_cover = None;
        assert_eq!(s.cloud_cover_percent(), 100.0);
    }
}
