//! STAC Item Search models.
//!
//! Only the subset the pipeline reads: ids, assets, cloud cover and bbox.
//! Everything else on an item is kept in `extra` maps and ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bloom_common::{BoundingBox, DateWindow, Scene, SceneAsset};

/// Maximum items requested per search.
pub const SEARCH_LIMIT: u32 = 100;

/// Property used to rank scenes.
pub const CLOUD_COVER_FIELD: &str = "properties.eo:cloud_cover";

// ---------------------------------------------------------------------------
// Search request
// ---------------------------------------------------------------------------

/// Body for `POST {endpoint}/search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StacSearchRequest {
    pub collections: Vec<String>,
    pub bbox: [f64; 4],
    pub datetime: String,
    pub limit: u32,
    pub sortby: Vec<SortBy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: String,
}

impl StacSearchRequest {
    /// Search `collection` over `bbox` and the whole days of `window`,
    /// sorted by ascending cloud cover.
    pub fn new(collection: &str, bbox: &BoundingBox, window: DateWindow) -> Self {
        Self {
            collections: vec![collection.to_string()],
            bbox: bbox.to_array(),
            datetime: window.to_interval(),
            limit: SEARCH_LIMIT,
            sortby: vec![SortBy {
                field: CLOUD_COVER_FIELD.to_string(),
                direction: "asc".to_string(),
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A STAC Item Collection (GeoJSON FeatureCollection).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StacItemCollection {
    #[serde(default)]
    pub features: Vec<StacItem>,
}

/// A single STAC Item (GeoJSON Feature).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacItem {
    pub id: String,

    /// `[west, south, east, north]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    #[serde(default)]
    pub properties: StacItemProperties,

    #[serde(default)]
    pub assets: BTreeMap<String, StacAsset>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StacItemProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(
        rename = "eo:cloud_cover",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cloud_cover: Option<f64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StacAsset {
    pub href: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl From<StacItem> for Scene {
    fn from(item: StacItem) -> Self {
        let bbox = item
            .bbox
            .as_deref()
            .and_then(|b| match b {
                // 2D bbox, or 3D with min/max elevation
                [w, s, e, n] | [w, s, _, e, n, _] => Some(BoundingBox::new(*w, *s, *e, *n)),
                _ => None,
            });

        Scene {
            id: item.id,
            cloud_cover: item.properties.cloud_cover,
            assets: item
                .assets
                .into_iter()
                .map(|(name, asset)| {
                    (
                        name,
                        SceneAsset {
                            href: asset.href,
                            media_type: asset.media_type,
                        },
                    )
                })
                .collect(),
            bbox,
            datetime: item.properties.datetime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_request_body() {
        let bbox = BoundingBox::new(-121.5, 38.2, -121.0, 38.6);
        let window = DateWindow::around(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(), 3);
        let request = StacSearchRequest::new("sentinel-2-l2a", &bbox, window);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["collections"][0], "sentinel-2-l2a");
        assert_eq!(json["bbox"][0], -121.5);
        assert_eq!(json["datetime"], "2025-08-29T00:00:00Z/2025-09-04T23:59:59Z");
        assert_eq!(json["limit"], 100);
        assert_eq!(json["sortby"][0]["field"], "properties.eo:cloud_cover");
        assert_eq!(json["sortby"][0]["direction"], "asc");
    }

    #[test]
    fn test_item_to_scene() {
        let value = test_utils::fixtures::stac_item(
            "S2B_10SFH_20250901_0_L2A",
            Some(12.5),
            &[("green", "https://x/B03.tif"), ("scl", "https://x/SCL.tif")],
        );
        let item: StacItem = serde_json::from_value(value).unwrap();
        let scene = Scene::from(item);

        assert_eq!(scene.id, "S2B_10SFH_20250901_0_L2A");
        assert_eq!(scene.cloud_cover, Some(12.5));
        assert_eq!(scene.assets["green"].href, "https://x/B03.tif");
        assert!(scene.assets["green"].media_type.is_some());
        assert_eq!(scene.bbox, Some(BoundingBox::new(-122.0, 37.9, -120.7, 38.9)));
        assert_eq!(scene.datetime.as_deref(), Some("2025-09-01T18:55:21Z"));
    }

    #[test]
    fn test_item_without_optional_fields() {
        let item: StacItem = serde_json::from_str(r#"{"id": "bare"}"#).unwrap();
        let scene = Scene::from(item);
        assert!(scene.cloud_cover.is_none());
        assert!(scene.bbox.is_none());
        assert!(scene.assets.is_empty());
    }
}
