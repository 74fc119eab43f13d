//! Common test fixtures for bloom pipeline tests.

use serde_json::{json, Value};

/// Common areas of interest.
pub mod aoi {
    /// Sacramento-San Joaquin delta, the reference scenario AOI.
    pub const DELTA: [f64; 4] = [-121.5, 38.2, -121.0, 38.6];

    /// A tiny AOI that fits inside one tile at zoom 10.
    pub const SMALL: [f64; 4] = [-121.30, 38.40, -121.28, 38.42];
}

/// Band asset names as served by Earth Search.
pub mod bands {
    pub const EARTH_SEARCH: [&str; 3] = ["green", "rededge1", "scl"];
    pub const SAFE_NAMES: [&str; 3] = ["B03", "B05", "SCL"];
}

/// A STAC item with the given assets (`(name, href)` pairs).
pub fn stac_item(id: &str, cloud_cover: Option<f64>, assets: &[(&str, &str)]) -> Value {
    let mut asset_map = serde_json::Map::new();
    for (name, href) in assets {
        asset_map.insert(
            name.to_string(),
            json!({ "href": href, "type": "image/tiff; application=geotiff; profile=cloud-optimized" }),
        );
    }

    let mut properties = json!({ "datetime": "2025-09-01T18:55:21Z" });
    if let Some(cc) = cloud_cover {
        properties["eo:cloud_cover"] = json!(cc);
    }

    json!({
        "type": "Feature",
        "stac_version": "1.0.0",
        "id": id,
        "bbox": [-122.0, 37.9, -120.7, 38.9],
        "geometry": null,
        "properties": properties,
        "assets": Value::Object(asset_map),
        "links": []
    })
}

/// A STAC search response wrapping `items`.
pub fn stac_item_collection(items: Vec<Value>) -> Value {
    let matched = items.len();
    json!({
        "type": "FeatureCollection",
        "features": items,
        "context": { "returned": matched, "limit": 100, "matched": matched }
    })
}

/// A scene item whose band hrefs all live under `prefix`.
pub fn scene_item(id: &str, cloud_cover: f64, prefix: &str) -> Value {
    let hrefs: Vec<String> = bands::EARTH_SEARCH
        .iter()
        .map(|b| format!("{}/{}.tif", prefix, b))
        .collect();
    let assets: Vec<(&str, &str)> = bands::EARTH_SEARCH
        .iter()
        .zip(&hrefs)
        .map(|(name, href)| (*name, href.as_str()))
        .collect();
    stac_item(id, Some(cloud_cover), &assets)
}
