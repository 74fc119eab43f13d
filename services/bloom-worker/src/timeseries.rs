//! AOI-level timeseries of index and bloom values.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use bloom_common::{round_to, BloomResult, BoundingBox, Epsg, Grid, TimeseriesPoint};
use projection::CrsTransformer;
use storage::{write_json, StoragePath, StorageSink};

/// Fraction of the bbox size the corner samples are pulled inward by.
pub const SAMPLE_INSET: f64 = 0.1;

/// Mean of the non-NaN nearest-pixel values at WGS84 `points`, rounded to
/// 4 decimals. 0 when no point has a value.
pub fn sample_mean(grid: &Grid, points: &[(f64, f64)]) -> BloomResult<f64> {
    let to_grid = CrsTransformer::new(Epsg::WGS84, grid.geometry().crs)?;
    let geom = grid.geometry();

    let mut sum = 0.0;
    let mut count = 0usize;
    for &(lon, lat) in points {
        let Ok((gx, gy)) = to_grid.transform(lon, lat) else {
            continue;
        };
        let (x, y) = geom.to_pixel(gx, gy);
        if x < 0.0 || y < 0.0 {
            continue;
        }
        match grid.get(x.floor() as usize, y.floor() as usize) {
            Some(v) if !v.is_nan() => {
                sum += v as f64;
                count += 1;
            }
            _ => {}
        }
    }

    if count == 0 {
        return Ok(0.0);
    }
    Ok(round_to(sum / count as f64, 4))
}

/// The timeseries entry for one processed date.
pub fn timeseries_point(
    date: NaiveDate,
    bbox: &BoundingBox,
    index: &Grid,
    bloom: &Grid,
) -> BloomResult<TimeseriesPoint> {
    let points = bbox.sample_points(SAMPLE_INSET);
    Ok(TimeseriesPoint {
        date,
        ari: sample_mean(index, &points)?,
        bloom_probability: sample_mean(bloom, &points)?,
    })
}

/// One point per date, ascending. Later points win over earlier ones.
pub fn merge_points(points: impl IntoIterator<Item = TimeseriesPoint>) -> Vec<TimeseriesPoint> {
    let mut by_date = BTreeMap::new();
    for point in points {
        by_date.insert(point.date, point);
    }
    by_date.into_values().collect()
}

/// Stored timeseries documents are arrays, older ones a single object.
#[derive(Deserialize)]
#[serde(untagged)]
enum TimeseriesDocument {
    Many(Vec<TimeseriesPoint>),
    One(TimeseriesPoint),
}

/// Every point stored under `{aoi_id}/*/timeseries.json`. Unreadable
/// documents are skipped.
pub async fn load_existing(sink: &dyn StorageSink, aoi_id: &str) -> BloomResult<Vec<TimeseriesPoint>> {
    let mut points = Vec::new();

    for path in sink.list(&format!("{}/", aoi_id)).await? {
        if !StoragePath::is_timeseries(&path) {
            continue;
        }

        let parsed = match sink.read(&path).await {
            Ok(bytes) => serde_json::from_slice::<TimeseriesDocument>(&bytes).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match parsed {
            Ok(TimeseriesDocument::Many(many)) => points.extend(many),
            Ok(TimeseriesDocument::One(one)) => points.push(one),
            Err(error) => warn!(path = %path, error = %error, "Skipping unreadable timeseries"),
        }
    }

    Ok(points)
}

/// Sample the grids, merge with stored points and write
/// `{aoi_id}/{date}/timeseries.json`.
#[instrument(skip(sink, bbox, index, bloom))]
pub async fn update_timeseries(
    sink: &dyn StorageSink,
    aoi_id: &str,
    date: NaiveDate,
    bbox: &BoundingBox,
    index: &Grid,
    bloom: &Grid,
) -> BloomResult<Vec<TimeseriesPoint>> {
    let current = timeseries_point(date, bbox, index, bloom)?;

    let mut points = load_existing(sink, aoi_id).await?;
    points.push(current);
    let merged = merge_points(points);

    write_json(sink, &StoragePath::timeseries(aoi_id, date), &merged).await?;
    debug!(points = merged.len(), "Updated timeseries");
    Ok(merged)
}
