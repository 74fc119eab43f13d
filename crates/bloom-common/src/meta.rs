//! Records persisted next to each date's tiles, and the job input.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{BloomError, BloomResult, BoundingBox};

/// Describes how the anomaly baseline was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<Vec<i32>>,
}

impl BaselineDescriptor {
    pub fn rolling() -> Self {
        Self {
            kind: "rolling".to_string(),
            years: None,
        }
    }
}

/// Significance thresholds advertised to map clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub z_sig: f64,
    pub delta_week: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            z_sig: 2.0,
            delta_week: 0.05,
        }
    }
}

/// The per-date `meta.json` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRecord {
    pub date: NaiveDate,
    pub cloud_pct: f64,
    pub z_levels: Vec<u32>,
    pub baseline: BaselineDescriptor,
    pub thresholds: Thresholds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DateRecord {
    /// Record for a date that produced real tiles.
    pub fn processed(
        date: NaiveDate,
        cloud_pct: f64,
        zoom_min: u32,
        zoom_max: u32,
        scene_id: &str,
        thresholds: Thresholds,
    ) -> Self {
        let mut baseline = BaselineDescriptor::rolling();
        baseline.years = Some(Vec::new());
        Self {
            date,
            cloud_pct: round_to(cloud_pct, 2),
            z_levels: (zoom_min..=zoom_max).collect(),
            baseline,
            thresholds,
            notes: Some(format!("Scene: {}, Cloud: {:.1}%", scene_id, cloud_pct)),
        }
    }

    /// Record for a date whose tiles are fully transparent.
    pub fn empty(date: NaiveDate, notes: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            date,
            cloud_pct: 100.0,
            z_levels: Vec::new(),
            baseline: BaselineDescriptor::rolling(),
            thresholds,
            notes: Some(notes.into()),
        }
    }
}

/// One entry of `timeseries.json`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub date: NaiveDate,
    pub ari: f64,
    pub bloom_probability: f64,
}

/// Work order for one area of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    #[serde(alias = "aoiId")]
    pub aoi_id: String,
    pub bbox: BoundingBox,
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    #[serde(default)]
    pub force: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl JobInput {
    pub fn validate(&self) -> BloomResult<()> {
        if self.aoi_id.trim().is_empty() {
            return Err(BloomError::InvalidInput("aoi_id must not be empty".into()));
        }
        if self.aoi_id.contains('/') {
            return Err(BloomError::InvalidInput(format!(
                "aoi_id '{}' must not contain '/'",
                self.aoi_id
            )));
        }
        if !self.bbox.is_valid() {
            return Err(BloomError::InvalidInput(format!(
                "invalid bbox {:?}",
                self.bbox.to_array()
            )));
        }
        if self.dates.is_empty() {
            return Err(BloomError::InvalidInput("no dates to process".into()));
        }
        Ok(())
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
