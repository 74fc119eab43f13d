//! Per-AOI job: processes dates in sequence and writes tiles, date records
//! and the timeseries.
//!
//! Each date moves through
//!
//! ```text
//! NotProcessed ─► Searching ─► BandsAligning ─► Masking ─► IndexComputing
//!      │              │              │                           │
//!      ▼              ▼              ▼                           ▼
//!    Done      EmptyOutputWritten ◄──┘                    TilesRendering
//!  (skipped)          │                                          │
//!                     ▼                                          ▼
//!                    Done ◄── TimeseriesUpdating ◄──────── MetaWriting
//! ```
//!
//! Zero scenes and alignment failures take the empty-output path: a fully
//! transparent pyramid for both layers plus a date record with
//! `cloud_pct = 100` and no zoom levels.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use bloom_common::{
    search_window, BandSet, BloomResult, BoundingBox, DateRecord, Grid, JobInput, LayerKind,
    Thresholds,
};
use grid_processor::{
    apply_mask, bloom_score_with, build_valid_mask, cloud_fraction, compute_index, delta,
    rolling_baseline, z_score, IndexConfig,
};
use ingestion::BandAligner;
use renderer::{PyramidTarget, PyramidWriter};
use scene_catalog::SceneCatalog;
use storage::{write_json, StoragePath, StorageSink};

use crate::config::{DateFailurePolicy, WorkerConfig};
use crate::history::IndexHistory;
use crate::timeseries::update_timeseries;

/// Notes of the date record written when no scene was found.
pub const NO_SCENES_NOTE: &str = "No scenes available";

/// Processing state of one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateState {
    NotProcessed,
    Searching,
    BandsAligning,
    Masking,
    IndexComputing,
    TilesRendering,
    MetaWriting,
    TimeseriesUpdating,
    EmptyOutputWritten,
    Done,
}

/// How a date ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DateOutcome {
    Processed { scene_id: String, cloud_pct: f64 },
    Skipped,
    Empty { reason: String },
    Failed { error: String },
}

impl DateOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DateOutcome::Processed { .. } => "processed",
            DateOutcome::Skipped => "skipped",
            DateOutcome::Empty { .. } => "empty",
            DateOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateReport {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub outcome: DateOutcome,
}

/// Summary of one job run.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub run_id: Uuid,
    pub aoi_id: String,
    pub dates: Vec<DateReport>,
}

impl JobReport {
    pub fn count(&self, label: &str) -> usize {
        self.dates.iter().filter(|d| d.outcome.label() == label).count()
    }

    pub fn outcome(&self, date: NaiveDate) -> Option<&DateOutcome> {
        self.dates.iter().find(|d| d.date == date).map(|d| &d.outcome)
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {} for {}: {} processed, {} skipped, {} empty, {} failed",
            self.run_id,
            self.aoi_id,
            self.count("processed"),
            self.count("skipped"),
            self.count("empty"),
            self.count("failed")
        )
    }
}

/// Tunables of a job run.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub zoom_min: u32,
    pub zoom_max: u32,
    pub search_window_days: u32,
    pub history_size: usize,
    pub index: IndexConfig,
    pub thresholds: Thresholds,
    pub failure_policy: DateFailurePolicy,
    pub render_concurrency: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self::from(&WorkerConfig::default())
    }
}

impl From<&WorkerConfig> for JobSettings {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            zoom_min: config.zoom_min,
            zoom_max: config.zoom_max,
            search_window_days: config.search_window_days,
            history_size: config.history_size,
            index: config.index_config(),
            thresholds: Thresholds::default(),
            failure_policy: config.failure_policy,
            render_concurrency: config.render_concurrency,
        }
    }
}

/// Index, anomaly and bloom grids of one processed date.
struct DateProducts {
    index: Grid,
    z: Grid,
    bloom: Grid,
}

/// Runs jobs for one AOI at a time.
pub struct JobRunner {
    catalog: SceneCatalog,
    aligner: BandAligner,
    sink: Arc<dyn StorageSink>,
    pyramids: PyramidWriter,
    settings: JobSettings,
}

impl JobRunner {
    pub fn new(
        catalog: SceneCatalog,
        aligner: BandAligner,
        sink: Arc<dyn StorageSink>,
        settings: JobSettings,
    ) -> Self {
        let pyramids = PyramidWriter::new(sink.clone(), settings.render_concurrency);
        Self {
            catalog,
            aligner,
            sink,
            pyramids,
            settings,
        }
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Process every date of `input` in the given order.
    ///
    /// History is local to the run. With [`DateFailurePolicy::Abort`] the
    /// first failing date ends the job with its error.
    #[instrument(skip(self, input), fields(aoi_id = %input.aoi_id, dates = input.dates.len()))]
    pub async fn run(&self, input: &JobInput) -> BloomResult<JobReport> {
        input.validate()?;

        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            bbox = ?input.bbox.to_array(),
            force = input.force,
            "Starting job"
        );

        let mut history = IndexHistory::new(self.settings.history_size);
        let mut reports = Vec::with_capacity(input.dates.len());

        for (i, &date) in input.dates.iter().enumerate() {
            let previous = i.checked_sub(1).map(|p| input.dates[p]);

            let outcome = match self.process_date(input, date, previous, &mut history).await {
                Ok(outcome) => outcome,
                Err(e) if self.settings.failure_policy == DateFailurePolicy::Abort => {
                    error!(%date, error = %e, "Date failed, aborting job");
                    metrics::counter!("bloom_dates_processed_total", "outcome" => "failed")
                        .increment(1);
                    return Err(e);
                }
                Err(e) => {
                    warn!(%date, error = %e, kind = e.kind(), "Date failed, writing empty output");
                    let notes = format!("Processing failed: {}", e);
                    if let Err(write_err) = self.write_empty_output(input, date, &notes).await {
                        error!(%date, error = %write_err, "Failed to write empty output");
                    }
                    DateOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            metrics::counter!("bloom_dates_processed_total", "outcome" => outcome.label())
                .increment(1);
            reports.push(DateReport { date, outcome });
        }

        let report = JobReport {
            run_id,
            aoi_id: input.aoi_id.clone(),
            dates: reports,
        };
        info!(%report, "Job complete");
        Ok(report)
    }

    #[instrument(skip(self, input, history), fields(aoi_id = %input.aoi_id))]
    async fn process_date(
        &self,
        input: &JobInput,
        date: NaiveDate,
        previous: Option<NaiveDate>,
        history: &mut IndexHistory,
    ) -> BloomResult<DateOutcome> {
        let mut state = DateState::NotProcessed;

        if !input.force && self.sink.exists(&StoragePath::meta(&input.aoi_id, date)).await? {
            info!("Date record exists, skipping");
            return Ok(DateOutcome::Skipped);
        }

        advance(&mut state, DateState::Searching);
        let (start, end) = search_window(date, self.settings.search_window_days);
        let scenes = self.catalog.search(&input.bbox, start, end).await?;

        let Some(scene) = scenes.first() else {
            info!("No scenes found, writing empty output");
            self.write_empty_output(input, date, NO_SCENES_NOTE).await?;
            advance(&mut state, DateState::EmptyOutputWritten);
            return Ok(DateOutcome::Empty {
                reason: NO_SCENES_NOTE.to_string(),
            });
        };

        advance(&mut state, DateState::BandsAligning);
        info!(scene_id = %scene.id, cloud_cover = scene.cloud_cover_percent(), "Using scene");
        let bands = match self.aligner.align(scene, &input.bbox).await {
            Ok(bands) => bands,
            Err(e) => {
                warn!(scene_id = %scene.id, error = %e, "Band alignment failed, writing empty output");
                let reason = format!("Band alignment failed for {}: {}", scene.id, e);
                self.write_empty_output(input, date, &reason).await?;
                advance(&mut state, DateState::EmptyOutputWritten);
                return Ok(DateOutcome::Empty { reason });
            }
        };

        advance(&mut state, DateState::Masking);
        let cloud_pct = cloud_fraction(&bands.classification);
        let (primary, secondary) = mask_bands(&bands)?;
        debug!(cloud_pct, "Masked bands");

        advance(&mut state, DateState::IndexComputing);
        let products = self.compute_products(&primary, &secondary, previous, history)?;

        advance(&mut state, DateState::TilesRendering);
        let target = self.target(input, date);
        let bloom = Arc::new(products.bloom);
        self.pyramids
            .write(bloom.clone(), &target, LayerKind::Bloom)
            .await?;
        self.pyramids
            .write(Arc::new(products.z), &target, LayerKind::Anomaly)
            .await?;

        advance(&mut state, DateState::MetaWriting);
        let record = DateRecord::processed(
            date,
            cloud_pct,
            self.settings.zoom_min,
            self.settings.zoom_max,
            &scene.id,
            self.settings.thresholds,
        );
        write_json(self.sink.as_ref(), &StoragePath::meta(&input.aoi_id, date), &record).await?;

        advance(&mut state, DateState::TimeseriesUpdating);
        update_timeseries(
            self.sink.as_ref(),
            &input.aoi_id,
            date,
            &input.bbox,
            &products.index,
            &bloom,
        )
        .await?;
        history.insert(date, products.index);

        advance(&mut state, DateState::Done);
        info!(scene_id = %scene.id, cloud_pct = record.cloud_pct, "Date processed");
        Ok(DateOutcome::Processed {
            scene_id: scene.id.clone(),
            cloud_pct: record.cloud_pct,
        })
    }

    /// Index, delta, baseline, z-score and bloom score for one date.
    ///
    /// The baseline window is the held grids of the same shape plus the
    /// current index. History itself is left untouched; the caller inserts
    /// the index once the date has been written.
    fn compute_products(
        &self,
        primary: &Grid,
        secondary: &Grid,
        previous: Option<NaiveDate>,
        history: &IndexHistory,
    ) -> BloomResult<DateProducts> {
        let config = &self.settings.index;

        let index = compute_index(primary, secondary, config.epsilon)?;
        let change = delta(&index, previous.and_then(|p| history.get(p)));

        let mut window = history.matching(index.shape());
        if window.len() < history.len() {
            debug!(
                held = history.len(),
                matching = window.len(),
                "Leaving differently shaped grids out of the baseline"
            );
        }
        window.push(&index);
        let baseline = rolling_baseline(&window, config.baseline_window)?;

        let z = z_score(&index, &baseline, config.std_epsilon)?;
        let bloom = bloom_score_with(&z, &change, config)?;
        debug!(
            window = window.len(),
            valid = index.valid_count(),
            "Computed index products"
        );

        Ok(DateProducts { index, z, bloom })
    }

    /// Transparent pyramid for both layers and the empty date record.
    #[instrument(skip(self, input), fields(aoi_id = %input.aoi_id))]
    async fn write_empty_output(
        &self,
        input: &JobInput,
        date: NaiveDate,
        notes: &str,
    ) -> BloomResult<()> {
        let target = self.target(input, date);
        for kind in LayerKind::ALL {
            self.pyramids.write_empty(&target, kind).await?;
        }

        let record = DateRecord::empty(date, notes, self.settings.thresholds);
        write_json(self.sink.as_ref(), &StoragePath::meta(&input.aoi_id, date), &record).await
    }

    fn target(&self, input: &JobInput, date: NaiveDate) -> PyramidTarget {
        PyramidTarget {
            aoi_id: input.aoi_id.clone(),
            date,
            aoi: input.bbox,
            zoom_min: self.settings.zoom_min,
            zoom_max: self.settings.zoom_max,
        }
    }
}

fn advance(state: &mut DateState, next: DateState) {
    debug!(from = ?*state, to = ?next, "Date state");
    *state = next;
}

/// Primary and secondary bands with invalid pixels set to NaN.
fn mask_bands(bands: &BandSet) -> BloomResult<(Grid, Grid)> {
    let valid = build_valid_mask(&bands.classification);
    Ok((
        apply_mask(&bands.primary, &valid)?,
        apply_mask(&bands.secondary, &valid)?,
    ))
}

/// Convenience for callers holding a bbox and an explicit date list.
pub fn job_input(aoi_id: &str, bbox: BoundingBox, dates: Vec<NaiveDate>, force: bool) -> JobInput {
    JobInput {
        aoi_id: aoi_id.to_string(),
        bbox,
        dates,
        force,
        name: None,
        start: None,
        end: None,
    }
}
