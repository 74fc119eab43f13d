//! Bloom worker: runs per-AOI jobs end to end.
//!
//! For each requested date the worker searches the scene catalog, aligns the
//! bands, masks clouds, computes the index products, renders both tile
//! pyramids and writes the date record and timeseries.

pub mod config;
pub mod history;
pub mod job;
pub mod timeseries;

pub use config::{DateFailurePolicy, StorageMode, WorkerConfig};
pub use history::IndexHistory;
pub use job::{
    job_input, DateOutcome, DateReport, DateState, JobReport, JobRunner, JobSettings,
    NO_SCENES_NOTE,
};
pub use timeseries::{merge_points, sample_mean, update_timeseries};
