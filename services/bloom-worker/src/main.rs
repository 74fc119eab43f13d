//! Bloom worker binary.
//!
//! Reads an AOI job file, processes its dates and writes tiles, date records
//! and the timeseries to the configured storage.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use bloom_common::{date_series, JobInput};
use bloom_worker::{JobRunner, JobSettings, WorkerConfig};
use ingestion::{BandAligner, ObjectStoreSource};
use scene_catalog::{ReqwestTransport, SceneCatalog};

#[derive(Parser, Debug)]
#[command(name = "bloom-worker")]
#[command(about = "Compute bloom probability tiles for an area of interest")]
struct Args {
    /// Job file: {"aoi_id", "bbox": [minLon, minLat, maxLon, maxLat], "dates": [...]}
    #[arg(long, env = "AOI_FILE")]
    aoi: PathBuf,

    /// Comma-separated dates (YYYY-MM-DD), replaces the dates in the job file
    #[arg(long, value_delimiter = ',')]
    dates: Option<Vec<NaiveDate>>,

    /// First date of a weekly series, used when the job has no dates
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date of a weekly series
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Reprocess dates that already have a date record
    #[arg(long)]
    force: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format: json or text
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    log_format: String,
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder().with_max_level(level);
    if args.log_format.eq_ignore_ascii_case("text") {
        tracing::subscriber::set_global_default(builder.finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    }
    Ok(())
}

fn load_job(args: &Args) -> Result<JobInput> {
    let raw = std::fs::read_to_string(&args.aoi)
        .with_context(|| format!("failed to read job file {}", args.aoi.display()))?;
    let mut input: JobInput = serde_json::from_str(&raw)
        .with_context(|| format!("invalid job file {}", args.aoi.display()))?;

    if let Some(dates) = &args.dates {
        input.dates = dates.clone();
    }
    if args.start.is_some() {
        input.start = args.start;
    }
    if args.end.is_some() {
        input.end = args.end;
    }
    if input.dates.is_empty() {
        match (input.start, input.end) {
            (Some(start), Some(end)) => input.dates = date_series(start, end, 7),
            _ => bail!("job has no dates; pass --dates or --start and --end"),
        }
    }
    input.force |= args.force;

    Ok(input)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args)?;

    let config = WorkerConfig::from_env();
    if let Err(e) = config.validate() {
        bail!("invalid configuration: {}", e);
    }

    let input = load_job(&args)?;
    info!(
        aoi_id = %input.aoi_id,
        dates = input.dates.len(),
        mode = %config.mode,
        stac = %config.stac_endpoint,
        "Starting bloom worker"
    );

    let transport = Arc::new(ReqwestTransport::new(&config.stac_endpoint)?);
    let catalog = SceneCatalog::new(transport, config.retry_policy(), config.catalog_config());
    let aligner = BandAligner::new(Arc::new(ObjectStoreSource::new()), config.reprojection_policy);
    let sink = config.open_storage()?;

    let runner = JobRunner::new(catalog, aligner, sink, JobSettings::from(&config));
    match runner.run(&input).await {
        Ok(report) => {
            info!(%report, "Finished");
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Job failed");
            Err(e.into())
        }
    }
}
