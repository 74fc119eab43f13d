//! Band co-registration onto the finest band's pixel grid.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{info, instrument, warn};

use bloom_common::{
    BandRole, BandSet, BloomError, BloomResult, BoundingBox, Epsg, Grid, Mask, Scene,
    NODATA_MARKER,
};
use grid_processor::{resample_grid_bilinear, resample_mask_nearest};
use projection::CrsTransformer;

use crate::config::ReprojectionPolicy;
use crate::source::{RasterBand, RasterSource};
use crate::window::PixelWindow;

/// Reads the three required bands of a scene and aligns them.
pub struct BandAligner {
    source: Arc<dyn RasterSource>,
    policy: ReprojectionPolicy,
    /// CRS of the query bbox.
    query_crs: Epsg,
}

/// One band opened and windowed, ready to read.
struct PlannedBand {
    role: BandRole,
    band: Box<dyn RasterBand>,
    window: PixelWindow,
}

impl BandAligner {
    pub fn new(source: Arc<dyn RasterSource>, policy: ReprojectionPolicy) -> Self {
        Self {
            source,
            policy,
            query_crs: Epsg::WGS84,
        }
    }

    pub fn policy(&self) -> ReprojectionPolicy {
        self.policy
    }

    /// Align the primary, secondary and classification bands of `scene`
    /// over `bbox` (WGS84 degrees).
    ///
    /// The band with the finest native resolution defines the output grid;
    /// the others are resampled onto its width and height, bilinear for
    /// measurements and nearest for classification codes.
    #[instrument(skip(self, scene), fields(scene_id = %scene.id))]
    pub async fn align(&self, scene: &Scene, bbox: &BoundingBox) -> BloomResult<BandSet> {
        let missing = scene.missing_roles();
        if !missing.is_empty() {
            return Err(BloomError::MissingBand {
                scene_id: scene.id.clone(),
                missing: missing
                    .iter()
                    .map(|r| r.canonical_name().to_string())
                    .collect(),
            });
        }

        let planned = try_join_all(BandRole::ALL.into_iter().map(|role| async move {
            // Presence checked above.
            let href = scene
                .asset(role)
                .map(|a| a.href.as_str())
                .unwrap_or_default();
            let band = self.source.open(href).await?;
            let window = self.window_for(role, band.as_ref(), bbox)?;
            Ok::<_, BloomError>(PlannedBand { role, band, window })
        }))
        .await?;

        let canonical = finest(&planned);
        let target = canonical.window.geometry(canonical.band.info());

        let samples = try_join_all(planned.iter().map(|p| p.band.read_window(p.window))).await?;

        let mut primary = None;
        let mut secondary = None;
        let mut classification = None;

        for (plan, data) in planned.iter().zip(samples) {
            let native = plan.window.geometry(plan.band.info());
            match plan.role {
                BandRole::Classification => {
                    let codes: Vec<u8> = data.iter().map(|&v| to_class_code(v)).collect();
                    let mask = Mask::new(native, codes)?;
                    classification = Some(resample_mask_nearest(&mask, &target)?);
                }
                role => {
                    let grid = Grid::new(native, data)?.with_nodata(NODATA_MARKER);
                    let grid = resample_grid_bilinear(&grid, &target)?;
                    if role == BandRole::Primary {
                        primary = Some(grid);
                    } else {
                        secondary = Some(grid);
                    }
                }
            }
        }

        let (primary, secondary, classification) = match (primary, secondary, classification) {
            (Some(p), Some(s), Some(c)) => (p, s, c),
            _ => {
                return Err(BloomError::MissingBand {
                    scene_id: scene.id.clone(),
                    missing: vec![],
                })
            }
        };

        info!(
            width = target.width,
            height = target.height,
            crs = %target.crs,
            canonical = %canonical.role,
            "Aligned bands"
        );

        Ok(BandSet {
            primary,
            secondary,
            classification,
        })
    }

    /// Pixel window of `bbox` in `band`'s native CRS.
    fn window_for(
        &self,
        role: BandRole,
        band: &dyn RasterBand,
        bbox: &BoundingBox,
    ) -> BloomResult<PixelWindow> {
        let info = band.info();
        let native = CrsTransformer::new(self.query_crs, info.epsg)
            .and_then(|t| t.transform_bbox(bbox));

        let native = match (native, self.policy) {
            (Ok(native), _) => native,
            (Err(e), ReprojectionPolicy::Fallback) => {
                warn!(
                    band = %role,
                    href = band.href(),
                    error = %e,
                    "Bbox reprojection failed, using untransformed bbox"
                );
                *bbox
            }
            (Err(e), ReprojectionPolicy::Fail) => {
                return Err(BloomError::Reprojection(format!(
                    "band {} ({}): {}",
                    role,
                    band.href(),
                    e
                )))
            }
        };

        Ok(PixelWindow::from_bbox(info, &native))
    }
}

/// The band with the smallest pixel size; ties go to the earlier role.
fn finest(planned: &[PlannedBand]) -> &PlannedBand {
    let mut best = &planned[0];
    for plan in &planned[1..] {
        if plan.band.info().res_x < best.band.info().res_x {
            best = plan;
        }
    }
    best
}

/// Classification samples are small non-negative integers; anything else is no-data.
fn to_class_code(value: f32) -> u8 {
    if value.is_finite() && value >= 0.0 && value <= u8::MAX as f32 {
        value.round() as u8
    } else {
        0
    }
}
