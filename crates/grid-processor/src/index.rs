//! Spectral index, change and anomaly scoring.

use bloom_common::{Baseline, BloomResult, Grid};
use tracing::warn;

use crate::config::IndexConfig;

/// Reciprocal-difference index `1/max(a, eps) - 1/max(b, eps)`.
///
/// With `a` the green band and `b` the red-edge band this is the
/// anthocyanin reflectance index. NaN in either band yields NaN.
pub fn compute_index(band_a: &Grid, band_b: &Grid, epsilon: f32) -> BloomResult<Grid> {
    band_a.zip_map(band_b, |a, b| {
        if a.is_nan() || b.is_nan() {
            f32::NAN
        } else {
            1.0 / a.max(epsilon) - 1.0 / b.max(epsilon)
        }
    })
}

/// Change against the previous index grid.
///
/// Without a previous grid, or when its shape differs from `current`, the
/// result is all zeros. The shape case is logged and not an error.
pub fn delta(current: &Grid, previous: Option<&Grid>) -> Grid {
    let previous = match previous {
        Some(p) => p,
        None => return current.zeros_like(),
    };

    match current.zip_map(previous, |c, p| c - p) {
        Ok(grid) => grid,
        Err(e) => {
            warn!(error = %e, "Previous index grid has a different shape, using zero delta");
            current.zeros_like()
        }
    }
}

/// Standard score `(x - mean) / max(std, eps)` against a baseline.
pub fn z_score(current: &Grid, baseline: &Baseline, epsilon: f32) -> BloomResult<Grid> {
    current.ensure_same_shape(baseline.mean.shape())?;
    current.ensure_same_shape(baseline.std.shape())?;

    let scored = current
        .data()
        .iter()
        .zip(baseline.mean.data())
        .zip(baseline.std.data())
        .map(|((&x, &mean), &std)| {
            if x.is_nan() || mean.is_nan() || std.is_nan() {
                f32::NAN
            } else {
                (x - mean) / std.max(epsilon)
            }
        })
        .collect();

    Grid::new(*current.geometry(), scored)
}

/// Fused bloom probability with the default weights.
pub fn bloom_score(z: &Grid, delta: &Grid) -> BloomResult<Grid> {
    bloom_score_with(z, delta, &IndexConfig::default())
}

/// `clamp01((wa * tanh(z) + wc * tanh(gain * delta) + 1) / 2)`.
///
/// Non-decreasing in both `z` and `delta` for non-negative weights.
pub fn bloom_score_with(z: &Grid, delta: &Grid, config: &IndexConfig) -> BloomResult<Grid> {
    z.zip_map(delta, |z, d| {
        if z.is_nan() || d.is_nan() {
            return f32::NAN;
        }
        let blended =
            config.anomaly_weight * z.tanh() + config.change_weight * (config.change_gain * d).tanh();
        ((blended + 1.0) / 2.0).clamp(0.0, 1.0)
    })
}
