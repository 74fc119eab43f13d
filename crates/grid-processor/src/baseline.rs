//! Rolling per-pixel baseline over recent index grids.

use bloom_common::{Baseline, BloomError, BloomResult, Grid};

/// Mean and population standard deviation of the last `max_window` grids.
///
/// Per pixel, only non-NaN samples count. The mean is NaN when a pixel has
/// no valid sample; the standard deviation is exactly 1.0 when it has fewer
/// than two.
pub fn rolling_baseline(grids: &[&Grid], max_window: usize) -> BloomResult<Baseline> {
    let start = grids.len().saturating_sub(max_window.max(1));
    let window = &grids[start..];

    let first = window
        .first()
        .ok_or_else(|| BloomError::InvalidInput("baseline needs at least one grid".into()))?;
    for grid in &window[1..] {
        first.ensure_same_shape(grid.shape())?;
    }

    let len = first.data().len();
    let mut mean = Vec::with_capacity(len);
    let mut std = Vec::with_capacity(len);

    for i in 0..len {
        let mut count = 0usize;
        let mut sum = 0.0f64;
        for grid in window {
            let v = grid.data()[i];
            if !v.is_nan() {
                count += 1;
                sum += v as f64;
            }
        }

        if count == 0 {
            mean.push(f32::NAN);
            std.push(1.0);
            continue;
        }

        let m = sum / count as f64;
        mean.push(m as f32);

        if count < 2 {
            std.push(1.0);
            continue;
        }

        let var = window
            .iter()
            .map(|g| g.data()[i])
            .filter(|v| !v.is_nan())
            .map(|v| (v as f64 - m).powi(2))
            .sum::<f64>()
            / count as f64;
        std.push(var.sqrt() as f32);
    }

    Ok(Baseline {
        mean: Grid::new(*first.geometry(), mean)?,
        std: Grid::new(*first.geometry(), std)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_common::{Epsg, GridGeometry};

    fn grid(values: Vec<f32>) -> Grid {
        let n = values.len();
        Grid::new(GridGeometry::new(n, 1, 0.0, 0.0, 10.0, Epsg::WGS84), values).unwrap()
    }

    #[test]
    fn test_single_grid_std_is_one() {
        let g = grid(vec![0.5, f32::NAN]);
        let b = rolling_baseline(&[&g], 5).unwrap();
        assert_eq!(b.mean.data()[0], 0.5);
        assert_eq!(b.std.data()[0], 1.0);
        assert!(b.mean.data()[1].is_nan());
        assert_eq!(b.std.data()[1], 1.0);
    }

    #[test]
    fn test_population_std() {
        let a = grid(vec![2.0, 1.0]);
        let b = grid(vec![4.0, f32::NAN]);
        let c = grid(vec![6.0, 3.0]);
        let base = rolling_baseline(&[&a, &b, &c], 5).unwrap();
        assert_eq!(base.mean.data()[0], 4.0);
        assert!((base.std.data()[0] - (8.0f32 / 3.0).sqrt()).abs() < 1e-6);
        // Two valid samples at pixel 1: mean 2, std 1.
        assert_eq!(base.mean.data()[1], 2.0);
        assert_eq!(base.std.data()[1], 1.0);
    }

    #[test]
    fn test_window_uses_most_recent() {
        let grids: Vec<Grid> = (0..7).map(|i| grid(vec![i as f32])).collect();
        let refs: Vec<&Grid> = grids.iter().collect();
        let base = rolling_baseline(&refs, 5).unwrap();
        // Last five: 2, 3, 4, 5, 6
        assert_eq!(base.mean.data()[0], 4.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = grid(vec![1.0, 2.0]);
        let b = grid(vec![1.0]);
        assert!(matches!(
            rolling_baseline(&[&a, &b], 5),
            Err(BloomError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_is_error() {
        assert!(rolling_baseline(&[], 5).is_err());
    }
}
