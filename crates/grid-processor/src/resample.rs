//! Interpolation and resampling between pixel grids.

use bloom_common::{BloomResult, Grid, GridGeometry, Mask};

/// Bilinear interpolation at fractional pixel position `(x, y)`.
///
/// Only the valid interior is sampled: positions with `x >= width - 1` or
/// `y >= height - 1` (or negative) return NaN, as does any position whose
/// four bracketing samples include a NaN.
pub fn bilinear_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if !(x >= 0.0 && y >= 0.0 && x < width as f64 - 1.0 && y < height as f64 - 1.0) {
        return f32::NAN;
    }

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let xf = (x - x0 as f64) as f32;
    let yf = (y - y0 as f64) as f32;

    let v00 = data[y0 * width + x0];
    let v10 = data[y0 * width + x1];
    let v01 = data[y1 * width + x0];
    let v11 = data[y1 * width + x1];

    if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
        return f32::NAN;
    }

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}

/// Resample a raster to `out_width x out_height` with bilinear weights.
///
/// Output pixel `(x, y)` reads source position `(x * in_w / out_w,
/// y * in_h / out_h)`; the right/bottom neighbours are clamped to the last
/// row/column. NaN in any contributing sample yields NaN.
pub fn resample_bilinear(
    input: &[f32],
    in_width: usize,
    in_height: usize,
    out_width: usize,
    out_height: usize,
) -> Vec<f32> {
    let mut output = vec![f32::NAN; out_width * out_height];
    if in_width == 0 || in_height == 0 {
        return output;
    }

    let x_ratio = in_width as f64 / out_width as f64;
    let y_ratio = in_height as f64 / out_height as f64;

    for y in 0..out_height {
        let src_y = y as f64 * y_ratio;
        let y0 = (src_y.floor() as usize).min(in_height - 1);
        let y1 = (y0 + 1).min(in_height - 1);
        let fy = (src_y - y0 as f64) as f32;

        for x in 0..out_width {
            let src_x = x as f64 * x_ratio;
            let x0 = (src_x.floor() as usize).min(in_width - 1);
            let x1 = (x0 + 1).min(in_width - 1);
            let fx = (src_x - x0 as f64) as f32;

            let v00 = input[y0 * in_width + x0];
            let v10 = input[y0 * in_width + x1];
            let v01 = input[y1 * in_width + x0];
            let v11 = input[y1 * in_width + x1];

            output[y * out_width + x] = if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan()
            {
                f32::NAN
            } else {
                let top = v00 * (1.0 - fx) + v10 * fx;
                let bottom = v01 * (1.0 - fx) + v11 * fx;
                top * (1.0 - fy) + bottom * fy
            };
        }
    }

    output
}

/// Resample by copying the source value at `floor(x * ratio)`.
///
/// Used for categorical rasters where averaging codes is meaningless.
pub fn resample_nearest<T: Copy + Default>(
    input: &[T],
    in_width: usize,
    in_height: usize,
    out_width: usize,
    out_height: usize,
) -> Vec<T> {
    let mut output = vec![T::default(); out_width * out_height];
    if in_width == 0 || in_height == 0 {
        return output;
    }

    let x_ratio = in_width as f64 / out_width as f64;
    let y_ratio = in_height as f64 / out_height as f64;

    for y in 0..out_height {
        let src_y = ((y as f64 * y_ratio).floor() as usize).min(in_height - 1);
        for x in 0..out_width {
            let src_x = ((x as f64 * x_ratio).floor() as usize).min(in_width - 1);
            output[y * out_width + x] = input[src_y * in_width + src_x];
        }
    }

    output
}

/// Resample a continuous grid onto `target`'s width/height and adopt its
/// geometry.
pub fn resample_grid_bilinear(grid: &Grid, target: &GridGeometry) -> BloomResult<Grid> {
    let data = if grid.shape() == target.shape() {
        grid.data().to_vec()
    } else {
        resample_bilinear(
            grid.data(),
            grid.width(),
            grid.height(),
            target.width,
            target.height,
        )
    };
    let mut out = Grid::new(*target, data)?;
    out.nodata = grid.nodata;
    Ok(out)
}

/// Resample a classification mask onto `target` with nearest neighbour.
pub fn resample_mask_nearest(mask: &Mask, target: &GridGeometry) -> BloomResult<Mask> {
    let data = resample_nearest(
        mask.data(),
        mask.width(),
        mask.height(),
        target.width,
        target.height,
    );
    Mask::new(*target, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_common::Epsg;

    #[test]
    fn test_bilinear_interpolate() {
        let data: Vec<f32> = vec![
            1.0, 2.0, 0.0,
            3.0, 4.0, 0.0,
            0.0, 0.0, 0.0,
        ];

        assert_eq!(bilinear_interpolate(&data, 3, 3, 0.0, 0.0), 1.0);
        let center = bilinear_interpolate(&data, 3, 3, 0.5, 0.5);
        assert!((center - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_bilinear_interior_only() {
        let data = vec![1.0f32; 9];
        assert!(bilinear_interpolate(&data, 3, 3, 2.0, 0.5).is_nan());
        assert!(bilinear_interpolate(&data, 3, 3, 0.5, 2.0).is_nan());
        assert!(bilinear_interpolate(&data, 3, 3, -0.1, 0.5).is_nan());
        assert_eq!(bilinear_interpolate(&data, 3, 3, 1.99, 1.99), 1.0);
        // A single pixel has no interior.
        assert!(bilinear_interpolate(&[5.0], 1, 1, 0.0, 0.0).is_nan());
    }

    #[test]
    fn test_bilinear_with_nan() {
        let data: Vec<f32> = vec![
            1.0, f32::NAN, 0.0,
            3.0, 4.0, 0.0,
            0.0, 0.0, 0.0,
        ];
        assert!(bilinear_interpolate(&data, 3, 3, 0.5, 0.5).is_nan());
        // Bracketing samples of (0.5, 1.5) are all finite.
        assert!(!bilinear_interpolate(&data, 3, 3, 0.5, 1.5).is_nan());
    }

    #[test]
    fn test_resample_bilinear_upsample() {
        let data: Vec<f32> = vec![
            0.0, 2.0,
            4.0, 6.0,
        ];
        let out = resample_bilinear(&data, 2, 2, 4, 4);
        assert_eq!(out.len(), 16);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 1.0);
        assert_eq!(out[2], 2.0);
        // Right neighbour clamped at the last column.
        assert_eq!(out[3], 2.0);
        assert_eq!(out[4], 2.0);
        assert_eq!(out[15], 6.0);
    }

    #[test]
    fn test_resample_bilinear_identity() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        assert_eq!(resample_bilinear(&data, 4, 3, 4, 3), data);
    }

    #[test]
    fn test_resample_nearest_copies_codes() {
        let data: Vec<u8> = vec![
            4, 9,
            5, 0,
        ];
        let out = resample_nearest(&data, 2, 2, 4, 4);
        assert_eq!(
            out,
            vec![
                4, 4, 9, 9,
                4, 4, 9, 9,
                5, 5, 0, 0,
                5, 5, 0, 0,
            ]
        );
    }

    #[test]
    fn test_resample_grid_adopts_geometry() {
        let src_geom = GridGeometry::new(2, 2, 0.0, 40.0, 20.0, Epsg(32610));
        let dst_geom = GridGeometry::new(4, 4, 0.0, 40.0, 10.0, Epsg(32610));
        let grid = Grid::new(src_geom, vec![1.0; 4]).unwrap();
        let out = resample_grid_bilinear(&grid, &dst_geom).unwrap();
        assert_eq!(*out.geometry(), dst_geom);
        assert!(out.data().iter().all(|&v| v == 1.0));
    }
}
