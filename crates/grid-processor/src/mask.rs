//! Quality masking from a scene classification band.

use bloom_common::{BloomResult, Grid, Mask};

/// Sentinel-2 L2A scene classification codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SclClass {
    NoData = 0,
    SaturatedOrDefective = 1,
    DarkArea = 2,
    CloudShadow = 3,
    Vegetation = 4,
    BareSoil = 5,
    Water = 6,
    CloudLowProbability = 7,
    CloudMediumProbability = 8,
    CloudHighProbability = 9,
    ThinCirrus = 10,
    SnowOrIce = 11,
}

impl SclClass {
    /// Surfaces the index is meaningful over.
    pub fn is_valid_surface(code: u8) -> bool {
        code == SclClass::Vegetation as u8 || code == SclClass::BareSoil as u8
    }

    /// Any cloud class, including thin cirrus.
    pub fn is_cloud(code: u8) -> bool {
        (SclClass::CloudLowProbability as u8..=SclClass::ThinCirrus as u8).contains(&code)
    }

    pub fn is_no_data(code: u8) -> bool {
        code == SclClass::NoData as u8
    }
}

/// 1 where the classification code is vegetation or bare soil, else 0.
pub fn build_valid_mask(classification: &Mask) -> Mask {
    classification.map(|code| u8::from(SclClass::is_valid_surface(code)))
}

/// Percentage of cloud pixels among all pixels that carry data.
///
/// A mask with no data pixels at all counts as fully obscured (100).
pub fn cloud_fraction(classification: &Mask) -> f64 {
    let mut cloud = 0usize;
    let mut total = 0usize;

    for &code in classification.data() {
        if SclClass::is_no_data(code) {
            continue;
        }
        total += 1;
        if SclClass::is_cloud(code) {
            cloud += 1;
        }
    }

    if total == 0 {
        return 100.0;
    }
    cloud as f64 / total as f64 * 100.0
}

/// Set every pixel to NaN where `mask` is 0.
pub fn apply_mask(grid: &Grid, mask: &Mask) -> BloomResult<Grid> {
    grid.ensure_same_shape(mask.shape())?;

    let mut out = grid.clone();
    for (value, &keep) in out.data_mut().iter_mut().zip(mask.data()) {
        if keep == 0 {
            *value = f32::NAN;
        }
    }
    Ok(out)
}
