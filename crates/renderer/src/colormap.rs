//! Colormaps for the bloom and anomaly layers.
//!
//! Both maps are two-segment linear ramps; channel values are floored, so
//! the output for a given input is exact and platform independent.

use bloom_common::LayerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

const PINK: [f64; 3] = [255.0, 150.0, 200.0];
const GREEN: [f64; 3] = [50.0, 255.0, 50.0];
const YELLOW: [f64; 3] = [255.0, 255.0, 200.0];

const BLUE: [f64; 3] = [0.0, 100.0, 255.0];
const WHITE: [f64; 3] = [255.0, 255.0, 255.0];
const RED: [f64; 3] = [255.0, 50.0, 0.0];

/// Z-scores beyond this magnitude saturate the anomaly ramp.
pub const Z_RANGE: f64 = 3.0;

/// Floor of the linear blend between two values.
#[inline]
fn lerp(from: f64, to: f64, t: f64) -> u8 {
    (from * (1.0 - t) + to * t).floor().clamp(0.0, 255.0) as u8
}

fn blend(from: [f64; 3], to: [f64; 3], t: f64, alpha: u8) -> Color {
    Color::new(
        lerp(from[0], to[0], t),
        lerp(from[1], to[1], t),
        lerp(from[2], to[2], t),
        alpha,
    )
}

/// Bloom probability in [0, 1]: pink, then green at 0.5, then yellow.
/// Alpha runs from 50 to 220.
pub fn bloom_color(score: f32) -> Color {
    if score.is_nan() {
        return Color::transparent();
    }
    let s = (score as f64).clamp(0.0, 1.0);
    let alpha = (50.0 + s * 170.0).floor() as u8;

    if s < 0.5 {
        blend(PINK, GREEN, s * 2.0, alpha)
    } else {
        blend(GREEN, YELLOW, (s - 0.5) * 2.0, alpha)
    }
}

/// Diverging z-score map: blue below zero, white at zero, red above.
/// Alpha runs from 100 to 220 with `|z| / 3`.
pub fn anomaly_color(z: f32) -> Color {
    if z.is_nan() {
        return Color::transparent();
    }
    let z = (z as f64).clamp(-Z_RANGE, Z_RANGE);
    let normalized = (z + Z_RANGE) / (2.0 * Z_RANGE);
    let alpha = (100.0 + (z.abs() / Z_RANGE).min(1.0) * 120.0).floor() as u8;

    if normalized < 0.5 {
        blend(BLUE, WHITE, normalized * 2.0, alpha)
    } else {
        blend(WHITE, RED, (normalized - 0.5) * 2.0, alpha)
    }
}

/// RGBA for a sampled value of the given layer.
pub fn colormap(kind: LayerKind, value: f32) -> [u8; 4] {
    match kind {
        LayerKind::Bloom => bloom_color(value),
        LayerKind::Anomaly => anomaly_color(value),
    }
    .to_array()
}
