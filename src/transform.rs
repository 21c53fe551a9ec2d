//! Arbitrary-angle rotation and axis mirroring.
//!
//! Rotation resamples with a Catmull-Rom bicubic kernel; nearest-neighbor
//! would alias band edges and corrupt downstream quantification. Flips are
//! exact sample permutations.

use crate::image::GelImage;
use log::debug;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// Rotation parameters.
///
/// Positive `angle_deg` rotates counter-clockwise; any real value is applied
/// literally (370° behaves as 10°). With `expand` the output canvas is the
/// minimal bounding box of the rotated source, otherwise the canvas keeps the
/// input size and rotated content outside is cropped. `fill` supplies the
/// sample values for area not covered by source pixels: one entry per
/// channel, or a single entry broadcast to all channels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateParams {
    pub angle_deg: f32,
    pub expand: bool,
    pub fill: Vec<u16>,
}

impl Default for RotateParams {
    fn default() -> Self {
        Self {
            angle_deg: 0.0,
            expand: true,
            fill: vec![0],
        }
    }
}

/// Reasons a rotation request is rejected.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformError {
    NonFiniteAngle { angle_deg: f32 },
    /// `fill` must hold one value, or one value per channel.
    BadFillLength { channels: usize, found: usize },
    /// A fill value exceeds the image bit depth.
    FillOutOfDepth { value: u16, max: u16 },
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformError::NonFiniteAngle { angle_deg } => {
                write!(f, "rotation angle must be finite, got {angle_deg}")
            }
            TransformError::BadFillLength { channels, found } => write!(
                f,
                "fill must hold 1 or {channels} values, got {found}"
            ),
            TransformError::FillOutOfDepth { value, max } => {
                write!(f, "fill value {value} exceeds sample depth (max {max})")
            }
        }
    }
}

impl std::error::Error for TransformError {}

/// Mirror axis for [`flip`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipAxis {
    /// Left-right mirror (each row reversed).
    Horizontal,
    /// Top-bottom mirror (row order reversed).
    Vertical,
}

/// Mirror `image` across the given axis.
///
/// An exact sample permutation: no resampling, channel count and depth
/// preserved, an involution.
pub fn flip(image: &GelImage, axis: FlipAxis) -> GelImage {
    let (w, h, channels) = (image.width(), image.height(), image.channels());
    let mut data = vec![0u16; w * h * channels];
    for y in 0..h {
        for x in 0..w {
            let (sx, sy) = match axis {
                FlipAxis::Horizontal => (w - 1 - x, y),
                FlipAxis::Vertical => (x, h - 1 - y),
            };
            let out = &mut data[(y * w + x) * channels..(y * w + x + 1) * channels];
            for (c, px) in out.iter_mut().enumerate() {
                *px = image.sample(sx, sy, c);
            }
        }
    }
    GelImage::from_validated(w, h, channels, image.depth(), data)
}

/// Normalize an angle to `(−360, 360]` degrees for reporting. The literal
/// value is what gets applied; this is display-only.
pub fn normalize_angle_deg(angle_deg: f32) -> f32 {
    angle_deg % 360.0
}

/// Rotate `image` by `params.angle_deg` degrees counter-clockwise.
///
/// Channel count and depth are preserved. Output samples are clamped to the
/// image's representable range.
pub fn rotate(image: &GelImage, params: &RotateParams) -> Result<GelImage, TransformError> {
    if !params.angle_deg.is_finite() {
        return Err(TransformError::NonFiniteAngle {
            angle_deg: params.angle_deg,
        });
    }
    let channels = image.channels();
    if params.fill.len() != 1 && params.fill.len() != channels {
        return Err(TransformError::BadFillLength {
            channels,
            found: params.fill.len(),
        });
    }
    if let Some(&value) = params.fill.iter().find(|&&v| v > image.max_value()) {
        return Err(TransformError::FillOutOfDepth {
            value,
            max: image.max_value(),
        });
    }
    let fill: Vec<u16> = (0..channels)
        .map(|c| params.fill[c % params.fill.len()])
        .collect();

    let theta = params.angle_deg.to_radians();
    let (sin, cos) = theta.sin_cos();
    // Image coordinates have y growing downward; this matrix makes positive
    // angles counter-clockwise on screen.
    let forward = Matrix2::new(cos, sin, -sin, cos);
    let inverse = forward.transpose();

    let (src_w, src_h) = (image.width() as f32, image.height() as f32);
    let (out_w, out_h) = if params.expand {
        // The epsilon keeps axis-aligned angles from spilling one pixel when
        // sin/cos land a hair above an integer in f32.
        let w = (src_w * cos.abs() + src_h * sin.abs() - 1e-4).ceil().max(1.0) as usize;
        let h = (src_w * sin.abs() + src_h * cos.abs() - 1e-4).ceil().max(1.0) as usize;
        (w, h)
    } else {
        (image.width(), image.height())
    };
    debug!(
        "rotate: angle={:.3}° (normalized {:.3}°) expand={} canvas {}x{} -> {}x{}",
        params.angle_deg,
        normalize_angle_deg(params.angle_deg),
        params.expand,
        image.width(),
        image.height(),
        out_w,
        out_h
    );

    let src_center = Vector2::new((src_w - 1.0) * 0.5, (src_h - 1.0) * 0.5);
    let out_center = Vector2::new((out_w as f32 - 1.0) * 0.5, (out_h as f32 - 1.0) * 0.5);
    let max_out = image.max_value() as f32;

    let mut data = vec![0u16; out_w * out_h * channels];
    for y in 0..out_h {
        for x in 0..out_w {
            let dst = Vector2::new(x as f32, y as f32) - out_center;
            let src = inverse * dst + src_center;
            let out = &mut data[(y * out_w + x) * channels..(y * out_w + x + 1) * channels];
            if src.x < -0.5 || src.x > src_w - 0.5 || src.y < -0.5 || src.y > src_h - 0.5 {
                out.copy_from_slice(&fill);
            } else {
                for (c, px) in out.iter_mut().enumerate() {
                    let v = sample_bicubic(image, src.x, src.y, c);
                    *px = v.round().clamp(0.0, max_out) as u16;
                }
            }
        }
    }
    Ok(GelImage::from_validated(
        out_w,
        out_h,
        channels,
        image.depth(),
        data,
    ))
}

/// Catmull-Rom weight for a sample at distance `t ∈ [0, 2)` from the target.
#[inline]
fn catmull_rom(t: f32) -> f32 {
    let t = t.abs();
    if t < 1.0 {
        1.5 * t * t * t - 2.5 * t * t + 1.0
    } else if t < 2.0 {
        -0.5 * t * t * t + 2.5 * t * t - 4.0 * t + 2.0
    } else {
        0.0
    }
}

/// Bicubic sample of channel `c` at fractional coordinates, clamping the
/// 4×4 neighborhood at the image border.
fn sample_bicubic(image: &GelImage, x: f32, y: f32, c: usize) -> f32 {
    let x0 = x.floor() as isize;
    let y0 = y.floor() as isize;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let wmax = image.width() as isize - 1;
    let hmax = image.height() as isize - 1;

    let mut acc = 0.0f32;
    let mut wsum = 0.0f32;
    for j in -1isize..=2 {
        let wy = catmull_rom(fy - j as f32);
        if wy == 0.0 {
            continue;
        }
        let sy = (y0 + j).clamp(0, hmax) as usize;
        for i in -1isize..=2 {
            let wx = catmull_rom(fx - i as f32);
            if wx == 0.0 {
                continue;
            }
            let sx = (x0 + i).clamp(0, wmax) as usize;
            let w = wx * wy;
            acc += w * image.sample(sx, sy, c) as f32;
            wsum += w;
        }
    }
    if wsum != 0.0 {
        acc / wsum
    } else {
        0.0
    }
}
