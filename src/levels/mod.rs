//! Intensity windowing, contrast and brightness remapping.
//!
//! Adjustments compose analytically into a single [`Lut`] so the image is
//! touched exactly once regardless of how many knobs moved. Composition order
//! is fixed: window → contrast → brightness.

pub mod histogram;

pub use histogram::{auto_levels, Histogram};

use crate::image::{GelImage, SampleDepth};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Window/contrast/brightness parameters composed into one [`Lut`].
///
/// - `min_val..=max_val` is the intensity window mapped onto the full output
///   range; `min_val == max_val` collapses to a step function.
/// - `contrast` stretches around the output midpoint (1.0 = identity,
///   0.0 = flat gray).
/// - `brightness` is a multiplicative gain applied last (1.0 = identity).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    pub min_val: u16,
    pub max_val: u16,
    pub brightness: f32,
    pub contrast: f32,
}

impl LevelParams {
    /// Identity mapping for the given depth.
    pub fn identity(depth: SampleDepth) -> Self {
        Self {
            min_val: 0,
            max_val: depth.max_value(),
            brightness: 1.0,
            contrast: 1.0,
        }
    }
}

/// Reasons LUT construction or application may fail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LevelsError {
    /// Window bounds out of order or outside the sample range, or a negative
    /// or non-finite adjustment factor.
    InvalidRange {
        min_val: u16,
        max_val: u16,
        max_sample: u16,
        brightness: f32,
        contrast: f32,
    },
    /// LUT built for a different bit depth than the image.
    DepthMismatch {
        lut: SampleDepth,
        image: SampleDepth,
    },
}

impl std::fmt::Display for LevelsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelsError::InvalidRange {
                min_val,
                max_val,
                max_sample,
                brightness,
                contrast,
            } => write!(
                f,
                "invalid level parameters (window [{min_val}, {max_val}] of max {max_sample}, \
                 brightness {brightness}, contrast {contrast})"
            ),
            LevelsError::DepthMismatch { lut, image } => {
                write!(f, "LUT depth {lut:?} does not match image depth {image:?}")
            }
        }
    }
}

impl std::error::Error for LevelsError {}

/// Lookup table mapping every representable input sample to an output sample.
///
/// Domain and range are clamped to `[0, 2^bitdepth − 1]`; the mapping need not
/// be monotonic (contrast and brightness may invert or fold the range).
#[derive(Clone, Debug, PartialEq)]
pub struct Lut {
    depth: SampleDepth,
    table: Vec<u16>,
}

impl Lut {
    /// Build the composed window → contrast → brightness table.
    pub fn build(depth: SampleDepth, params: &LevelParams) -> Result<Self, LevelsError> {
        let max_sample = depth.max_value();
        let ok = params.min_val <= params.max_val
            && params.max_val <= max_sample
            && params.brightness.is_finite()
            && params.brightness >= 0.0
            && params.contrast.is_finite()
            && params.contrast >= 0.0;
        if !ok {
            return Err(LevelsError::InvalidRange {
                min_val: params.min_val,
                max_val: params.max_val,
                max_sample,
                brightness: params.brightness,
                contrast: params.contrast,
            });
        }

        let max_out = max_sample as f32;
        let span = (params.max_val - params.min_val) as f32;
        let table = (0..depth.bin_count())
            .map(|v| {
                // Window: normalized position inside [min_val, max_val]. A
                // zero-width window degenerates to a step at min_val.
                let t = if span > 0.0 {
                    ((v as f32 - params.min_val as f32) / span).clamp(0.0, 1.0)
                } else if v as u16 >= params.min_val {
                    1.0
                } else {
                    0.0
                };
                // Contrast stretches around the midpoint, then brightness
                // scales the result.
                let t = (t - 0.5) * params.contrast + 0.5;
                let t = t * params.brightness;
                (t * max_out).round().clamp(0.0, max_out) as u16
            })
            .collect();
        Ok(Self { depth, table })
    }

    /// Photographic-negative table: `v → max − v`.
    ///
    /// Its own involution, so applying it twice restores the original image.
    pub fn inverting(depth: SampleDepth) -> Self {
        let max = depth.max_value();
        let table = (0..depth.bin_count()).map(|v| max - v as u16).collect();
        Self { depth, table }
    }

    /// Depth this table was built for.
    #[inline]
    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    /// Map one sample value.
    #[inline]
    pub fn map(&self, v: u16) -> u16 {
        self.table[v as usize]
    }

    /// The full output table, one entry per representable input value.
    #[inline]
    pub fn table(&self) -> &[u16] {
        &self.table
    }
}

/// Apply a LUT to every sample of `image`, producing a new image.
///
/// Pure and deterministic: the same LUT on the same image yields bit-exact
/// identical output. Channel count and depth are preserved.
pub fn apply_lut(image: &GelImage, lut: &Lut) -> Result<GelImage, LevelsError> {
    if lut.depth() != image.depth() {
        return Err(LevelsError::DepthMismatch {
            lut: lut.depth(),
            image: image.depth(),
        });
    }
    let row_len = image.width() * image.channels();
    let data: Vec<u16> = image
        .data()
        .par_chunks(row_len)
        .flat_map_iter(|row| row.iter().map(|&v| lut.map(v)))
        .collect();
    Ok(GelImage::from_validated(
        image.width(),
        image.height(),
        image.channels(),
        image.depth(),
        data,
    ))
}
