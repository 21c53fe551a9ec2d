//! Lane boundary detection from projection profiles.
//!
//! The image is collapsed along the migration axis into a 1D projection
//! profile; smoothed local maxima mark lane centers and valleys (or
//! midpoints) between adjacent centers mark boundaries. Detection is
//! best-effort: ambiguities surface as [`DetectionWarning`]s next to a
//! confidence score, and the returned [`Lane`]s stay mutable for manual
//! correction by the caller.

use crate::image::GelImage;
use crate::profile;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Direction species migrate through the gel.
///
/// `Vertical` means samples run top to bottom and lanes are column intervals;
/// `Horizontal` transposes the roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationAxis {
    Vertical,
    Horizontal,
}

/// Knobs for projection-profile lane detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneParams {
    /// Migration direction of the gel.
    pub axis: MigrationAxis,
    /// Set when bands are darker than the background (typical stained gels);
    /// the projection profile is inverted before peak search.
    pub invert: bool,
    /// Box-smoothing radius for the projection profile. The default
    /// suppresses single-pixel noise spikes.
    pub smooth_radius: usize,
    /// Minimum distance between lane centers, in pixels.
    pub min_gap: usize,
    /// Minimum peak height above the profile minimum, as a fraction of the
    /// profile range.
    pub peak_frac: f32,
    /// A valley between two centers becomes the boundary when it dips below
    /// the weaker adjacent peak by at least this fraction of its prominence;
    /// otherwise the midpoint is used.
    pub valley_frac: f32,
    /// Profiles with a normalized range below this are considered flat
    /// (no image content).
    pub flat_eps: f32,
    /// Expected lane count; a mismatch is reported as a warning, never as a
    /// failure.
    pub count_hint: Option<usize>,
}

impl Default for LaneParams {
    fn default() -> Self {
        Self {
            axis: MigrationAxis::Vertical,
            invert: false,
            smooth_radius: 2,
            min_gap: 8,
            peak_frac: 0.2,
            valley_frac: 0.3,
            flat_eps: 1e-3,
            count_hint: None,
        }
    }
}

/// One lane: a half-open interval `[lo, hi)` of columns (rows for horizontal
/// migration) perpendicular to the migration axis.
///
/// Boundaries are mutable after detection; bands derived from a lane must be
/// recomputed whenever its bounds change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub index: usize,
    pub lo: usize,
    pub hi: usize,
    pub center: usize,
    pub axis: MigrationAxis,
}

impl Lane {
    /// Lane width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.hi - self.lo
    }

    /// Move the lane boundaries, keeping the center inside the interval.
    pub fn set_bounds(&mut self, lo: usize, hi: usize) {
        debug_assert!(lo < hi);
        self.lo = lo;
        self.hi = hi;
        self.center = self.center.clamp(lo, hi.saturating_sub(1));
    }
}

/// Non-fatal detection ambiguities reported alongside best-effort results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DetectionWarning {
    /// Detection found a different number of lanes than the caller expected.
    LaneCountMismatch { expected: usize, found: usize },
}

/// Best-effort lane detection result.
#[derive(Clone, Debug, Serialize)]
pub struct LaneDetection {
    pub lanes: Vec<Lane>,
    /// Smoothed projection profile the boundaries were derived from, for
    /// rendering and manual correction.
    pub projection: Vec<f32>,
    /// Rough quality indicator in `[0, 1]`: mean peak prominence, discounted
    /// when the lane count misses the hint.
    pub confidence: f32,
    pub warnings: Vec<DetectionWarning>,
}

/// Recoverable detection failures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LaneDetectError {
    /// The projection profile is flat: pure background or an empty exposure.
    NoLanesFound { profile_range: f32 },
}

impl std::fmt::Display for LaneDetectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneDetectError::NoLanesFound { profile_range } => write!(
                f,
                "no lanes found (projection profile range {profile_range:.5})"
            ),
        }
    }
}

impl std::error::Error for LaneDetectError {}

/// Detect lanes in `image` according to `params`.
pub fn detect_lanes(
    image: &GelImage,
    params: &LaneParams,
) -> Result<LaneDetection, LaneDetectError> {
    let raw = projection_profile(image, params.axis, params.invert);
    let proj = profile::box_smooth(&raw, params.smooth_radius);

    let min_v = proj.iter().cloned().fold(f32::INFINITY, f32::min);
    let max_v = proj.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let range = max_v - min_v;
    if !range.is_finite() || range < params.flat_eps {
        return Err(LaneDetectError::NoLanesFound {
            profile_range: range.max(0.0),
        });
    }

    let height_floor = min_v + params.peak_frac * range;
    let mut centers: Vec<usize> = profile::local_maxima(&proj, params.min_gap)
        .into_iter()
        .filter(|&i| proj[i] >= height_floor)
        .map(|i| profile::plateau_center(&proj, i))
        .collect();
    centers.dedup();
    if centers.is_empty() {
        return Err(LaneDetectError::NoLanesFound {
            profile_range: range,
        });
    }

    let bounds = lane_bounds(&proj, &centers, min_v, params.valley_frac);
    let lanes: Vec<Lane> = centers
        .iter()
        .enumerate()
        .map(|(index, &center)| Lane {
            index,
            lo: bounds[index],
            hi: bounds[index + 1],
            center,
            axis: params.axis,
        })
        .collect();

    let mut confidence = profile::mean(
        &centers
            .iter()
            .map(|&c| ((proj[c] - min_v) / range).clamp(0.0, 1.0))
            .collect::<Vec<_>>(),
    );
    let mut warnings = Vec::new();
    if let Some(expected) = params.count_hint {
        if expected != lanes.len() {
            warn!(
                "lane count mismatch: expected {expected}, found {}",
                lanes.len()
            );
            warnings.push(DetectionWarning::LaneCountMismatch {
                expected,
                found: lanes.len(),
            });
            let (small, large) = if expected < lanes.len() {
                (expected, lanes.len())
            } else {
                (lanes.len(), expected)
            };
            confidence *= small as f32 / large.max(1) as f32;
        }
    }
    debug!(
        "detect_lanes: {} lanes, confidence {:.3}, profile range {:.4}",
        lanes.len(),
        confidence,
        range
    );
    Ok(LaneDetection {
        lanes,
        projection: proj,
        confidence,
        warnings,
    })
}

/// Collapse the image along the migration axis into a mean-intensity profile
/// over the perpendicular axis.
fn projection_profile(image: &GelImage, axis: MigrationAxis, invert: bool) -> Vec<f32> {
    let plane = image.luma_plane();
    let mut proj = match axis {
        MigrationAxis::Vertical => {
            let mut acc = vec![0.0f32; plane.w];
            for y in 0..plane.h {
                for (x, v) in plane.row(y).iter().enumerate() {
                    acc[x] += v;
                }
            }
            let norm = 1.0 / plane.h as f32;
            acc.iter_mut().for_each(|v| *v *= norm);
            acc
        }
        MigrationAxis::Horizontal => (0..plane.h)
            .map(|y| profile::mean(plane.row(y)))
            .collect(),
    };
    if invert {
        proj.iter_mut().for_each(|v| *v = 1.0 - *v);
    }
    proj
}

/// Boundary positions between adjacent centers: the shared valley when it is
/// pronounced enough, the midpoint otherwise. Edge lanes extend to the image
/// border.
fn lane_bounds(proj: &[f32], centers: &[usize], min_v: f32, valley_frac: f32) -> Vec<usize> {
    let mut bounds = Vec::with_capacity(centers.len() + 1);
    bounds.push(0);
    for pair in centers.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let valley = profile::argmin_range(proj, a, b + 1);
        let weaker = proj[a].min(proj[b]);
        let prominence = weaker - min_v;
        let depth = weaker - proj[valley];
        if prominence > 0.0 && depth >= valley_frac * prominence {
            bounds.push(valley);
        } else {
            bounds.push((a + b) / 2);
        }
    }
    bounds.push(proj.len());
    bounds
}

#[cfg(test)]
mod tests;
