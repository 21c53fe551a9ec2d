//! Band detection and quantification within a single lane.
//!
//! A lane collapses to a 1D intensity profile along the migration axis; a
//! rolling-minimum baseline is subtracted, peaks above a noise-derived
//! threshold become bands, and each band integrates the residual over its
//! extent.
//!
//! Documented policies (both configurable-adjacent choices the contract asks
//! to be fixed):
//! - overlapping extents of adjacent peaks are split at the shared valley;
//!   peaks are never merged and never dropped;
//! - integrated intensity is the plain sum of background-subtracted samples
//!   within the extent, negatives clamped to zero.

mod baseline;

use crate::calibrate::MwEstimate;
use crate::image::GelImage;
use crate::lanes::{Lane, MigrationAxis};
use crate::profile;
use log::debug;
use serde::{Deserialize, Serialize};

/// Knobs for per-lane band detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandParams {
    /// Set when bands are darker than the background; the lane profile is
    /// inverted before analysis.
    pub invert: bool,
    /// Box-smoothing radius applied to the lane profile.
    pub smooth_radius: usize,
    /// Rolling-minimum window for background estimation, in pixels.
    pub baseline_window: usize,
    /// Noise gate: threshold is at least `noise_k` standard deviations of the
    /// background-only residual.
    pub noise_k: f32,
    /// Threshold is at least this fraction of the strongest residual.
    pub rel_threshold: f32,
    /// Absolute threshold floor on the normalized residual.
    pub abs_threshold: f32,
    /// Minimum distance between band peaks, in pixels.
    pub min_distance: usize,
    /// A band extent ends where the residual falls below this fraction of the
    /// peak height (or at a local minimum, whichever comes first).
    pub extent_frac: f32,
}

impl Default for BandParams {
    fn default() -> Self {
        Self {
            invert: false,
            smooth_radius: 2,
            baseline_window: 31,
            noise_k: 3.0,
            rel_threshold: 0.1,
            abs_threshold: 0.0,
            min_distance: 5,
            extent_frac: 0.05,
        }
    }
}

/// A detected band: extent, peak, and integrated intensity along the parent
/// lane's migration axis. Positions are pixels from the lane origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// First profile position inside the band.
    pub start: usize,
    /// Last profile position inside the band (inclusive).
    pub end: usize,
    /// Peak position.
    pub peak: usize,
    /// Background-subtracted height at the peak.
    pub peak_height: f32,
    /// Sum of background-subtracted profile values over `[start, end]`.
    pub area: f32,
    /// Assigned molecular weight, if a calibration curve has been applied.
    pub molecular_weight: Option<MwEstimate>,
}

/// Per-lane intensity profile: one mean-intensity value per position along
/// the migration axis, positions counted from the lane origin (the well).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntensityProfile {
    pub values: Vec<f32>,
}

impl IntensityProfile {
    /// Collapse the lane's width to a mean intensity per migration position.
    pub fn extract(image: &GelImage, lane: &Lane) -> Self {
        let plane = image.luma_plane();
        let lo = lane.lo.min(plane.w.max(1) - 1);
        let values = match lane.axis {
            MigrationAxis::Vertical => {
                let hi = lane.hi.clamp(lo + 1, plane.w);
                (0..plane.h)
                    .map(|y| profile::mean(&plane.row(y)[lo..hi]))
                    .collect()
            }
            MigrationAxis::Horizontal => {
                let lo = lane.lo.min(plane.h.max(1) - 1);
                let hi = lane.hi.clamp(lo + 1, plane.h);
                (0..plane.w)
                    .map(|x| {
                        let col: Vec<f32> = (lo..hi).map(|y| plane.get(x, y)).collect();
                        profile::mean(&col)
                    })
                    .collect()
            }
        };
        Self { values }
    }

    /// Number of positions along the migration axis.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Detect bands in one lane of `image`.
///
/// Returns an empty vector (not an error) when nothing rises above the noise
/// threshold.
pub fn detect_bands(image: &GelImage, lane: &Lane, params: &BandParams) -> Vec<Band> {
    let raw = IntensityProfile::extract(image, lane);
    detect_bands_in_profile(&raw, params)
}

/// Band detection on an already-extracted lane profile.
pub fn detect_bands_in_profile(raw: &IntensityProfile, params: &BandParams) -> Vec<Band> {
    if raw.values.len() < 3 {
        return Vec::new();
    }
    let mut values = profile::box_smooth(&raw.values, params.smooth_radius);
    if params.invert {
        values.iter_mut().for_each(|v| *v = 1.0 - *v);
    }
    let base = baseline::estimate(&values, params.baseline_window);
    let signal = baseline::subtract(&values, &base);

    let threshold = detection_threshold(&signal, params);
    let mut peaks: Vec<usize> = profile::local_maxima(&signal, params.min_distance)
        .into_iter()
        .filter(|&i| signal[i] >= threshold)
        .map(|i| profile::plateau_center(&signal, i))
        .collect();
    peaks.dedup();
    if peaks.is_empty() {
        return Vec::new();
    }

    let mut bands: Vec<Band> = peaks
        .iter()
        .map(|&peak| {
            let (start, end) = band_extent(&signal, peak, params.extent_frac);
            Band {
                start,
                end,
                peak,
                peak_height: signal[peak],
                area: 0.0,
                molecular_weight: None,
            }
        })
        .collect();
    split_overlaps(&mut bands, &signal);
    for band in &mut bands {
        band.area = signal[band.start..=band.end]
            .iter()
            .map(|&v| v.max(0.0))
            .sum();
    }
    debug!(
        "detect_bands: {} bands above threshold {:.4} in profile of {}",
        bands.len(),
        threshold,
        raw.values.len()
    );
    bands
}

/// Noise-aware detection threshold: the largest of the absolute floor, the
/// `noise_k`-sigma gate from background-only residual, and the relative
/// fraction of the strongest residual.
fn detection_threshold(signal: &[f32], params: &BandParams) -> f32 {
    let max_signal = signal.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if !max_signal.is_finite() || max_signal <= 0.0 {
        return f32::INFINITY;
    }
    let mut sorted: Vec<f32> = signal.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = sorted[sorted.len() / 2];
    let background: Vec<f32> = signal.iter().cloned().filter(|&v| v <= median).collect();
    let sigma = profile::stddev(&background);
    params
        .abs_threshold
        .max(params.noise_k * sigma)
        .max(params.rel_threshold * max_signal)
}

/// Expand from `peak` to the nearest local minimum or to where the residual
/// falls below `extent_frac` of the peak height, whichever is reached first.
fn band_extent(signal: &[f32], peak: usize, extent_frac: f32) -> (usize, usize) {
    let floor = extent_frac * signal[peak];
    let mut start = peak;
    while start > 0 {
        let next = start - 1;
        if signal[next] < floor || signal[next] > signal[start] {
            break;
        }
        start = next;
    }
    let mut end = peak;
    while end + 1 < signal.len() {
        let next = end + 1;
        if signal[next] < floor || signal[next] > signal[end] {
            break;
        }
        end = next;
    }
    (start, end)
}

/// Split policy for closely spaced bands: when the extents of two adjacent
/// peaks overlap, both bands are kept and the shared valley between the peaks
/// becomes the dividing line.
fn split_overlaps(bands: &mut [Band], signal: &[f32]) {
    for i in 1..bands.len() {
        if bands[i - 1].end >= bands[i].start {
            let valley = profile::argmin_range(signal, bands[i - 1].peak, bands[i].peak + 1);
            bands[i - 1].end = valley.max(bands[i - 1].peak);
            bands[i].start = (valley + 1).min(bands[i].peak);
        }
    }
}

#[cfg(test)]
mod tests;
