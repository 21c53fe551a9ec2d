//! Per-value intensity histograms and percentile auto-leveling.

use crate::image::{GelImage, SampleDepth};
use serde::Serialize;

/// Intensity histogram with one bin per representable sample value.
///
/// Multi-channel images merge channels by summing counts, so
/// `total() == width × height × channels`.
#[derive(Clone, Debug, Serialize)]
pub struct Histogram {
    depth: SampleDepth,
    counts: Vec<u64>,
    total: u64,
}

impl Histogram {
    /// Count every sample of `image`. Runs in O(pixels × channels).
    pub fn of(image: &GelImage) -> Self {
        let mut counts = vec![0u64; image.depth().bin_count()];
        for &v in image.data() {
            counts[v as usize] += 1;
        }
        Self {
            depth: image.depth(),
            counts,
            total: image.data().len() as u64,
        }
    }

    /// Depth the histogram was computed at.
    #[inline]
    pub fn depth(&self) -> SampleDepth {
        self.depth
    }

    /// Per-bin counts, one entry per representable sample value.
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total number of samples counted.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Sample values at the given cumulative-percentile thresholds, for use as an
/// auto-leveling window.
///
/// A degenerate histogram (all mass in one bin) yields that bin for both
/// bounds; callers must treat the zero-width window as a step function.
pub fn auto_levels(hist: &Histogram, low_pct: f64, high_pct: f64) -> (u16, u16) {
    if hist.total == 0 {
        return (0, 0);
    }
    let low_pct = low_pct.clamp(0.0, 100.0);
    let high_pct = high_pct.clamp(0.0, 100.0);
    let low_target = hist.total as f64 * low_pct / 100.0;
    let high_target = hist.total as f64 * high_pct / 100.0;

    let mut low = 0u16;
    let mut high = 0u16;
    let mut cum = 0f64;
    let mut low_found = false;
    for (bin, &count) in hist.counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        cum += count as f64;
        if !low_found && cum > low_target {
            low = bin as u16;
            low_found = true;
        }
        high = bin as u16;
        if cum >= high_target {
            break;
        }
    }
    if high < low {
        high = low;
    }
    (low, high)
}
