//! Background estimation for per-lane intensity profiles.

use crate::profile;

/// Local background estimate: a rolling minimum over `window` samples,
/// smoothed with a box filter of the same scale so staircase steps in the
/// envelope do not leak into the residual.
pub fn estimate(values: &[f32], window: usize) -> Vec<f32> {
    let window = window.max(3) | 1;
    let envelope = profile::rolling_min(values, window);
    profile::box_smooth(&envelope, window / 2)
}

/// Residual signal after background subtraction. Negative residuals are kept;
/// integration clamps them at zero.
pub fn subtract(values: &[f32], baseline: &[f32]) -> Vec<f32> {
    values
        .iter()
        .zip(baseline)
        .map(|(v, b)| v - b)
        .collect()
}
