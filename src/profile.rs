//! 1D signal helpers shared by lane and band detection.
//!
//! Projection profiles and per-lane intensity profiles go through the same
//! primitives: box smoothing, rolling-minimum envelopes, and non-maximum
//! suppressed peak picking.

/// Box-filter smoothing with the given radius (window = `2·radius + 1`),
/// clamping at the borders. Radius 0 returns the input unchanged.
pub fn box_smooth(values: &[f32], radius: usize) -> Vec<f32> {
    if radius == 0 || values.len() < 2 {
        return values.to_vec();
    }
    let n = values.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(n);
            let sum: f32 = values[lo..hi].iter().sum();
            sum / (hi - lo) as f32
        })
        .collect()
}

/// Rolling minimum over a centered window, used as a background envelope.
///
/// Monotonic-deque implementation, O(n) regardless of window size.
pub fn rolling_min(values: &[f32], window: usize) -> Vec<f32> {
    let n = values.len();
    if n == 0 || window <= 1 {
        return values.to_vec();
    }
    let radius = window / 2;
    let mut out = Vec::with_capacity(n);
    let mut deque: std::collections::VecDeque<usize> = std::collections::VecDeque::new();
    let mut next = 0usize;
    for i in 0..n {
        let hi = (i + radius + 1).min(n);
        while next < hi {
            while let Some(&back) = deque.back() {
                if values[back] >= values[next] {
                    deque.pop_back();
                } else {
                    break;
                }
            }
            deque.push_back(next);
            next += 1;
        }
        let lo = i.saturating_sub(radius);
        while let Some(&front) = deque.front() {
            if front < lo {
                deque.pop_front();
            } else {
                break;
            }
        }
        out.push(values[*deque.front().expect("window never empty")]);
    }
    out
}

/// Indices of local maxima, strongest-first non-maximum suppression so that
/// surviving peaks are at least `min_distance` apart. The result is sorted by
/// index.
pub fn local_maxima(values: &[f32], min_distance: usize) -> Vec<usize> {
    let n = values.len();
    if n < 3 {
        return Vec::new();
    }
    let mut candidates: Vec<usize> = (1..n - 1)
        .filter(|&i| values[i] >= values[i - 1] && values[i] > values[i + 1])
        .collect();
    candidates.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let min_distance = min_distance.max(1);
    let mut kept: Vec<usize> = Vec::new();
    for i in candidates {
        if kept.iter().all(|&k| k.abs_diff(i) >= min_distance) {
            kept.push(i);
        }
    }
    kept.sort_unstable();
    kept
}

/// Center of the flat plateau containing the local maximum at `i`.
///
/// Box-smoothed stripe profiles top out in exact-valued plateaus whose edge
/// the maximum search reports; the plateau midpoint is the honest center.
pub fn plateau_center(values: &[f32], i: usize) -> usize {
    let eps = 1e-6f32;
    let mut lo = i;
    while lo > 0 && (values[lo - 1] - values[i]).abs() <= eps {
        lo -= 1;
    }
    let mut hi = i;
    while hi + 1 < values.len() && (values[hi + 1] - values[i]).abs() <= eps {
        hi += 1;
    }
    (lo + hi) / 2
}

/// Index of the smallest value in `values[lo..hi]` (first on ties).
pub fn argmin_range(values: &[f32], lo: usize, hi: usize) -> usize {
    debug_assert!(lo < hi && hi <= values.len());
    let mut best = lo;
    for i in lo + 1..hi {
        if values[i] < values[best] {
            best = i;
        }
    }
    best
}

/// Mean of a slice; 0 for an empty slice.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population standard deviation; 0 for fewer than two samples.
pub fn stddev(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_smooth_flattens_a_spike() {
        let mut signal = vec![0.0f32; 11];
        signal[5] = 1.0;
        let smoothed = box_smooth(&signal, 2);
        assert!((smoothed[5] - 0.2).abs() < 1e-6);
        assert!((smoothed[3] - 0.2).abs() < 1e-6);
        assert_eq!(smoothed[0], 0.0);
    }

    #[test]
    fn rolling_min_tracks_the_envelope() {
        let signal = vec![3.0, 1.0, 4.0, 1.5, 5.0, 0.5, 2.0];
        let env = rolling_min(&signal, 3);
        assert_eq!(env, vec![1.0, 1.0, 1.0, 1.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn local_maxima_suppresses_close_neighbors() {
        let mut signal = vec![0.0f32; 30];
        signal[10] = 1.0;
        signal[12] = 0.8;
        signal[20] = 0.9;
        let peaks = local_maxima(&signal, 5);
        assert_eq!(peaks, vec![10, 20]);
    }

    #[test]
    fn local_maxima_empty_on_monotonic_signal() {
        let signal: Vec<f32> = (0..10).map(|i| i as f32).collect();
        assert!(local_maxima(&signal, 1).is_empty());
    }

    #[test]
    fn plateau_center_recovers_the_midpoint() {
        let signal = vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0];
        assert_eq!(plateau_center(&signal, 6), 4);
        assert_eq!(plateau_center(&signal, 2), 4);
        assert_eq!(plateau_center(&signal, 0), 0);
    }

    #[test]
    fn argmin_range_finds_the_valley() {
        let signal = vec![5.0, 3.0, 1.0, 2.0, 4.0];
        assert_eq!(argmin_range(&signal, 0, 5), 2);
        assert_eq!(argmin_range(&signal, 3, 5), 3);
    }
}
