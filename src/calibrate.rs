//! Molecular-weight calibration from a ladder lane.
//!
//! Electrophoretic migration is close to linear in log(MW), so the curve is
//! fitted through `(position, log10(MW))` control points with a monotone
//! piecewise-cubic Hermite interpolant (Fritsch–Carlson slopes). The
//! interpolant passes exactly through every control point and cannot
//! oscillate outside the data; a separate global log-linear regression
//! supplies an R² quality indicator.

use log::debug;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// One ladder marker: migration position (pixels from the well) and its known
/// molecular weight (kDa).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub position: f64,
    pub weight: f64,
}

/// What `evaluate` does outside the control-point span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationPolicy {
    /// Extend linearly in log-MW space using the endpoint slope; results are
    /// flagged as extrapolated.
    #[default]
    LinearLog,
    /// Refuse with [`CalibrationError::OutOfCalibrationRange`].
    Fail,
}

/// A molecular-weight estimate, flagged when it came from extrapolation
/// (lower confidence than an interpolated value).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MwEstimate {
    /// Estimated molecular weight (kDa).
    pub weight: f64,
    pub extrapolated: bool,
}

/// Hard calibration failures. No molecular weight is ever fabricated from an
/// invalid curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CalibrationError {
    InsufficientControlPoints { found: usize, minimum: usize },
    /// Known weights must strictly decrease as migration distance increases
    /// (heavier markers migrate less). `index` is the first offending point
    /// in position order.
    NonMonotonicLadder { index: usize },
    /// A control point carries a non-positive weight, which has no logarithm.
    NonPositiveWeight { index: usize, weight: f64 },
    OutOfCalibrationRange { position: f64, lo: f64, hi: f64 },
}

impl std::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationError::InsufficientControlPoints { found, minimum } => {
                write!(f, "insufficient control points ({found} < {minimum})")
            }
            CalibrationError::NonMonotonicLadder { index } => write!(
                f,
                "ladder weights are not strictly decreasing with migration (point {index})"
            ),
            CalibrationError::NonPositiveWeight { index, weight } => {
                write!(f, "control point {index} has non-positive weight {weight}")
            }
            CalibrationError::OutOfCalibrationRange { position, lo, hi } => write!(
                f,
                "position {position:.2} outside calibrated span [{lo:.2}, {hi:.2}]"
            ),
        }
    }
}

impl std::error::Error for CalibrationError {}

/// Fitted `position → molecular weight` mapping.
///
/// Immutable once fitted; re-fitting builds a new curve, and callers replace
/// the old one atomically (see `GelAnalysis::apply_calibration`).
#[derive(Clone, Debug, Serialize)]
pub struct CalibrationCurve {
    positions: Vec<f64>,
    log_weights: Vec<f64>,
    slopes: Vec<f64>,
    policy: ExtrapolationPolicy,
    r_squared: f64,
}

impl CalibrationCurve {
    pub const MIN_POINTS: usize = 2;

    /// Fit a curve through the given ladder points.
    pub fn fit(
        points: &[ControlPoint],
        policy: ExtrapolationPolicy,
    ) -> Result<Self, CalibrationError> {
        if points.len() < Self::MIN_POINTS {
            return Err(CalibrationError::InsufficientControlPoints {
                found: points.len(),
                minimum: Self::MIN_POINTS,
            });
        }
        let mut sorted: Vec<ControlPoint> = points.to_vec();
        sorted.sort_by(|a, b| {
            a.position
                .partial_cmp(&b.position)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for (index, point) in sorted.iter().enumerate() {
            if !(point.weight > 0.0) || !point.position.is_finite() {
                return Err(CalibrationError::NonPositiveWeight {
                    index,
                    weight: point.weight,
                });
            }
            if index > 0 {
                let prev = &sorted[index - 1];
                if point.position <= prev.position || point.weight >= prev.weight {
                    return Err(CalibrationError::NonMonotonicLadder { index });
                }
            }
        }

        let positions: Vec<f64> = sorted.iter().map(|p| p.position).collect();
        let log_weights: Vec<f64> = sorted.iter().map(|p| p.weight.log10()).collect();
        let slopes = pchip_slopes(&positions, &log_weights);
        let r_squared = log_linear_r_squared(&positions, &log_weights);
        debug!(
            "calibration fit: {} points over [{:.1}, {:.1}], R²={:.4}",
            positions.len(),
            positions[0],
            positions[positions.len() - 1],
            r_squared
        );
        Ok(Self {
            positions,
            log_weights,
            slopes,
            policy,
            r_squared,
        })
    }

    /// Calibrated migration span `(first, last)` in pixels.
    pub fn span(&self) -> (f64, f64) {
        (self.positions[0], self.positions[self.positions.len() - 1])
    }

    /// R² of the global log-linear regression through the control points, a
    /// quality indicator for how ideal the gel's migration behavior is.
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// The fitted control points, sorted by position.
    pub fn control_points(&self) -> Vec<ControlPoint> {
        self.positions
            .iter()
            .zip(&self.log_weights)
            .map(|(&position, &lw)| ControlPoint {
                position,
                weight: 10f64.powf(lw),
            })
            .collect()
    }

    /// Molecular weight at a migration position.
    ///
    /// Inside the span the monotone interpolant is evaluated; outside, the
    /// configured [`ExtrapolationPolicy`] decides between a flagged linear
    /// log-space extrapolation and `OutOfCalibrationRange`.
    pub fn evaluate(&self, position: f64) -> Result<MwEstimate, CalibrationError> {
        let (lo, hi) = self.span();
        if position < lo || position > hi {
            return match self.policy {
                ExtrapolationPolicy::Fail => {
                    Err(CalibrationError::OutOfCalibrationRange { position, lo, hi })
                }
                ExtrapolationPolicy::LinearLog => {
                    let (anchor, slope) = if position < lo {
                        (0, self.slopes[0])
                    } else {
                        let last = self.positions.len() - 1;
                        (last, self.slopes[last])
                    };
                    let lw =
                        self.log_weights[anchor] + slope * (position - self.positions[anchor]);
                    Ok(MwEstimate {
                        weight: 10f64.powf(lw),
                        extrapolated: true,
                    })
                }
            };
        }

        // Exact hit on a knot returns the control point's weight exactly.
        let seg = match self
            .positions
            .binary_search_by(|p| p.partial_cmp(&position).unwrap_or(std::cmp::Ordering::Less))
        {
            Ok(i) => {
                return Ok(MwEstimate {
                    weight: 10f64.powf(self.log_weights[i]),
                    extrapolated: false,
                })
            }
            Err(i) => i - 1,
        };
        let h = self.positions[seg + 1] - self.positions[seg];
        let t = (position - self.positions[seg]) / h;
        let (y0, y1) = (self.log_weights[seg], self.log_weights[seg + 1]);
        let (m0, m1) = (self.slopes[seg] * h, self.slopes[seg + 1] * h);
        let t2 = t * t;
        let t3 = t2 * t;
        let lw = (2.0 * t3 - 3.0 * t2 + 1.0) * y0
            + (t3 - 2.0 * t2 + t) * m0
            + (-2.0 * t3 + 3.0 * t2) * y1
            + (t3 - t2) * m1;
        Ok(MwEstimate {
            weight: 10f64.powf(lw),
            extrapolated: false,
        })
    }
}

/// Fritsch–Carlson slopes: shape-preserving, so the interpolant stays
/// monotone between knots.
fn pchip_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let d: Vec<f64> = ys
        .windows(2)
        .zip(&h)
        .map(|(w, &hi)| (w[1] - w[0]) / hi)
        .collect();
    if n == 2 {
        return vec![d[0], d[0]];
    }
    let mut m = vec![0.0f64; n];
    m[0] = endpoint_slope(h[0], h[1], d[0], d[1]);
    m[n - 1] = endpoint_slope(h[n - 2], h[n - 3], d[n - 2], d[n - 3]);
    for i in 1..n - 1 {
        if d[i - 1] * d[i] <= 0.0 {
            m[i] = 0.0;
        } else {
            let w1 = 2.0 * h[i] + h[i - 1];
            let w2 = h[i] + 2.0 * h[i - 1];
            m[i] = (w1 + w2) / (w1 / d[i - 1] + w2 / d[i]);
        }
    }
    m
}

/// One-sided three-point endpoint slope with the standard monotonicity clamp.
fn endpoint_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let m = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if m * d0 <= 0.0 {
        0.0
    } else if d0 * d1 <= 0.0 && m.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        m
    }
}

/// R² of the ordinary least-squares line through `(x, y)`, solved via the
/// 2×2 normal equations.
fn log_linear_r_squared(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let sx: f64 = xs.iter().sum();
    let sy: f64 = ys.iter().sum();
    let sxx: f64 = xs.iter().map(|x| x * x).sum();
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| x * y).sum();
    let a = Matrix2::new(n, sx, sx, sxx);
    let b = Vector2::new(sy, sxy);
    let Some(sol) = a.lu().solve(&b) else {
        return 0.0;
    };
    let (intercept, slope) = (sol[0], sol[1]);
    let mean_y = sy / n;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    if ss_tot <= f64::EPSILON {
        1.0
    } else {
        (1.0 - ss_res / ss_tot).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> Vec<ControlPoint> {
        [(10.0, 100_000.0), (30.0, 50_000.0), (60.0, 20_000.0), (90.0, 5_000.0)]
            .into_iter()
            .map(|(position, weight)| ControlPoint { position, weight })
            .collect()
    }

    #[test]
    fn fit_accepts_a_physical_ladder() {
        let curve = CalibrationCurve::fit(&ladder(), ExtrapolationPolicy::LinearLog).unwrap();
        assert_eq!(curve.span(), (10.0, 90.0));
        assert!(curve.r_squared() > 0.9);
    }

    #[test]
    fn fit_rejects_increasing_weights() {
        let points = [
            ControlPoint {
                position: 10.0,
                weight: 5_000.0,
            },
            ControlPoint {
                position: 30.0,
                weight: 50_000.0,
            },
        ];
        assert_eq!(
            CalibrationCurve::fit(&points, ExtrapolationPolicy::LinearLog).unwrap_err(),
            CalibrationError::NonMonotonicLadder { index: 1 }
        );
    }

    #[test]
    fn fit_rejects_too_few_points() {
        let points = [ControlPoint {
            position: 10.0,
            weight: 5_000.0,
        }];
        assert_eq!(
            CalibrationCurve::fit(&points, ExtrapolationPolicy::LinearLog).unwrap_err(),
            CalibrationError::InsufficientControlPoints {
                found: 1,
                minimum: 2
            }
        );
    }

    #[test]
    fn fit_rejects_duplicate_positions() {
        let points = [
            ControlPoint {
                position: 10.0,
                weight: 50_000.0,
            },
            ControlPoint {
                position: 10.0,
                weight: 20_000.0,
            },
        ];
        assert!(matches!(
            CalibrationCurve::fit(&points, ExtrapolationPolicy::LinearLog),
            Err(CalibrationError::NonMonotonicLadder { .. })
        ));
    }

    #[test]
    fn evaluate_passes_through_control_points() {
        let curve = CalibrationCurve::fit(&ladder(), ExtrapolationPolicy::LinearLog).unwrap();
        for point in ladder() {
            let est = curve.evaluate(point.position).unwrap();
            assert!(!est.extrapolated);
            let rel = (est.weight - point.weight).abs() / point.weight;
            assert!(rel < 1e-9, "at {} got {}", point.position, est.weight);
        }
    }

    #[test]
    fn interpolation_is_monotone_between_knots() {
        let curve = CalibrationCurve::fit(&ladder(), ExtrapolationPolicy::LinearLog).unwrap();
        let mut prev = f64::INFINITY;
        for i in 0..=160 {
            let pos = 10.0 + i as f64 * 0.5;
            let w = curve.evaluate(pos).unwrap().weight;
            assert!(w <= prev + 1e-9, "MW must not increase with migration");
            prev = w;
        }
    }

    #[test]
    fn extrapolation_is_flagged() {
        let curve = CalibrationCurve::fit(&ladder(), ExtrapolationPolicy::LinearLog).unwrap();
        let est = curve.evaluate(100.0).unwrap();
        assert!(est.extrapolated);
        assert!(est.weight < 5_000.0, "beyond the last marker MW keeps falling");
        let inside = curve.evaluate(45.0).unwrap();
        assert!(!inside.extrapolated);
    }

    #[test]
    fn fail_policy_rejects_out_of_span() {
        let curve = CalibrationCurve::fit(&ladder(), ExtrapolationPolicy::Fail).unwrap();
        assert!(matches!(
            curve.evaluate(5.0),
            Err(CalibrationError::OutOfCalibrationRange { .. })
        ));
        assert!(curve.evaluate(60.0).is_ok());
    }

    #[test]
    fn r_squared_is_one_for_exact_log_linear_ladder() {
        let points: Vec<ControlPoint> = (0..5)
            .map(|i| ControlPoint {
                position: 10.0 + 20.0 * i as f64,
                weight: 100_000.0 * 10f64.powf(-0.3 * i as f64),
            })
            .collect();
        let curve = CalibrationCurve::fit(&points, ExtrapolationPolicy::LinearLog).unwrap();
        assert!((curve.r_squared() - 1.0).abs() < 1e-9);
    }
}
