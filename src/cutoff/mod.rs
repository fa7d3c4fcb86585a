// Cutoff estimation: where "relevant" terms begin on the strength curve.
//
// The sorted distribution is smoothed with a regression B-spline over rank,
// projected to be non-decreasing, and accumulated. The cutoff is the observed
// value at the first rank where the cumulative fitted curve reaches
// `percent` of its total.

pub mod spline;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{KeywordError, LitkeysResult, Stage};
use crate::network::degree::DegreeDistribution;
use spline::{fit_least_squares, isotonic, BSplineBasis};

pub const DEFAULT_SPLINE_DEGREES: usize = 2;
pub const DEFAULT_KNOT_NUM: usize = 2;
pub const DEFAULT_PERCENT: f64 = 0.9769956;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutoffMethod {
    #[default]
    Spline,
}

impl fmt::Display for CutoffMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoffMethod::Spline => f.write_str("spline"),
        }
    }
}

impl FromStr for CutoffMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spline" => Ok(CutoffMethod::Spline),
            other => Err(format!("unknown cutoff method '{other}' (only spline is supported)")),
        }
    }
}

/// One rank of the fitted curve, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    pub rank: usize,
    pub observed: f64,
    /// Monotone fitted value
    pub fitted: f64,
    /// Cumulative fitted total up to this rank, as a share of the whole
    pub cumulative_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoffDiagnostics {
    pub curve: Vec<CurvePoint>,
    /// Interior knot positions on the rank axis
    pub knots: Vec<f64>,
    /// Raw spline value at each interior knot
    pub knot_values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoffEstimate {
    pub cutoff: f64,
    /// 1-based rank whose observed value became the cutoff
    pub rank: usize,
    pub percent: f64,
    pub diagnostics: Option<CutoffDiagnostics>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffEstimator {
    pub method: CutoffMethod,
    /// Polynomial degree of the spline basis
    pub degrees: usize,
    /// Number of interior knots
    pub knot_num: usize,
    /// Target cumulative share in (0, 1]
    pub percent: f64,
}

impl Default for CutoffEstimator {
    fn default() -> Self {
        Self {
            method: CutoffMethod::Spline,
            degrees: DEFAULT_SPLINE_DEGREES,
            knot_num: DEFAULT_KNOT_NUM,
            percent: DEFAULT_PERCENT,
        }
    }
}

impl CutoffEstimator {
    pub fn validate(&self) -> LitkeysResult<()> {
        if self.degrees < 1 {
            return Err(KeywordError::configuration(
                Stage::CutoffEstimation,
                "spline_degrees must be at least 1",
            ));
        }
        if self.knot_num < 1 {
            return Err(KeywordError::configuration(
                Stage::CutoffEstimation,
                "spline_knot_num must be at least 1",
            ));
        }
        if !(self.percent > 0.0 && self.percent <= 1.0) {
            return Err(KeywordError::configuration(
                Stage::CutoffEstimation,
                format!("target_percent must be in (0, 1], got {}", self.percent),
            ));
        }
        Ok(())
    }

    /// Points needed for a determined fit: one per basis function.
    ///
    /// Saturates instead of overflowing, so absurd knot or degree counts
    /// fail the point check rather than panic.
    pub fn min_points(&self) -> usize {
        self.knot_num.saturating_add(self.degrees).saturating_add(1)
    }

    pub fn estimate(&self, dist: &DegreeDistribution, diagnostics: bool) -> LitkeysResult<CutoffEstimate> {
        self.validate()?;

        let n = dist.len();
        if n < self.min_points() {
            return Err(KeywordError::insufficient_data(
                Stage::CutoffEstimation,
                format!(
                    "{n} nodes in the degree distribution, a degree-{} spline with {} knots needs at least {}",
                    self.degrees,
                    self.knot_num,
                    self.min_points()
                ),
            ));
        }

        let observed = dist.values();
        let ranks: Vec<f64> = (1..=n).map(|r| r as f64).collect();

        let (basis, coefficients) = match self.method {
            CutoffMethod::Spline => {
                let basis = BSplineBasis::clamped(1.0, n as f64, self.degrees, self.knot_num);
                let coefficients = fit_least_squares(&basis, &ranks, &observed).ok_or_else(|| {
                    KeywordError::insufficient_data(
                        Stage::CutoffEstimation,
                        "spline normal equations are singular for this distribution",
                    )
                })?;
                (basis, coefficients)
            }
        };

        let raw: Vec<f64> = ranks.iter().map(|&x| basis.value(&coefficients, x)).collect();
        let fitted: Vec<f64> = isotonic(&raw).into_iter().map(|v| v.max(0.0)).collect();

        let mut cumulative = Vec::with_capacity(n);
        let mut running = 0.0;
        for &v in &fitted {
            running += v;
            cumulative.push(running);
        }
        let total = running;

        let index = if self.percent >= 1.0 {
            n - 1
        } else if total <= 0.0 {
            0
        } else {
            let target = self.percent * total;
            cumulative
                .iter()
                .position(|&c| c >= target)
                .unwrap_or(n - 1)
        };
        let cutoff = observed[index];

        debug!(
            coefficients = ?coefficients,
            total,
            "Fitted spline to degree distribution"
        );
        info!(
            cutoff,
            rank = index + 1,
            nodes = n,
            percent = self.percent,
            degrees = self.degrees,
            knots = self.knot_num,
            "Estimated strength cutoff"
        );

        let diagnostics = diagnostics.then(|| {
            let curve = (0..n)
                .map(|i| CurvePoint {
                    rank: i + 1,
                    observed: observed[i],
                    fitted: fitted[i],
                    cumulative_share: if total > 0.0 { cumulative[i] / total } else { 0.0 },
                })
                .collect();
            let knots = basis.interior_knots().to_vec();
            let knot_values = knots.iter().map(|&k| basis.value(&coefficients, k)).collect();
            CutoffDiagnostics {
                curve,
                knots,
                knot_values,
            }
        });

        Ok(CutoffEstimate {
            cutoff,
            rank: index + 1,
            percent: self.percent,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::degree::StrengthMetric;

    fn dist(values: &[f64]) -> DegreeDistribution {
        DegreeDistribution::from_values(
            StrengthMetric::Strength,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("t{i:03}"), *v)),
        )
    }

    fn estimator(percent: f64) -> CutoffEstimator {
        CutoffEstimator {
            percent,
            ..CutoffEstimator::default()
        }
    }

    #[test]
    fn test_all_zero_gives_zero() {
        let d = dist(&[0.0; 6]);
        let est = estimator(0.5).estimate(&d, false).unwrap();
        assert_eq!(est.cutoff, 0.0);
    }

    #[test]
    fn test_percent_one_gives_maximum() {
        let d = dist(&[1.0, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 13.0]);
        let est = estimator(1.0).estimate(&d, false).unwrap();
        assert_eq!(est.cutoff, 13.0);
        assert_eq!(est.rank, 8);
    }

    #[test]
    fn test_monotone_in_percent() {
        let d = dist(&[0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 5.0, 9.0, 14.0, 30.0, 31.0, 60.0]);
        let mut last = f64::NEG_INFINITY;
        for step in 1..=20 {
            let percent = step as f64 / 20.0;
            let cutoff = estimator(percent).estimate(&d, false).unwrap().cutoff;
            assert!(cutoff >= last, "cutoff fell from {last} to {cutoff} at {percent}");
            last = cutoff;
        }
    }

    #[test]
    fn test_insufficient_points() {
        // degree 2 + 2 knots + 1 = 5 points needed
        let err = estimator(0.5).estimate(&dist(&[1.0, 2.0, 3.0, 4.0]), false).unwrap_err();
        assert_eq!(err.kind(), "InsufficientDataError");
        assert!(estimator(0.5).estimate(&dist(&[1.0, 2.0, 3.0, 4.0, 5.0]), false).is_ok());
    }

    #[test]
    fn test_huge_knot_or_degree_counts_do_not_overflow() {
        let d = dist(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        for (degrees, knot_num) in [(2, usize::MAX), (usize::MAX, 2), (usize::MAX, usize::MAX)] {
            let est = CutoffEstimator {
                degrees,
                knot_num,
                ..CutoffEstimator::default()
            };
            assert_eq!(est.min_points(), usize::MAX);
            let err = est.estimate(&d, false).unwrap_err();
            assert_eq!(err.kind(), "InsufficientDataError");
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let d = dist(&[1.0; 10]);
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            let err = estimator(bad).estimate(&d, false).unwrap_err();
            assert_eq!(err.kind(), "ConfigurationError", "percent {bad}");
        }
        let no_knots = CutoffEstimator {
            knot_num: 0,
            ..CutoffEstimator::default()
        };
        assert_eq!(no_knots.estimate(&d, false).unwrap_err().kind(), "ConfigurationError");
    }

    #[test]
    fn test_diagnostics_curve_is_monotone() {
        let d = dist(&[0.0, 4.0, 1.0, 1.0, 2.0, 8.0, 3.0, 20.0]);
        let est = estimator(0.8).estimate(&d, true).unwrap();
        let diag = est.diagnostics.unwrap();
        assert_eq!(diag.curve.len(), 8);
        assert_eq!(diag.knots.len(), 2);
        assert_eq!(diag.knot_values.len(), 2);
        for pair in diag.curve.windows(2) {
            assert!(pair[1].fitted >= pair[0].fitted);
            assert!(pair[1].cumulative_share >= pair[0].cumulative_share);
        }
        let last = diag.curve.last().unwrap();
        assert!((last.cumulative_share - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cutoff_is_an_observed_value() {
        let values = [0.0, 1.0, 2.0, 2.0, 4.0, 7.0, 11.0];
        let est = estimator(0.6).estimate(&dist(&values), false).unwrap();
        assert!(values.contains(&est.cutoff));
    }
}
