//! Monte Carlo output aggregates.

use super::config::UncertaintySource;

/// A two-sided empirical confidence band on the composite score.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfidenceBand {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceBand {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Distribution summary of a schedule's composite score over sampled
/// scenarios.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UncertaintyReport {
    /// Score under the unperturbed forecast.
    pub deterministic_score: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Bands at 0.80, 0.90 and the configured confidence level, in
    /// ascending level order.
    pub bands: Vec<ConfidenceBand>,
    /// Empirical quantile of the composite score at the tail fraction.
    pub value_at_risk: f64,
    /// Mean composite score over the tail at or below [`value_at_risk`](Self::value_at_risk).
    pub conditional_value_at_risk: f64,
    /// Mean squared negative deviation from the deterministic score,
    /// `Σ min(0, sᵢ − target)² / n`. Zero when no trial falls below it.
    pub downside_risk: f64,
    pub trials: usize,
    pub seed: u64,
}

impl UncertaintyReport {
    /// The band at the requested level, if it was computed.
    pub fn band(&self, level: f64) -> Option<ConfidenceBand> {
        self.bands.iter().copied().find(|b| (b.level - level).abs() < 1e-9)
    }
}

/// Relative influence of each uncertainty source on the score spread.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensitivityReport {
    /// Score standard deviation with only that source active, per source.
    pub contributions: Vec<(UncertaintySource, f64)>,
    /// Contributions normalized to sum to 1 (all zeros when every source
    /// is inert).
    pub shares: Vec<(UncertaintySource, f64)>,
    /// Source with the largest contribution.
    pub dominant: UncertaintySource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_lookup() {
        let report = UncertaintyReport {
            deterministic_score: 0.5,
            mean: 0.48,
            std_dev: 0.05,
            bands: vec![
                ConfidenceBand { level: 0.80, lower: 0.40, upper: 0.55 },
                ConfidenceBand { level: 0.95, lower: 0.35, upper: 0.60 },
            ],
            value_at_risk: 0.36,
            conditional_value_at_risk: 0.34,
            downside_risk: 0.6,
            trials: 100,
            seed: 1,
        };
        assert_eq!(report.band(0.80).map(|b| b.upper), Some(0.55));
        assert!(report.band(0.90).is_none());
        assert!((report.band(0.95).unwrap().width() - 0.25).abs() < 1e-12);
    }
}
