//! Uncertainty-source description and Monte Carlo settings.

/// Standard deviations of the three modeled uncertainty sources.
///
/// Weather uncertainty grows with forecast lead time: the per-day
/// precipitation sigma is `weather_std_mm` scaled by
/// `day / forecast_horizon_days`, capped at three horizons out.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UncertaintyProfile {
    /// Precipitation deviation sigma at one forecast horizon of lead, mm.
    pub weather_std_mm: f64,
    /// Relative sigma of the yield response multiplier.
    pub yield_std: f64,
    /// Relative sigma of the nutrient price multiplier.
    pub price_std: f64,
    /// Lead time at which the weather sigma reaches its nominal value.
    pub forecast_horizon_days: u32,
}

impl Default for UncertaintyProfile {
    fn default() -> Self {
        Self {
            weather_std_mm: 5.0,
            yield_std: 0.1,
            price_std: 0.05,
            forecast_horizon_days: 14,
        }
    }
}

impl UncertaintyProfile {
    pub fn with_weather_std_mm(mut self, std: f64) -> Self {
        self.weather_std_mm = std;
        self
    }

    pub fn with_yield_std(mut self, std: f64) -> Self {
        self.yield_std = std;
        self
    }

    pub fn with_price_std(mut self, std: f64) -> Self {
        self.price_std = std;
        self
    }

    /// A profile with a single active source, used by sensitivity analysis.
    pub(crate) fn only(&self, source: UncertaintySource) -> Self {
        let mut p = Self { weather_std_mm: 0.0, yield_std: 0.0, price_std: 0.0, ..*self };
        match source {
            UncertaintySource::Weather => p.weather_std_mm = self.weather_std_mm,
            UncertaintySource::Yield => p.yield_std = self.yield_std,
            UncertaintySource::Price => p.price_std = self.price_std,
        }
        p
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("weather_std_mm", self.weather_std_mm),
            ("yield_std", self.yield_std),
            ("price_std", self.price_std),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{name} must be finite and non-negative, got {v}"));
            }
        }
        if self.forecast_horizon_days == 0 {
            return Err("forecast_horizon_days must be at least 1".into());
        }
        Ok(())
    }
}

/// One of the modeled uncertainty sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UncertaintySource {
    Weather,
    Yield,
    Price,
}

impl UncertaintySource {
    pub const ALL: [UncertaintySource; 3] =
        [UncertaintySource::Weather, UncertaintySource::Yield, UncertaintySource::Price];
}

/// Monte Carlo analysis settings.
#[derive(Debug, Clone)]
pub struct McConfig {
    /// Number of sampled scenarios.
    pub trials: usize,
    /// Outer confidence level reported alongside the fixed 0.80/0.90 bands.
    pub confidence_level: f64,
    /// Tail fraction used for value-at-risk and conditional
    /// value-at-risk. Tracks `1 - confidence_level` unless overridden
    /// via [`with_tail_fraction`](Self::with_tail_fraction).
    pub tail_fraction: f64,
    /// Weight on the tail term in robust re-optimization, in [0, 1].
    /// 0 optimizes the scenario mean; 1 optimizes the worst tail only.
    pub risk_aversion: f64,
    /// Scenario count for robust re-optimization. Kept well below
    /// `trials` since every GA candidate is scored on every scenario.
    pub robust_scenarios: usize,
    pub seed: Option<u64>,
}

impl Default for McConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            confidence_level: 0.95,
            tail_fraction: 0.05,
            risk_aversion: 0.5,
            robust_scenarios: 30,
            seed: None,
        }
    }
}

impl McConfig {
    /// Fewer trials for quick feedback.
    pub fn fast() -> Self {
        Self { trials: 200, robust_scenarios: 10, ..Self::default() }
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Sets the outer confidence level and re-derives `tail_fraction`
    /// as `1 - level`. Call [`with_tail_fraction`](Self::with_tail_fraction)
    /// afterwards to decouple the two.
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self.tail_fraction = 1.0 - level;
        self
    }

    pub fn with_tail_fraction(mut self, fraction: f64) -> Self {
        self.tail_fraction = fraction;
        self
    }

    pub fn with_risk_aversion(mut self, lambda: f64) -> Self {
        self.risk_aversion = lambda;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trials < 2 {
            return Err(format!("trials must be at least 2, got {}", self.trials));
        }
        if !(0.5..1.0).contains(&self.confidence_level) {
            return Err(format!(
                "confidence_level must be in [0.5, 1.0), got {}",
                self.confidence_level
            ));
        }
        if !(0.0..=0.5).contains(&self.tail_fraction) || self.tail_fraction == 0.0 {
            return Err(format!(
                "tail_fraction must be in (0.0, 0.5], got {}",
                self.tail_fraction
            ));
        }
        if !(0.0..=1.0).contains(&self.risk_aversion) {
            return Err(format!("risk_aversion must be in [0, 1], got {}", self.risk_aversion));
        }
        if self.robust_scenarios == 0 {
            return Err("robust_scenarios must be at least 1".into());
        }
        Ok(())
    }
}
