//! DP configuration.

/// Configuration for the dynamic-programming optimizer.
///
/// # Defaults
///
/// ```
/// use fertisched::dp::DpConfig;
///
/// let config = DpConfig::default();
/// assert_eq!(config.levels, 10);
/// assert_eq!(config.max_states, 2_000_000);
/// ```
#[derive(Debug, Clone)]
pub struct DpConfig {
    /// Number of discretization levels per nutrient. Each level is
    /// `requirement / levels` units/acre; an action applies one or more
    /// levels on a single day.
    pub levels: u32,

    /// Per-day discount factor, slightly favoring earlier (more certain)
    /// applications. The terminal shortfall penalty is never discounted.
    pub gamma: f64,

    /// Upper bound on `(levels + 1)^nutrients x (horizon + 1)`. Problems
    /// above this are rejected before the value table is allocated.
    pub max_states: u64,
}

impl Default for DpConfig {
    fn default() -> Self {
        Self { levels: 10, gamma: 0.98, max_states: 2_000_000 }
    }
}

impl DpConfig {
    /// Sets the discretization level count.
    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    /// Sets the per-day discount factor.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma.clamp(0.0, 1.0);
        self
    }

    /// Sets the state-space bound.
    pub fn with_max_states(mut self, max_states: u64) -> Self {
        self.max_states = max_states;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.levels == 0 {
            return Err("levels must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err("gamma must be in [0, 1]".into());
        }
        if self.max_states == 0 {
            return Err("max_states must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert!(DpConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_levels_rejected() {
        assert!(DpConfig::default().with_levels(0).validate().is_err());
    }

    #[test]
    fn test_gamma_clamped() {
        let c = DpConfig::default().with_gamma(1.5);
        assert!((c.gamma - 1.0).abs() < 1e-12);
    }
}
