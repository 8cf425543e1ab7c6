//! ML optimizer configuration.

/// Configuration for the learned-model-guided optimizer.
///
/// # Defaults
///
/// ```
/// use fertisched::ml::MlConfig;
///
/// let config = MlConfig::default();
/// assert_eq!(config.min_records, 10);
/// assert_eq!(config.hidden_units, 20);
/// assert!((config.exploration_rate - 0.1).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct MlConfig {
    /// Minimum historical records required; fewer raises
    /// [`InsufficientData`](crate::error::OptimizeError::InsufficientData).
    /// 10 is the hard floor; 50 or more is recommended before the
    /// dispatcher prefers this algorithm.
    pub min_records: usize,

    /// Hidden layer width of the yield-response regressor.
    pub hidden_units: usize,

    /// Training epochs over the historical set.
    pub epochs: usize,

    /// SGD learning rate.
    pub learning_rate: f64,

    /// How many applications each nutrient's requirement is split into
    /// during greedy placement.
    pub splits: usize,

    /// Probability of substituting a random feasible placement for the
    /// greedy argmax — a lightweight bandit heuristic against local optima.
    pub exploration_rate: f64,

    /// Random seed for weight init, shuffling and exploration.
    pub seed: Option<u64>,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            min_records: 10,
            hidden_units: 20,
            epochs: 200,
            learning_rate: 0.01,
            splits: 3,
            exploration_rate: 0.1,
            seed: None,
        }
    }
}

impl MlConfig {
    /// Sets the minimum record count.
    pub fn with_min_records(mut self, n: usize) -> Self {
        self.min_records = n;
        self
    }

    /// Sets the hidden layer width.
    pub fn with_hidden_units(mut self, n: usize) -> Self {
        self.hidden_units = n;
        self
    }

    /// Sets the number of training epochs.
    pub fn with_epochs(mut self, n: usize) -> Self {
        self.epochs = n;
        self
    }

    /// Sets the SGD learning rate.
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the per-nutrient application split count.
    pub fn with_splits(mut self, n: usize) -> Self {
        self.splits = n;
        self
    }

    /// Sets the exploration rate.
    pub fn with_exploration_rate(mut self, rate: f64) -> Self {
        self.exploration_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_records == 0 {
            return Err("min_records must be at least 1".into());
        }
        if self.hidden_units == 0 {
            return Err("hidden_units must be at least 1".into());
        }
        if self.epochs == 0 {
            return Err("epochs must be at least 1".into());
        }
        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err("learning_rate must be positive and finite".into());
        }
        if self.splits == 0 {
            return Err("splits must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert!(MlConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_configs_rejected() {
        assert!(MlConfig::default().with_hidden_units(0).validate().is_err());
        assert!(MlConfig::default().with_epochs(0).validate().is_err());
        assert!(MlConfig::default().with_learning_rate(0.0).validate().is_err());
        assert!(MlConfig::default().with_splits(0).validate().is_err());
    }

    #[test]
    fn test_exploration_clamped() {
        let c = MlConfig::default().with_exploration_rate(1.4);
        assert!((c.exploration_rate - 1.0).abs() < 1e-12);
    }
}
