//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the evolutionary loop.
//! The NSGA-II optimizer reuses it for its shared operator settings.

/// Configuration for the genetic algorithm.
///
/// # Defaults
///
/// ```
/// use fertisched::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_generations, 200);
/// assert_eq!(config.tournament_size, 3);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use fertisched::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_population_size(200)
///     .with_tournament_size(5)
///     .with_mutation_rate(0.2)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone)]
pub struct GaConfig {
    /// Number of individuals in the population.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Tournament size for parent selection. Higher values increase
    /// selection pressure; 3 is a moderate default.
    pub tournament_size: usize,

    /// Probability of recombining a parent pair (0.0-1.0).
    pub crossover_rate: f64,

    /// Probability of mutating an offspring (0.0-1.0).
    pub mutation_rate: f64,

    /// Number of top individuals copied unchanged each generation.
    pub elite_count: usize,

    /// Generations without improvement before early termination.
    /// 0 disables stagnation-based stopping.
    pub stagnation_limit: usize,

    /// Maximum number of application events to seed per nutrient when
    /// creating random individuals.
    pub max_initial_splits: usize,

    /// Whether to evaluate the population in parallel with rayon.
    ///
    /// Evaluation is pure, so this never perturbs the RNG stream: seeded
    /// runs stay reproducible either way.
    pub parallel: bool,

    /// Random seed. `None` draws one and logs it.
    pub seed: Option<u64>,

    /// Optional wall-clock budget in milliseconds, checked once per
    /// generation. Exceeding it returns the best-so-far schedule flagged
    /// as partial, never an error.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 200,
            tournament_size: 3,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elite_count: 5,
            stagnation_limit: 30,
            max_initial_splits: 4,
            parallel: true,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k.max(1);
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the elite count.
    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    /// Sets the stagnation limit (0 to disable).
    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the wall-clock budget in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Preset for quick feasibility checks: small population, few
    /// generations, 5-second budget.
    pub fn fast() -> Self {
        Self {
            population_size: 50,
            max_generations: 80,
            stagnation_limit: 15,
            time_limit_ms: Some(5_000),
            ..Self::default()
        }
    }

    /// Preset balancing quality and runtime (the default shape with a
    /// 30-second budget).
    pub fn balanced() -> Self {
        Self { time_limit_ms: Some(30_000), ..Self::default() }
    }

    /// Preset maximizing schedule quality: large population, long run.
    pub fn quality() -> Self {
        Self {
            population_size: 200,
            max_generations: 400,
            stagnation_limit: 60,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.elite_count >= self.population_size {
            return Err("elite_count must be smaller than population_size".into());
        }
        if self.tournament_size == 0 {
            return Err("tournament_size must be at least 1".into());
        }
        if self.max_initial_splits == 0 {
            return Err("max_initial_splits must be at least 1".into());
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        Ok(())
    }
}
