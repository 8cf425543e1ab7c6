//! Fertilizer application scheduling and optimization.
//!
//! Finds when, how much, and by what method to apply each nutrient over
//! a growing season, trading off expected yield, cost, environmental
//! exposure, and weather risk. Several optimization methods share one
//! problem model and one evaluator:
//!
//! - **Dynamic programming (`dp`)**: Exact backward induction over
//!   discretized remaining-nutrient levels; the reference answer for
//!   small problems.
//! - **Genetic algorithm (`ga`)**: Population search over full
//!   schedules; handles any problem size.
//! - **ML-guided (`ml`)**: Trains a small yield-response regressor on
//!   historical outcomes, then places applications greedily.
//! - **Multi-objective (`mo`)**: NSGA-II producing a Pareto front over
//!   yield, cost, environment, and risk instead of one weighted answer.
//! - **Uncertainty (`uncertainty`)**: Monte Carlo scoring under sampled
//!   weather/yield/price scenarios, sensitivity decomposition, and
//!   risk-averse re-optimization.
//! - **Dispatch (`dispatch`)**: Routes a request to the right method
//!   from the problem shape and normalizes the output.
//!
//! All stochastic components take an optional seed and are fully
//! reproducible; evaluation is pure and parallelizes without touching
//! the RNG stream.
//!
//! # Example
//!
//! ```
//! use fertisched::dispatch::{AlgorithmChoice, Optimizer};
//! use fertisched::model::{ApplicationMethod, NutrientType, SchedulingProblem};
//!
//! let problem = SchedulingProblem::new("field-12", "corn", 120)
//!     .with_requirement(NutrientType::Nitrogen, 150.0)
//!     .with_requirement(NutrientType::Phosphorus, 50.0)
//!     .with_methods(&[ApplicationMethod::Broadcast, ApplicationMethod::SideDress]);
//!
//! let result = Optimizer::new()
//!     .optimize(&problem, AlgorithmChoice::Auto, &[], None)
//!     .unwrap();
//! assert!(!result.schedule.is_empty());
//! ```

pub mod dispatch;
pub mod dp;
pub mod error;
pub mod eval;
pub mod ga;
pub mod ml;
pub mod mo;
pub mod model;
pub mod random;
pub mod uncertainty;

pub use dispatch::{Algorithm, AlgorithmChoice, OptimizationResult, Optimizer};
pub use error::{OptimizeError, ValidationError};
pub use model::{
    ApplicationEvent, ApplicationMethod, CandidateSchedule, HistoricalRecord, NutrientType,
    SchedulingProblem,
};
