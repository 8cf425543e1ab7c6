//! Algorithm selection and the unified optimization entry point.

mod engine;
mod types;

pub use engine::{select_algorithm, Optimizer};
pub use types::{Algorithm, AlgorithmChoice, OptimizationResult, SelectionContext};
