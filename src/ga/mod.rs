//! Genetic-algorithm optimizer.
//!
//! Population-based stochastic search over [`CandidateSchedule`]s
//! (chromosome = event sequence). Constraint violations are soft-penalized
//! by the shared evaluator rather than rejected, which preserves genetic
//! diversity; a repair step after crossover and mutation rescales amounts
//! so nutrient totals track the requirements.
//!
//! [`CandidateSchedule`]: crate::model::CandidateSchedule

mod config;
pub mod operators;
mod runner;

pub use config::GaConfig;
pub use runner::{GaResult, GaRunner};
