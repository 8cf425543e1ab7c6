//! Exact dynamic-programming optimizer.
//!
//! Backward induction over a discretized state space
//! `(day, remaining levels per nutrient)`. Exact within the discretization,
//! but state count grows as `(levels + 1)^nutrients x horizon`, so the
//! runner rejects oversized problems with
//! [`ProblemTooLarge`](crate::error::OptimizeError::ProblemTooLarge) before
//! allocating anything. Recommended for at most 2 nutrients over at most a
//! 120-day horizon.

mod config;
mod runner;

pub use config::DpConfig;
pub use runner::{DpResult, DpRunner};
