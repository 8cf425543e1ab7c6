//! Monte Carlo uncertainty quantification.
//!
//! Samples weather, yield-response, and price scenarios around a fixed
//! schedule and summarizes the resulting score distribution, decomposes
//! the spread by source, and optionally re-optimizes against the
//! sampled scenarios for a risk-averse schedule.

mod analyzer;
mod config;
mod report;

pub use analyzer::{MonteCarloAnalyzer, RobustResult};
pub use config::{McConfig, UncertaintyProfile, UncertaintySource};
pub use report::{ConfidenceBand, SensitivityReport, UncertaintyReport};
