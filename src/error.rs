//! Error taxonomy for the optimizer core.
//!
//! Only conditions that prevent a search from running at all are errors.
//! A timeout returns the best-so-far schedule flagged `partial`, and an
//! infeasible problem returns a result flagged `infeasible` with
//! constraint diagnostics; neither goes through this module.

use thiserror::Error;

use crate::model::NutrientType;

/// A malformed [`SchedulingProblem`](crate::model::SchedulingProblem).
///
/// Surfaced immediately on entry; never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A nutrient requirement is negative or non-finite.
    #[error("requirement for {nutrient:?} is {amount}, must be finite and >= 0")]
    BadRequirement { nutrient: NutrientType, amount: f64 },

    /// No application methods were allowed.
    #[error("no application methods allowed")]
    NoMethods,

    /// The application window is contradictory.
    #[error("application window [{earliest}, {latest}] is empty or outside the {horizon}-day horizon")]
    BadWindow { earliest: u32, latest: u32, horizon: u32 },

    /// A restricted range is inverted.
    #[error("restricted range [{start}, {end}] is inverted")]
    BadRestrictedRange { start: u32, end: u32 },

    /// An objective weight is negative or non-finite.
    #[error("objective weight {name} is {value}, must be finite and >= 0")]
    BadWeight { name: &'static str, value: f64 },
}

/// Errors returned by the optimization entry points.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The problem failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The ML optimizer was requested without enough historical records.
    ///
    /// Callers must fall back to another algorithm; the optimizer never
    /// silently trains on a degenerate set.
    #[error("ML optimizer needs at least {required} historical records, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// The DP state space exceeds the configured bound.
    ///
    /// Raised before the value table is allocated, never after.
    #[error("DP state space of {states} states exceeds the configured bound of {max_states}")]
    ProblemTooLarge { states: u64, max_states: u64 },

    /// An algorithm configuration failed its own validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = OptimizeError::InsufficientData { required: 10, actual: 3 };
        assert!(e.to_string().contains("at least 10"));

        let e = OptimizeError::ProblemTooLarge { states: 5_000_000, max_states: 2_000_000 };
        assert!(e.to_string().contains("5000000"));

        let e = ValidationError::BadWindow { earliest: 30, latest: 10, horizon: 120 };
        assert!(e.to_string().contains("[30, 10]"));
    }

    #[test]
    fn test_validation_converts() {
        let v = ValidationError::NoMethods;
        let e: OptimizeError = v.into();
        assert!(matches!(e, OptimizeError::Validation(_)));
    }
}
