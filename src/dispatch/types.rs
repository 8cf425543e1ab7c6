//! Dispatcher inputs and the unified result type.

use crate::eval::EvaluationResult;
use crate::model::{CandidateSchedule, SchedulingProblem};

/// The optimization method that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    /// Exact dynamic programming over discretized nutrient levels.
    Dp,
    /// Genetic algorithm on the full schedule space.
    Ga,
    /// ML-guided greedy placement from historical outcomes.
    Ml,
    /// NSGA-II multi-objective search (weighted pick from the front).
    Mo,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Dp => "dynamic-programming",
            Algorithm::Ga => "genetic-algorithm",
            Algorithm::Ml => "ml-guided",
            Algorithm::Mo => "multi-objective",
        }
    }
}

/// Caller's routing preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgorithmChoice {
    /// Route by problem shape and data availability.
    #[default]
    Auto,
    /// Run exactly this algorithm; its preconditions become hard errors.
    Forced(Algorithm),
}

/// The routing-relevant shape of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionContext {
    pub nutrient_count: usize,
    pub horizon_days: u32,
    pub historical_records: usize,
    /// Caller wants trade-off exploration rather than a single answer.
    pub prefer_pareto: bool,
}

impl SelectionContext {
    pub fn from_problem(
        problem: &SchedulingProblem,
        historical_records: usize,
        prefer_pareto: bool,
    ) -> Self {
        Self {
            nutrient_count: problem.active_nutrients().len(),
            horizon_days: problem.horizon_days,
            historical_records,
            prefer_pareto,
        }
    }
}

/// Unified output of [`Optimizer::optimize`](super::Optimizer::optimize),
/// whichever method ran.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub schedule: CandidateSchedule,
    pub evaluation: EvaluationResult,
    /// Heuristic trust in the result, in [0, 1]. Exact methods score
    /// higher than stochastic ones; partial runs are discounted.
    pub confidence_score: f64,
    pub method: Algorithm,
    /// Human-readable agronomic hints derived from the schedule.
    pub recommendations: Vec<String>,
    /// True when a budget or cancellation stopped the search early.
    pub partial: bool,
    /// True when the requirements cannot be met on the feasible days.
    pub infeasible: bool,
    /// Constraint diagnostics for infeasible or violating schedules.
    pub violations: Vec<String>,
    /// Seed used by stochastic methods; `None` for DP.
    pub seed: Option<u64>,
}

impl OptimizationResult {
    pub fn composite_score(&self) -> f64 {
        self.evaluation.composite_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NutrientType;

    #[test]
    fn test_selection_context_from_problem() {
        let p = SchedulingProblem::new("f", "corn", 90)
            .with_requirement(NutrientType::Nitrogen, 100.0)
            .with_requirement(NutrientType::Potassium, 40.0);
        let ctx = SelectionContext::from_problem(&p, 12, false);
        assert_eq!(ctx.nutrient_count, 2);
        assert_eq!(ctx.horizon_days, 90);
        assert_eq!(ctx.historical_records, 12);
    }

    #[test]
    fn test_algorithm_names_distinct() {
        let names = [Algorithm::Dp, Algorithm::Ga, Algorithm::Ml, Algorithm::Mo]
            .map(Algorithm::name);
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
