//! Multi-objective (NSGA-II) optimizer.
//!
//! Searches with the same chromosome and operators as the GA but keeps the
//! four objective axes separate — yield (maximized), cost, environmental
//! exposure, and risk (all minimized) — and returns the final Pareto front
//! instead of collapsing to a single schedule. Picking one schedule from
//! the front with caller weights is an explicit post-hoc step
//! ([`ParetoFront::preferred`]), never part of the search itself.

mod pareto;
mod runner;

pub use pareto::{
    crowding_distance, dominates, non_dominated_sort, NondominatedSortResult, ObjectiveVector,
    ParetoFront, ParetoMember,
};
pub use runner::{MoResult, MoRunner};

use crate::eval;
use crate::model::{CandidateSchedule, SchedulingProblem};

/// Objective vector of a schedule: `[-yield, cost_norm, env, risk]`,
/// all minimized.
pub fn objectives(problem: &SchedulingProblem, schedule: &CandidateSchedule) -> ObjectiveVector {
    let r = eval::evaluate(problem, schedule);
    // The shortfall penalty is charged against the yield axis. Solutions
    // that skip applications would otherwise win on cost/env/risk and
    // flood the front.
    let penalty = eval::shortfall_penalty(problem, schedule);
    [
        -(r.yield_score - penalty),
        r.cost / eval::reference_cost(problem),
        r.environmental_score,
        r.risk_score,
    ]
}
