//! The shared evaluation model.
//!
//! [`evaluate`] is the single deterministic scoring function every search
//! strategy calls. It is pure: the same `(problem, schedule)` pair always
//! yields the same [`EvaluationResult`], which is what makes the DP
//! optimizer's value function well defined.
//!
//! The composite score decomposes additively over events plus a terminal
//! shortfall penalty:
//!
//! ```text
//! composite(schedule) = Σ event_score(e) − shortfall_penalty(totals)
//! ```
//!
//! The DP optimizer uses [`event_score`] as its per-step reward and the
//! shortfall penalty as its terminal cost, so its backward induction
//! optimizes exactly the quantity the other algorithms score whole
//! schedules with.
//!
//! Monte Carlo risk analysis re-enters through [`evaluate_with`] and a
//! [`Perturbation`], so perturbed trials exercise the identical code path
//! instead of a parallel approximate one.

use crate::model::{ApplicationEvent, CandidateSchedule, SchedulingProblem};

/// Weight of the per-nutrient total-mismatch penalty relative to the
/// normalized objective terms. Large enough that zeroing out requirements
/// always dominates any timing gain.
pub const PENALTY_WEIGHT: f64 = 2.0;

/// Precipitation (mm) treated as the saturation point of the runoff proxy.
const PRECIP_SCALE_MM: f64 = 25.0;

/// Deterministic multi-objective score of one schedule.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationResult {
    /// Yield potential in [0, 1]; higher is better. 1.0 means the full
    /// requirement was applied at peak growth-stage demand.
    pub yield_score: f64,
    /// Absolute cost (amount x price summed over events).
    pub cost: f64,
    /// Runoff/leaching exposure proxy; lower is better. Grows with the
    /// square of per-event rate and with forecast precipitation.
    pub environmental_score: f64,
    /// Weather-forecast risk; lower is better. Grows with lead time.
    pub risk_score: f64,
    /// Weighted combination, higher is better. Includes the soft
    /// constraint-violation penalty.
    pub composite_score: f64,
}

/// Input deviations for one Monte Carlo scenario.
///
/// `weather_delta` holds one precipitation deviation (mm) per horizon day;
/// events index it by their day. The neutral perturbation reproduces
/// [`evaluate`] exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbation {
    /// Per-day precipitation deviation in mm.
    pub weather_delta: Vec<f64>,
    /// Multiplier on the yield response (1.0 = as forecast).
    pub yield_factor: f64,
    /// Multiplier on nutrient prices (1.0 = as quoted).
    pub price_factor: f64,
}

impl Perturbation {
    /// The identity perturbation for a given horizon.
    pub fn neutral(horizon_days: u32) -> Self {
        Self {
            weather_delta: vec![0.0; horizon_days as usize],
            yield_factor: 1.0,
            price_factor: 1.0,
        }
    }
}

/// Per-event objective contributions.
struct EventTerms {
    yield_: f64,
    cost: f64,
    cost_norm: f64,
    env: f64,
    risk: f64,
}

fn event_terms(problem: &SchedulingProblem, event: &ApplicationEvent, pert: &Perturbation) -> EventTerms {
    let total = problem.total_required().max(1e-9);
    let frac = event.amount.max(0.0) / total;

    let demand = problem.growth.demand(event.day);
    let yield_ = frac * demand * pert.yield_factor;

    let cost = event.amount.max(0.0) * problem.price(event.nutrient) * pert.price_factor;
    let cost_norm = cost / reference_cost(problem);

    let forecast = problem.forecast(event.day);
    let delta = pert
        .weather_delta
        .get(event.day as usize)
        .copied()
        .unwrap_or(0.0);
    let precip_norm = ((forecast.precip_mm + delta).max(0.0) / PRECIP_SCALE_MM).clamp(0.0, 1.0);
    // Quadratic in rate: a single full-rate dump on a wet day is the worst
    // case, splitting the same total always reduces exposure.
    let env = frac * frac * (0.5 + 0.5 * precip_norm);

    let risk = frac * (1.0 - forecast.confidence.clamp(0.0, 1.0));

    EventTerms { yield_, cost, cost_norm, env, risk }
}

/// Cost of applying every requirement at quoted prices; the cost
/// normalization reference.
pub(crate) fn reference_cost(problem: &SchedulingProblem) -> f64 {
    let c: f64 = problem
        .nutrient_requirements
        .iter()
        .filter(|(_, &a)| a > 0.0)
        .map(|(&n, &a)| a * problem.price(n))
        .sum();
    c.max(1e-9)
}

/// Weighted per-event contribution to the composite score.
///
/// The DP optimizer's per-step reward. Deterministic and independent of
/// any other event in the schedule.
pub fn event_score(problem: &SchedulingProblem, event: &ApplicationEvent) -> f64 {
    let w = problem.weights.normalized();
    let pert = Perturbation {
        weather_delta: Vec::new(),
        yield_factor: 1.0,
        price_factor: 1.0,
    };
    let t = event_terms(problem, event, &pert);
    w.yield_ * t.yield_ - w.cost * t.cost_norm - w.environment * t.env - w.risk * t.risk
}

/// Soft penalty for per-nutrient totals that miss their requirements.
///
/// Proportional to the relative deviation so that stochastic searches keep
/// near-feasible individuals alive instead of rejecting them outright.
pub fn shortfall_penalty(problem: &SchedulingProblem, schedule: &CandidateSchedule) -> f64 {
    let mut penalty = 0.0;
    for (&n, &req) in &problem.nutrient_requirements {
        let dev = (schedule.total_for(n) - req).abs();
        penalty += dev / req.abs().max(1.0);
    }
    // Applying nutrients that were never required is penalized too.
    for (n, total) in schedule.totals() {
        if !problem.nutrient_requirements.contains_key(&n) {
            penalty += total / total.abs().max(1.0);
        }
    }
    PENALTY_WEIGHT * penalty
}

/// Scores a schedule against a problem. Pure and deterministic.
pub fn evaluate(problem: &SchedulingProblem, schedule: &CandidateSchedule) -> EvaluationResult {
    evaluate_with(problem, schedule, &Perturbation::neutral(problem.horizon_days))
}

/// Scores a schedule under a perturbed scenario.
///
/// The neutral perturbation reproduces [`evaluate`]; Monte Carlo trials
/// supply sampled deviations.
pub fn evaluate_with(
    problem: &SchedulingProblem,
    schedule: &CandidateSchedule,
    pert: &Perturbation,
) -> EvaluationResult {
    if schedule.is_empty() && problem.is_trivial() {
        return EvaluationResult::default();
    }

    let w = problem.weights.normalized();
    let mut result = EvaluationResult::default();
    let mut cost_norm = 0.0;

    for event in schedule.events() {
        let t = event_terms(problem, event, pert);
        result.yield_score += t.yield_;
        result.cost += t.cost;
        cost_norm += t.cost_norm;
        result.environmental_score += t.env;
        result.risk_score += t.risk;
    }

    result.composite_score = w.yield_ * result.yield_score
        - w.cost * cost_norm
        - w.environment * result.environmental_score
        - w.risk * result.risk_score
        - shortfall_penalty(problem, schedule);
    result
}
