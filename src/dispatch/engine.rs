//! Algorithm routing and the top-level facade.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::{Algorithm, AlgorithmChoice, OptimizationResult, SelectionContext};
use crate::dp::{DpConfig, DpRunner};
use crate::error::OptimizeError;
use crate::eval;
use crate::ga::{GaConfig, GaRunner};
use crate::ml::{MlConfig, MlRunner};
use crate::mo::{MoResult, MoRunner};
use crate::model::{CandidateSchedule, HistoricalRecord, SchedulingProblem};
use crate::uncertainty::{McConfig, MonteCarloAnalyzer, UncertaintyProfile, UncertaintyReport};

/// Historical record count above which the ML optimizer is trusted over
/// search.
const ML_HISTORY_THRESHOLD: usize = 50;
/// DP is exact but its table is exponential in nutrient count.
const DP_MAX_NUTRIENTS: usize = 2;
const DP_MAX_HORIZON_DAYS: u32 = 120;

/// Picks an algorithm from the problem shape. Pure; no I/O, no RNG.
///
/// Rich history routes to ML; small exact-solvable problems to DP; an
/// explicit trade-off preference to NSGA-II; everything else to the GA.
pub fn select_algorithm(ctx: &SelectionContext) -> Algorithm {
    if ctx.historical_records >= ML_HISTORY_THRESHOLD {
        Algorithm::Ml
    } else if ctx.nutrient_count <= DP_MAX_NUTRIENTS && ctx.horizon_days <= DP_MAX_HORIZON_DAYS {
        Algorithm::Dp
    } else if ctx.prefer_pareto {
        Algorithm::Mo
    } else {
        Algorithm::Ga
    }
}

/// Facade over the individual runners with shared configuration.
///
/// Holds one config per method; `optimize` routes per
/// [`select_algorithm`] (or runs the forced method) and normalizes the
/// output into [`OptimizationResult`]. Stateless between calls.
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    dp: DpConfig,
    ga: GaConfig,
    ml: MlConfig,
    mo: GaConfig,
    mc: McConfig,
    profile: UncertaintyProfile,
    prefer_pareto: bool,
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dp_config(mut self, config: DpConfig) -> Self {
        self.dp = config;
        self
    }

    pub fn with_ga_config(mut self, config: GaConfig) -> Self {
        self.ga = config;
        self
    }

    pub fn with_ml_config(mut self, config: MlConfig) -> Self {
        self.ml = config;
        self
    }

    pub fn with_mo_config(mut self, config: GaConfig) -> Self {
        self.mo = config;
        self
    }

    pub fn with_mc_config(mut self, config: McConfig) -> Self {
        self.mc = config;
        self
    }

    pub fn with_uncertainty_profile(mut self, profile: UncertaintyProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Prefer the NSGA-II front when auto-routing mid-size problems.
    pub fn with_prefer_pareto(mut self, prefer: bool) -> Self {
        self.prefer_pareto = prefer;
        self
    }

    /// Optimizes `problem`, routing per `choice`.
    ///
    /// `budget_ms` caps the wall clock of search-based methods; an
    /// expired budget flags the result partial rather than erroring.
    /// Infeasible problems return a flagged empty result, not an error.
    /// Forced ML and DP surface their precondition errors
    /// ([`OptimizeError::InsufficientData`] /
    /// [`OptimizeError::ProblemTooLarge`]); auto mode only routes there
    /// when the preconditions hold.
    pub fn optimize(
        &self,
        problem: &SchedulingProblem,
        choice: AlgorithmChoice,
        records: &[HistoricalRecord],
        budget_ms: Option<u64>,
    ) -> Result<OptimizationResult, OptimizeError> {
        self.optimize_with_cancel(problem, choice, records, budget_ms, None)
    }

    /// [`optimize`](Self::optimize) with a cancellation token for the
    /// search-based methods.
    pub fn optimize_with_cancel(
        &self,
        problem: &SchedulingProblem,
        choice: AlgorithmChoice,
        records: &[HistoricalRecord],
        budget_ms: Option<u64>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<OptimizationResult, OptimizeError> {
        problem.validate()?;

        let method = match choice {
            AlgorithmChoice::Forced(algorithm) => algorithm,
            AlgorithmChoice::Auto => {
                let ctx = SelectionContext::from_problem(problem, records.len(), self.prefer_pareto);
                let mut picked = select_algorithm(&ctx);
                // The shape rule can still exceed the table cap when levels
                // were raised; fall back to search instead of erroring.
                if picked == Algorithm::Dp && !DpRunner::fits(problem, &self.dp) {
                    picked = Algorithm::Ga;
                }
                picked
            }
        };
        tracing::info!(method = method.name(), field = %problem.field_id, "optimizing");

        let diagnostics = problem.infeasibility_diagnostics();
        if !diagnostics.is_empty() {
            let schedule = CandidateSchedule::empty();
            let evaluation = eval::evaluate(problem, &schedule);
            return Ok(OptimizationResult {
                schedule,
                evaluation,
                confidence_score: 0.0,
                method,
                recommendations: vec![
                    "No feasible application day exists; relax the application \
                     window or restricted ranges."
                        .into(),
                ],
                partial: false,
                infeasible: true,
                violations: diagnostics,
                seed: None,
            });
        }

        let mut result = match method {
            Algorithm::Dp => self.run_dp(problem)?,
            Algorithm::Ga => self.run_ga(problem, budget_ms, cancel)?,
            Algorithm::Ml => self.run_ml(problem, records)?,
            Algorithm::Mo => self.run_mo(problem, budget_ms, cancel)?,
        };
        result.violations = result.schedule.violations(problem);
        result.recommendations = recommendations(problem, &result.schedule);
        Ok(result)
    }

    /// Runs NSGA-II and returns the whole front for caller-side
    /// trade-off exploration.
    pub fn generate_pareto_front(
        &self,
        problem: &SchedulingProblem,
    ) -> Result<MoResult, OptimizeError> {
        MoRunner::run(problem, &self.mo)
    }

    /// Monte Carlo analysis of an existing schedule under the configured
    /// uncertainty profile.
    pub fn analyze_uncertainty(
        &self,
        problem: &SchedulingProblem,
        schedule: &CandidateSchedule,
    ) -> Result<UncertaintyReport, OptimizeError> {
        MonteCarloAnalyzer::analyze(problem, schedule, &self.profile, &self.mc)
    }

    fn run_dp(&self, problem: &SchedulingProblem) -> Result<OptimizationResult, OptimizeError> {
        let r = DpRunner::run(problem, &self.dp)?;
        Ok(OptimizationResult {
            schedule: r.schedule,
            evaluation: r.evaluation,
            // Exact over the discretized grid; only discretization error
            // remains.
            confidence_score: 0.95,
            method: Algorithm::Dp,
            recommendations: Vec::new(),
            partial: false,
            infeasible: false,
            violations: Vec::new(),
            seed: None,
        })
    }

    fn run_ga(
        &self,
        problem: &SchedulingProblem,
        budget_ms: Option<u64>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<OptimizationResult, OptimizeError> {
        let config = match budget_ms {
            Some(ms) => self.ga.clone().with_time_limit_ms(ms),
            None => self.ga.clone(),
        };
        let r = GaRunner::run_with_cancel(problem, &config, cancel)?;
        let partial = r.is_partial();
        Ok(OptimizationResult {
            schedule: r.best,
            evaluation: r.evaluation,
            confidence_score: if partial { 0.6 } else { 0.75 },
            method: Algorithm::Ga,
            recommendations: Vec::new(),
            partial,
            infeasible: false,
            violations: Vec::new(),
            seed: Some(r.seed),
        })
    }

    fn run_ml(
        &self,
        problem: &SchedulingProblem,
        records: &[HistoricalRecord],
    ) -> Result<OptimizationResult, OptimizeError> {
        let r = MlRunner::run(problem, records, &self.ml)?;
        // More history, more trust, saturating well short of the exact
        // methods.
        let confidence = (0.4 + r.records_used as f64 / 500.0).min(0.9);
        Ok(OptimizationResult {
            schedule: r.schedule,
            evaluation: r.evaluation,
            confidence_score: confidence,
            method: Algorithm::Ml,
            recommendations: Vec::new(),
            partial: false,
            infeasible: false,
            violations: Vec::new(),
            seed: Some(r.seed),
        })
    }

    fn run_mo(
        &self,
        problem: &SchedulingProblem,
        budget_ms: Option<u64>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<OptimizationResult, OptimizeError> {
        let config = match budget_ms {
            Some(ms) => self.mo.clone().with_time_limit_ms(ms),
            None => self.mo.clone(),
        };
        let r = MoRunner::run_with_cancel(problem, &config, cancel)?;
        let partial = r.is_partial();
        let (schedule, evaluation) = match r.front.preferred(&problem.weights) {
            Some(member) => (member.schedule.clone(), member.evaluation),
            None => {
                let s = CandidateSchedule::empty();
                let e = eval::evaluate(problem, &s);
                (s, e)
            }
        };
        Ok(OptimizationResult {
            schedule,
            evaluation,
            confidence_score: if partial { 0.55 } else { 0.7 },
            method: Algorithm::Mo,
            recommendations: Vec::new(),
            partial,
            infeasible: false,
            violations: Vec::new(),
            seed: Some(r.seed),
        })
    }
}

/// Per-event rate above which a split is suggested, units/acre.
const SPLIT_HINT_RATE: f64 = 80.0;
/// Forecast precipitation above which an application is flagged, mm.
const RAIN_HINT_MM: f64 = 12.0;

/// Agronomic hints derived from the final schedule. Advisory text only;
/// never affects scoring.
fn recommendations(problem: &SchedulingProblem, schedule: &CandidateSchedule) -> Vec<String> {
    let mut out = Vec::new();

    for event in schedule.events() {
        if event.amount > SPLIT_HINT_RATE {
            out.push(format!(
                "Day {}: {:.0} units of {:?} in one pass; splitting into \
                 smaller applications reduces runoff exposure.",
                event.day, event.amount, event.nutrient
            ));
        }
        let forecast = problem.forecast(event.day);
        if forecast.precip_mm > RAIN_HINT_MM {
            out.push(format!(
                "Day {}: {:.0} mm precipitation forecast; consider shifting \
                 the {:?} application to a drier window.",
                event.day, forecast.precip_mm, event.nutrient
            ));
        }
    }

    for (nutrient, required) in &problem.nutrient_requirements {
        let events = schedule
            .events()
            .iter()
            .filter(|e| e.nutrient == *nutrient)
            .count();
        if events == 1 && *required > SPLIT_HINT_RATE {
            out.push(format!(
                "{nutrient:?} is applied in a single pass; a split program \
                 tracks crop demand more closely."
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ApplicationEvent, ApplicationMethod, NutrientType, TOTAL_TOLERANCE,
    };

    fn corn() -> SchedulingProblem {
        SchedulingProblem::new("f1", "corn", 120)
            .with_requirement(NutrientType::Nitrogen, 150.0)
            .with_requirement(NutrientType::Phosphorus, 50.0)
            .with_methods(&[ApplicationMethod::Broadcast, ApplicationMethod::SideDress])
    }

    fn history(n: usize) -> Vec<HistoricalRecord> {
        (0..n)
            .map(|i| {
                HistoricalRecord::synthetic(
                    (i as u32 * 11) % 115,
                    NutrientType::Nitrogen,
                    40.0,
                    0.7 + 0.002 * (i % 50) as f64,
                )
            })
            .collect()
    }

    fn seeded() -> Optimizer {
        Optimizer::new()
            .with_ga_config(GaConfig::fast().with_seed(5))
            .with_mo_config(GaConfig::fast().with_seed(5))
            .with_ml_config(MlConfig::default().with_seed(5).with_epochs(40))
    }

    #[test]
    fn test_selection_rules() {
        let ctx = |n, h, records, pareto| SelectionContext {
            nutrient_count: n,
            horizon_days: h,
            historical_records: records,
            prefer_pareto: pareto,
        };
        assert_eq!(select_algorithm(&ctx(3, 200, 80, false)), Algorithm::Ml);
        assert_eq!(select_algorithm(&ctx(2, 120, 10, false)), Algorithm::Dp);
        assert_eq!(select_algorithm(&ctx(2, 121, 0, false)), Algorithm::Ga);
        assert_eq!(select_algorithm(&ctx(3, 100, 0, true)), Algorithm::Mo);
        assert_eq!(select_algorithm(&ctx(3, 100, 0, false)), Algorithm::Ga);
    }

    #[test]
    fn test_auto_routes_corn_to_dp() {
        let result = seeded()
            .optimize(&corn(), AlgorithmChoice::Auto, &[], None)
            .unwrap();
        assert_eq!(result.method, Algorithm::Dp);
        assert!(result.seed.is_none());
        assert!(result.confidence_score > 0.9);
    }

    #[test]
    fn test_auto_routes_rich_history_to_ml() {
        let result = seeded()
            .optimize(&corn(), AlgorithmChoice::Auto, &history(60), None)
            .unwrap();
        assert_eq!(result.method, Algorithm::Ml);
    }

    #[test]
    fn test_forced_ml_without_data_errors() {
        let result = seeded().optimize(
            &corn(),
            AlgorithmChoice::Forced(Algorithm::Ml),
            &history(3),
            None,
        );
        assert!(matches!(result, Err(OptimizeError::InsufficientData { .. })));
    }

    #[test]
    fn test_forced_dp_too_large_errors() {
        let p = SchedulingProblem::new("f", "corn", 300)
            .with_requirement(NutrientType::Nitrogen, 100.0)
            .with_requirement(NutrientType::Phosphorus, 50.0)
            .with_requirement(NutrientType::Potassium, 60.0);
        let optimizer = seeded().with_dp_config(DpConfig::default().with_levels(40));
        let result = optimizer.optimize(&p, AlgorithmChoice::Forced(Algorithm::Dp), &[], None);
        assert!(matches!(result, Err(OptimizeError::ProblemTooLarge { .. })));
    }

    #[test]
    fn test_infeasible_flagged_not_error() {
        let p = corn().with_restricted(0, 119);
        let result = seeded()
            .optimize(&p, AlgorithmChoice::Forced(Algorithm::Ga), &[], None)
            .unwrap();
        assert!(result.infeasible);
        assert!(result.schedule.is_empty());
        assert!(!result.violations.is_empty());
        assert_eq!(result.confidence_score, 0.0);
    }

    #[test]
    fn test_trivial_problem_scores_zero() {
        let p = SchedulingProblem::new("f", "corn", 0);
        let result = seeded()
            .optimize(&p, AlgorithmChoice::Auto, &[], None)
            .unwrap();
        assert!(result.schedule.is_empty());
        assert_eq!(result.composite_score(), 0.0);
        assert!(!result.infeasible);
    }

    #[test]
    fn test_forced_mo_returns_weighted_pick() {
        let p = corn();
        let result = seeded()
            .optimize(&p, AlgorithmChoice::Forced(Algorithm::Mo), &[], None)
            .unwrap();
        assert_eq!(result.method, Algorithm::Mo);
        assert!(result.schedule.totals_within_tolerance(&p, TOTAL_TOLERANCE));
    }

    #[test]
    fn test_recommendation_for_heavy_single_pass() {
        let p = corn();
        let schedule = CandidateSchedule::from_events(vec![
            ApplicationEvent {
                day: 20,
                nutrient: NutrientType::Nitrogen,
                amount: 150.0,
                method: ApplicationMethod::Broadcast,
            },
            ApplicationEvent {
                day: 30,
                nutrient: NutrientType::Phosphorus,
                amount: 50.0,
                method: ApplicationMethod::Broadcast,
            },
        ]);
        let hints = recommendations(&p, &schedule);
        assert!(hints.iter().any(|h| h.contains("single pass")));
        assert!(hints.iter().any(|h| h.contains("runoff")));
    }

    /// End-to-end corn scenario: DP and GA both hit the totals, and the
    /// exact method is at least as good as the search within tolerance.
    #[test]
    fn test_corn_scenario_dp_matches_or_beats_ga() {
        let p = corn();
        let optimizer = Optimizer::new()
            .with_ga_config(GaConfig::balanced().with_seed(42))
            .with_dp_config(DpConfig::default());

        let dp = optimizer
            .optimize(&p, AlgorithmChoice::Forced(Algorithm::Dp), &[], None)
            .unwrap();
        let ga = optimizer
            .optimize(&p, AlgorithmChoice::Forced(Algorithm::Ga), &[], None)
            .unwrap();

        assert!(dp.schedule.totals_within_tolerance(&p, TOTAL_TOLERANCE));
        assert!(ga.schedule.totals_within_tolerance(&p, TOTAL_TOLERANCE));
        assert!(
            dp.composite_score() >= ga.composite_score() - 0.05,
            "dp {} vs ga {}",
            dp.composite_score(),
            ga.composite_score()
        );
    }

    /// Single-nutrient short-horizon case: the exact method is at least
    /// as good as the search within tolerance, given an equal budget.
    #[test]
    fn test_single_nutrient_dp_matches_or_beats_ga() {
        let p = SchedulingProblem::new("f2", "wheat", 90)
            .with_requirement(NutrientType::Nitrogen, 120.0)
            .with_methods(&[ApplicationMethod::Broadcast, ApplicationMethod::SideDress]);
        let optimizer = Optimizer::new()
            .with_ga_config(GaConfig::balanced().with_seed(17))
            .with_dp_config(DpConfig::default());

        let dp = optimizer
            .optimize(&p, AlgorithmChoice::Forced(Algorithm::Dp), &[], None)
            .unwrap();
        let ga = optimizer
            .optimize(&p, AlgorithmChoice::Forced(Algorithm::Ga), &[], None)
            .unwrap();

        assert!(dp.schedule.totals_within_tolerance(&p, TOTAL_TOLERANCE));
        assert!(ga.schedule.totals_within_tolerance(&p, TOTAL_TOLERANCE));
        assert!(
            dp.composite_score() >= ga.composite_score() - 0.05,
            "dp {} vs ga {}",
            dp.composite_score(),
            ga.composite_score()
        );
    }
}
