//! Model training and greedy schedule construction.

use rand::Rng;

use super::config::MlConfig;
use super::features::FeatureScaler;
use super::network::YieldNet;
use crate::error::OptimizeError;
use crate::eval::{self, EvaluationResult};
use crate::model::{
    ApplicationEvent, ApplicationMethod, CandidateSchedule, HistoricalRecord, NutrientType,
    SchedulingProblem,
};
use crate::random::{create_rng, resolve_seed};

/// Result of an ML-guided optimization run.
#[derive(Debug, Clone)]
pub struct MlResult {
    pub schedule: CandidateSchedule,
    /// Standard evaluation of the schedule via the shared model.
    pub evaluation: EvaluationResult,
    /// Mean squared error over the final training epoch (normalized
    /// target space); a rough convergence indicator.
    pub training_loss: f64,
    /// Number of historical records trained on.
    pub records_used: usize,
    /// The seed actually used.
    pub seed: u64,
}

/// Trains a fresh yield-response model and places applications greedily.
pub struct MlRunner;

impl MlRunner {
    /// Runs the ML-guided optimizer.
    ///
    /// Fails with [`OptimizeError::InsufficientData`] when fewer than
    /// `config.min_records` historical records are supplied — a degenerate
    /// model is never silently trained.
    pub fn run(
        problem: &SchedulingProblem,
        records: &[HistoricalRecord],
        config: &MlConfig,
    ) -> Result<MlResult, OptimizeError> {
        config.validate().map_err(OptimizeError::InvalidConfig)?;
        problem.validate()?;

        if records.len() < config.min_records {
            return Err(OptimizeError::InsufficientData {
                required: config.min_records,
                actual: records.len(),
            });
        }

        let seed = resolve_seed(config.seed);
        let mut rng = create_rng(seed);

        if problem.is_trivial() || problem.feasible_days().is_empty() {
            let schedule = CandidateSchedule::empty();
            let evaluation = eval::evaluate(problem, &schedule);
            return Ok(MlResult {
                schedule,
                evaluation,
                training_loss: 0.0,
                records_used: records.len(),
                seed,
            });
        }

        // 1. Train the regressor on normalized yield outcomes.
        let scaler = FeatureScaler::fit(records);
        let xs: Vec<Vec<f64>> = records
            .iter()
            .map(|r| scaler.record_features(r, problem.horizon_days).to_vec())
            .collect();
        let y_mean = records.iter().map(|r| r.yield_outcome).sum::<f64>() / records.len() as f64;
        let y_std = (records
            .iter()
            .map(|r| (r.yield_outcome - y_mean).powi(2))
            .sum::<f64>()
            / records.len() as f64)
            .sqrt()
            .max(1e-6);
        let ys: Vec<f64> = records.iter().map(|r| (r.yield_outcome - y_mean) / y_std).collect();

        let mut net = YieldNet::new(xs[0].len(), config.hidden_units, &mut rng);
        let training_loss = net.train(&xs, &ys, config.epochs, config.learning_rate, &mut rng);
        tracing::debug!(training_loss, records = records.len(), "yield-response model trained");

        // 2. Greedy placement over the day grid.
        let schedule = Self::place(problem, &net, &scaler, config, &mut rng);
        let evaluation = eval::evaluate(problem, &schedule);

        Ok(MlResult { schedule, evaluation, training_loss, records_used: records.len(), seed })
    }

    /// Places `splits` equal applications per nutrient, each on the
    /// highest-value free slot according to the model; with probability
    /// `exploration_rate` a random feasible slot is taken instead.
    fn place<R: Rng>(
        problem: &SchedulingProblem,
        net: &YieldNet,
        scaler: &FeatureScaler,
        config: &MlConfig,
        rng: &mut R,
    ) -> CandidateSchedule {
        let feasible = problem.feasible_days();
        let mut events = Vec::new();

        for nutrient in problem.active_nutrients() {
            let req = problem.nutrient_requirements[&nutrient];
            let splits = config.splits.min(feasible.len()).max(1);
            let amount = req / splits as f64;
            let mut used_days: Vec<u32> = Vec::new();

            for _ in 0..splits {
                let candidates: Vec<(u32, ApplicationMethod)> = feasible
                    .iter()
                    .filter(|d| !used_days.contains(d))
                    .flat_map(|&d| problem.application_methods.iter().map(move |&m| (d, m)))
                    .collect();
                if candidates.is_empty() {
                    break;
                }

                let explore = rng.random_range(0.0..1.0) < config.exploration_rate;
                let (day, method) = if explore {
                    candidates[rng.random_range(0..candidates.len())]
                } else {
                    Self::best_slot(problem, net, scaler, nutrient, &candidates)
                };

                used_days.push(day);
                events.push(ApplicationEvent { day, nutrient, amount, method });
            }
        }
        CandidateSchedule::from_events(events)
    }

    /// Argmax over candidate slots, with a deterministic day/method
    /// tie-break so seeded runs are reproducible.
    fn best_slot(
        problem: &SchedulingProblem,
        net: &YieldNet,
        scaler: &FeatureScaler,
        nutrient: NutrientType,
        candidates: &[(u32, ApplicationMethod)],
    ) -> (u32, ApplicationMethod) {
        let mut best = candidates[0];
        let mut best_value = f64::NEG_INFINITY;
        for &(day, method) in candidates {
            let x = scaler.candidate_features(problem, day, nutrient, method);
            let value = net.predict(&x);
            if value > best_value {
                best_value = value;
                best = (day, method);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TOTAL_TOLERANCE;

    fn corn() -> SchedulingProblem {
        SchedulingProblem::new("f1", "corn", 120)
            .with_requirement(NutrientType::Nitrogen, 150.0)
            .with_requirement(NutrientType::Phosphorus, 50.0)
            .with_methods(&[ApplicationMethod::Broadcast, ApplicationMethod::SideDress])
    }

    /// Records where mid-season nitrogen clearly outperformed.
    fn history(n: usize) -> Vec<HistoricalRecord> {
        (0..n)
            .map(|i| {
                let day = (i as u32 * 7) % 115;
                let mid = (40..=80).contains(&day);
                let mut r = HistoricalRecord::synthetic(
                    day,
                    if i % 3 == 0 { NutrientType::Phosphorus } else { NutrientType::Nitrogen },
                    50.0,
                    if mid { 0.9 } else { 0.5 },
                );
                r.growth_stage = corn().growth.stage(day).code();
                r
            })
            .collect()
    }

    #[test]
    fn test_insufficient_data_raises() {
        let result = MlRunner::run(&corn(), &history(9), &MlConfig::default());
        match result {
            Err(OptimizeError::InsufficientData { required, actual }) => {
                assert_eq!(required, 10);
                assert_eq!(actual, 9);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    fn schedule_ok(result: &MlResult, p: &SchedulingProblem) -> bool {
        result.schedule.totals_within_tolerance(p, TOTAL_TOLERANCE)
            && result.schedule.events().iter().all(|e| p.is_feasible_day(e.day))
    }

    #[test]
    fn test_totals_match_requirements() {
        let p = corn();
        let config = MlConfig::default().with_seed(42).with_epochs(60);
        let result = MlRunner::run(&p, &history(60), &config).unwrap();
        assert!(schedule_ok(&result, &p));
    }

    #[test]
    fn test_seeded_runs_identical() {
        let p = corn();
        let config = MlConfig::default().with_seed(7).with_epochs(40);
        let a = MlRunner::run(&p, &history(60), &config).unwrap();
        let b = MlRunner::run(&p, &history(60), &config).unwrap();
        assert_eq!(a.schedule, b.schedule);
    }

    #[test]
    fn test_records_never_mutated() {
        let records = history(60);
        let before = records.clone();
        let config = MlConfig::default().with_seed(1).with_epochs(30);
        MlRunner::run(&corn(), &records, &config).unwrap();
        assert_eq!(records, before);
    }

    #[test]
    fn test_trivial_problem_empty_schedule() {
        let p = SchedulingProblem::new("f", "corn", 0);
        let config = MlConfig::default().with_seed(1).with_epochs(10);
        let result = MlRunner::run(&p, &history(20), &config).unwrap();
        assert!(result.schedule.is_empty());
        assert_eq!(result.evaluation.composite_score, 0.0);
    }

    #[test]
    fn test_exploration_zero_is_fully_greedy() {
        let p = corn();
        let config = MlConfig::default()
            .with_seed(5)
            .with_epochs(40)
            .with_exploration_rate(0.0);
        let a = MlRunner::run(&p, &history(60), &config).unwrap();
        let b = MlRunner::run(&p, &history(60), &config.clone().with_seed(99)).unwrap();
        // With no exploration, placement depends only on the trained model;
        // different seeds can still differ via weight init, but the run must
        // at least produce a complete schedule.
        assert!(schedule_ok(&a, &p));
        assert!(schedule_ok(&b, &p));
    }

    #[test]
    fn test_one_application_per_day_per_nutrient() {
        let p = corn();
        let config = MlConfig::default().with_seed(13).with_epochs(40);
        let result = MlRunner::run(&p, &history(60), &config).unwrap();
        for nutrient in p.active_nutrients() {
            let mut days: Vec<u32> = result
                .schedule
                .events()
                .iter()
                .filter(|e| e.nutrient == nutrient)
                .map(|e| e.day)
                .collect();
            let before = days.len();
            days.dedup();
            assert_eq!(days.len(), before, "{nutrient:?} placed twice on one day");
        }
    }
}
