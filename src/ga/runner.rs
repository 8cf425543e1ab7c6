//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the complete evolutionary process:
//! initialization -> evaluation -> selection -> crossover -> repair ->
//! mutation -> repeat.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;

use super::config::GaConfig;
use super::operators;
use crate::error::OptimizeError;
use crate::eval::{self, EvaluationResult};
use crate::model::{CandidateSchedule, SchedulingProblem};
use crate::random::{create_rng, resolve_seed};

/// Result of a GA optimization run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// The best schedule found during the entire run.
    pub best: CandidateSchedule,
    /// Standard (unperturbed) evaluation of `best`.
    pub evaluation: EvaluationResult,
    /// Fitness of the best schedule under the objective searched
    /// (equals `evaluation.composite_score` unless a custom objective
    /// was supplied).
    pub best_fitness: f64,
    /// Generations actually executed.
    pub generations: usize,
    /// Whether the run stopped on the stagnation limit.
    pub stagnated: bool,
    /// Whether the run was cancelled externally.
    pub cancelled: bool,
    /// Whether the wall-clock budget expired.
    pub timed_out: bool,
    /// Best fitness at the end of each generation (index 0 = initial
    /// population), for convergence diagnostics.
    pub fitness_history: Vec<f64>,
    /// The seed actually used.
    pub seed: u64,
}

impl GaResult {
    /// Whether the run ended before its configured generation count.
    pub fn is_partial(&self) -> bool {
        self.cancelled || self.timed_out
    }
}

/// Executes the GA evolutionary loop (maximizing the composite score).
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA against the shared evaluation model.
    pub fn run(problem: &SchedulingProblem, config: &GaConfig) -> Result<GaResult, OptimizeError> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs the GA with an optional cancellation token, checked once per
    /// generation. Cancellation returns the best-so-far schedule.
    pub fn run_with_cancel(
        problem: &SchedulingProblem,
        config: &GaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GaResult, OptimizeError> {
        let objective =
            |p: &SchedulingProblem, s: &CandidateSchedule| eval::evaluate(p, s).composite_score;
        Self::run_with_objective(problem, config, &objective, cancel)
    }

    /// Runs the GA against a caller-supplied objective (maximized).
    ///
    /// The robust re-optimization path uses this to search under a
    /// risk-adjusted objective while reporting the standard evaluation.
    pub fn run_with_objective<F>(
        problem: &SchedulingProblem,
        config: &GaConfig,
        objective: &F,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GaResult, OptimizeError>
    where
        F: Fn(&SchedulingProblem, &CandidateSchedule) -> f64 + Sync,
    {
        config.validate().map_err(OptimizeError::InvalidConfig)?;
        problem.validate()?;

        let seed = resolve_seed(config.seed);
        let mut rng = create_rng(seed);

        if problem.is_trivial() || problem.feasible_days().is_empty() {
            let best = CandidateSchedule::empty();
            let evaluation = eval::evaluate(problem, &best);
            let best_fitness = objective(problem, &best);
            return Ok(GaResult {
                best,
                evaluation,
                best_fitness,
                generations: 0,
                stagnated: false,
                cancelled: false,
                timed_out: false,
                fitness_history: Vec::new(),
                seed,
            });
        }

        let started = Instant::now();

        // 1. Initialize and evaluate.
        let mut population: Vec<CandidateSchedule> = (0..config.population_size)
            .map(|_| operators::random_schedule(problem, config.max_initial_splits, &mut rng))
            .collect();
        let mut fitness = evaluate_population(problem, &population, objective, config.parallel);

        let mut best_idx = argmax(&fitness);
        let mut best = population[best_idx].clone();
        let mut best_fitness = fitness[best_idx];
        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(best_fitness);

        let mut stagnation_counter = 0usize;
        let mut stagnated = false;
        let mut cancelled = false;
        let mut timed_out = false;
        let mut generations = 0usize;

        // 2. Evolutionary loop.
        for _ in 0..config.max_generations {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if let Some(ms) = config.time_limit_ms {
                if started.elapsed().as_millis() as u64 >= ms {
                    timed_out = true;
                    break;
                }
            }

            // Elites are carried over unchanged.
            let mut order: Vec<usize> = (0..population.len()).collect();
            order.sort_by(|&a, &b| {
                fitness[b].partial_cmp(&fitness[a]).unwrap_or(std::cmp::Ordering::Equal)
            });
            let mut next_gen: Vec<CandidateSchedule> = order[..config.elite_count]
                .iter()
                .map(|&i| population[i].clone())
                .collect();

            while next_gen.len() < config.population_size {
                let p1 = operators::tournament_select(&fitness, config.tournament_size, &mut rng);
                let p2 = operators::tournament_select(&fitness, config.tournament_size, &mut rng);

                let (c1, c2) = if rng.random_range(0.0..1.0) < config.crossover_rate {
                    operators::crossover(&population[p1], &population[p2], problem, &mut rng)
                } else {
                    (population[p1].clone(), population[p2].clone())
                };

                for mut child in [c1, c2] {
                    if next_gen.len() >= config.population_size {
                        break;
                    }
                    if rng.random_range(0.0..1.0) < config.mutation_rate {
                        operators::mutate(&mut child, problem, &mut rng);
                        operators::repair_totals(&mut child, problem, &mut rng);
                    }
                    next_gen.push(child);
                }
            }

            population = next_gen;
            fitness = evaluate_population(problem, &population, objective, config.parallel);
            generations += 1;

            best_idx = argmax(&fitness);
            if fitness[best_idx] > best_fitness {
                best = population[best_idx].clone();
                best_fitness = fitness[best_idx];
                stagnation_counter = 0;
            } else {
                stagnation_counter += 1;
            }
            fitness_history.push(best_fitness);

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                stagnated = true;
                break;
            }
        }

        let evaluation = eval::evaluate(problem, &best);
        tracing::debug!(
            generations,
            best_fitness,
            stagnated,
            cancelled,
            timed_out,
            "GA run finished"
        );

        Ok(GaResult {
            best,
            evaluation,
            best_fitness,
            generations,
            stagnated,
            cancelled,
            timed_out,
            fitness_history,
            seed,
        })
    }
}

fn evaluate_population<F>(
    problem: &SchedulingProblem,
    population: &[CandidateSchedule],
    objective: &F,
    parallel: bool,
) -> Vec<f64>
where
    F: Fn(&SchedulingProblem, &CandidateSchedule) -> f64 + Sync,
{
    if parallel {
        population.par_iter().map(|s| objective(problem, s)).collect()
    } else {
        population.iter().map(|s| objective(problem, s)).collect()
    }
}

fn argmax(fitness: &[f64]) -> usize {
    let mut best = 0;
    for (i, &f) in fitness.iter().enumerate() {
        if f > fitness[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ApplicationMethod, NutrientType, TOTAL_TOLERANCE};

    fn corn() -> SchedulingProblem {
        SchedulingProblem::new("f1", "corn", 120)
            .with_requirement(NutrientType::Nitrogen, 150.0)
            .with_requirement(NutrientType::Phosphorus, 50.0)
            .with_methods(&[ApplicationMethod::Broadcast, ApplicationMethod::SideDress])
    }

    fn quick() -> GaConfig {
        GaConfig::default()
            .with_population_size(40)
            .with_max_generations(60)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_totals_within_tolerance() {
        let p = corn();
        let result = GaRunner::run(&p, &quick()).unwrap();
        assert!(result.best.totals_within_tolerance(&p, TOTAL_TOLERANCE));
    }

    #[test]
    fn test_events_respect_constraints() {
        let p = corn().with_window(10, 110).with_restricted(40, 55);
        let result = GaRunner::run(&p, &quick()).unwrap();
        for e in result.best.events() {
            assert!(p.is_feasible_day(e.day));
            assert!(e.amount >= 0.0);
        }
    }

    #[test]
    fn test_seeded_runs_identical() {
        let p = corn();
        let a = GaRunner::run(&p, &quick()).unwrap();
        let b = GaRunner::run(&p, &quick()).unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.fitness_history, b.fitness_history);
    }

    #[test]
    fn test_elitism_makes_history_monotone() {
        let result = GaRunner::run(&corn(), &quick()).unwrap();
        for w in result.fitness_history.windows(2) {
            assert!(w[1] >= w[0], "best fitness regressed: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn test_stagnation_stops_early() {
        let config = quick().with_max_generations(5_000).with_stagnation_limit(10);
        let result = GaRunner::run(&corn(), &config).unwrap();
        assert!(result.stagnated || result.generations < 5_000);
    }

    #[test]
    fn test_cancellation_returns_best_so_far() {
        let config = quick().with_max_generations(100_000).with_stagnation_limit(0);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            flag.store(true, Ordering::Relaxed);
        });
        let result = GaRunner::run_with_cancel(&corn(), &config, Some(cancel)).unwrap();
        assert!(result.cancelled);
        assert!(result.is_partial());
        assert!(!result.best.is_empty());
    }

    #[test]
    fn test_time_budget_flags_partial() {
        let config = quick()
            .with_max_generations(1_000_000)
            .with_stagnation_limit(0)
            .with_time_limit_ms(30);
        let result = GaRunner::run(&corn(), &config).unwrap();
        assert!(result.timed_out);
        assert!(result.is_partial());
        assert!(result.generations < 1_000_000);
    }

    #[test]
    fn test_trivial_problem_returns_empty() {
        let p = SchedulingProblem::new("f", "corn", 0);
        let result = GaRunner::run(&p, &quick()).unwrap();
        assert!(result.best.is_empty());
        assert_eq!(result.evaluation.composite_score, 0.0);
        assert_eq!(result.generations, 0);
    }

    #[test]
    fn test_infeasible_problem_returns_empty_not_error() {
        let p = corn().with_restricted(0, 119);
        let result = GaRunner::run(&p, &quick()).unwrap();
        assert!(result.best.is_empty());
        assert!(result.evaluation.composite_score < 0.0, "shortfall penalty expected");
    }

    #[test]
    fn test_custom_objective_drives_search() {
        // Objective rewarding fewer events should produce a more compact
        // schedule than the default objective.
        let p = corn();
        let compact = |pr: &SchedulingProblem, s: &CandidateSchedule| {
            eval::evaluate(pr, s).composite_score - 0.05 * s.len() as f64
        };
        let result = GaRunner::run_with_objective(&p, &quick(), &compact, None).unwrap();
        assert!(result.best.len() <= 4);
        assert!(result.best.totals_within_tolerance(&p, TOTAL_TOLERANCE));
    }

    #[test]
    fn test_converges_to_reasonable_quality() {
        let result = GaRunner::run(&corn(), &quick()).unwrap();
        // Requirements met -> no shortfall penalty; composite should be
        // solidly positive territory for this easy problem.
        assert!(
            result.evaluation.composite_score > -0.5,
            "composite {} unexpectedly poor",
            result.evaluation.composite_score
        );
    }
}
