//! NSGA-II loop execution.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;

use super::pareto::{crowding_distance, non_dominated_sort, ObjectiveVector, ParetoFront, ParetoMember};
use crate::error::OptimizeError;
use crate::eval;
use crate::ga::{operators, GaConfig};
use crate::model::{CandidateSchedule, SchedulingProblem};
use crate::random::{create_rng, resolve_seed};

/// Result of a multi-objective optimization run.
#[derive(Debug, Clone)]
pub struct MoResult {
    /// The final rank-0 front: mutually non-dominated schedules.
    pub front: ParetoFront,
    /// Generations actually executed.
    pub generations: usize,
    /// Whether the run was cancelled externally.
    pub cancelled: bool,
    /// Whether the wall-clock budget expired.
    pub timed_out: bool,
    /// The seed actually used.
    pub seed: u64,
}

impl MoResult {
    /// Whether the run ended before its configured generation count.
    pub fn is_partial(&self) -> bool {
        self.cancelled || self.timed_out
    }
}

/// NSGA-II search over schedule chromosomes.
///
/// Shares [`GaConfig`] and the GA's operators; only selection and
/// survivorship differ: parents win crowded tournaments (front rank, then
/// crowding distance), and the next generation is filled front by front
/// from the combined parent+offspring pool, truncating the last front by
/// crowding distance.
pub struct MoRunner;

impl MoRunner {
    /// Runs NSGA-II and returns the final Pareto front.
    pub fn run(problem: &SchedulingProblem, config: &GaConfig) -> Result<MoResult, OptimizeError> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs NSGA-II with an optional cancellation token, checked once per
    /// generation.
    pub fn run_with_cancel(
        problem: &SchedulingProblem,
        config: &GaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<MoResult, OptimizeError> {
        config.validate().map_err(OptimizeError::InvalidConfig)?;
        problem.validate()?;

        let seed = resolve_seed(config.seed);
        let mut rng = create_rng(seed);

        if problem.is_trivial() || problem.feasible_days().is_empty() {
            let schedule = CandidateSchedule::empty();
            let front = ParetoFront {
                members: vec![ParetoMember {
                    evaluation: eval::evaluate(problem, &schedule),
                    objectives: super::objectives(problem, &schedule),
                    schedule,
                    crowding: f64::INFINITY,
                }],
            };
            return Ok(MoResult { front, generations: 0, cancelled: false, timed_out: false, seed });
        }

        let started = Instant::now();

        let mut population: Vec<CandidateSchedule> = (0..config.population_size)
            .map(|_| operators::random_schedule(problem, config.max_initial_splits, &mut rng))
            .collect();
        let mut objectives = evaluate_objectives(problem, &population, config.parallel);

        let mut cancelled = false;
        let mut timed_out = false;
        let mut generations = 0usize;

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

            // Crowded tournament needs the current ranking.
            let sorted = non_dominated_sort(&objectives);
            let crowding = crowding_per_solution(&objectives, &sorted.fronts);

            let mut offspring = Vec::with_capacity(config.population_size);
            while offspring.len() < config.population_size {
                let p1 = crowded_tournament(&sorted.ranks, &crowding, config.tournament_size, &mut rng);
                let p2 = crowded_tournament(&sorted.ranks, &crowding, config.tournament_size, &mut rng);

                let (c1, c2) = if rng.random_range(0.0..1.0) < config.crossover_rate {
                    operators::crossover(&population[p1], &population[p2], problem, &mut rng)
                } else {
                    (population[p1].clone(), population[p2].clone())
                };

                for mut child in [c1, c2] {
                    if offspring.len() >= config.population_size {
                        break;
                    }
                    if rng.random_range(0.0..1.0) < config.mutation_rate {
                        operators::mutate(&mut child, problem, &mut rng);
                        operators::repair_totals(&mut child, problem, &mut rng);
                    }
                    offspring.push(child);
                }
            }

            // Elitist survivorship over the combined pool.
            let offspring_objs = evaluate_objectives(problem, &offspring, config.parallel);
            population.extend(offspring);
            objectives.extend(offspring_objs);

            let (next_pop, next_objs) = truncate_to(
                config.population_size,
                std::mem::take(&mut population),
                std::mem::take(&mut objectives),
            );
            population = next_pop;
            objectives = next_objs;
            generations += 1;
        }

        // Final front with crowding annotations.
        let sorted = non_dominated_sort(&objectives);
        let front_objs: Vec<ObjectiveVector> =
            sorted.fronts[0].iter().map(|&i| objectives[i]).collect();
        let front_crowding = crowding_distance(&front_objs);
        let members = sorted.fronts[0]
            .iter()
            .zip(front_crowding)
            .map(|(&i, crowding)| ParetoMember {
                schedule: population[i].clone(),
                evaluation: eval::evaluate(problem, &population[i]),
                objectives: objectives[i],
                crowding,
            })
            .collect();

        tracing::debug!(generations, front_size = sorted.fronts[0].len(), "NSGA-II run finished");

        Ok(MoResult { front: ParetoFront { members }, generations, cancelled, timed_out, seed })
    }
}

fn evaluate_objectives(
    problem: &SchedulingProblem,
    population: &[CandidateSchedule],
    parallel: bool,
) -> Vec<ObjectiveVector> {
    if parallel {
        population.par_iter().map(|s| super::objectives(problem, s)).collect()
    } else {
        population.iter().map(|s| super::objectives(problem, s)).collect()
    }
}

/// Crowding distances computed per front, indexed by solution.
fn crowding_per_solution(objectives: &[ObjectiveVector], fronts: &[Vec<usize>]) -> Vec<f64> {
    let mut crowding = vec![0.0f64; objectives.len()];
    for front in fronts {
        let objs: Vec<ObjectiveVector> = front.iter().map(|&i| objectives[i]).collect();
        for (&i, d) in front.iter().zip(crowding_distance(&objs)) {
            crowding[i] = d;
        }
    }
    crowding
}

/// Binary-style tournament over (rank, crowding): lower rank wins, ties
/// broken by larger crowding distance.
fn crowded_tournament<R: rand::Rng>(
    ranks: &[usize],
    crowding: &[f64],
    k: usize,
    rng: &mut R,
) -> usize {
    let n = ranks.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        let better = ranks[idx] < ranks[best]
            || (ranks[idx] == ranks[best] && crowding[idx] > crowding[best]);
        if better {
            best = idx;
        }
    }
    best
}

/// NSGA-II survivorship: fill front by front, truncate the last admitted
/// front by descending crowding distance.
fn truncate_to(
    target: usize,
    population: Vec<CandidateSchedule>,
    objectives: Vec<ObjectiveVector>,
) -> (Vec<CandidateSchedule>, Vec<ObjectiveVector>) {
    let sorted = non_dominated_sort(&objectives);
    let mut keep: Vec<usize> = Vec::with_capacity(target);

    for front in &sorted.fronts {
        if keep.len() + front.len() <= target {
            keep.extend_from_slice(front);
        } else {
            let objs: Vec<ObjectiveVector> = front.iter().map(|&i| objectives[i]).collect();
            let crowding = crowding_distance(&objs);
            let mut order: Vec<usize> = (0..front.len()).collect();
            order.sort_by(|&a, &b| {
                crowding[b].partial_cmp(&crowding[a]).unwrap_or(std::cmp::Ordering::Equal)
            });
            keep.extend(order.into_iter().take(target - keep.len()).map(|i| front[i]));
            break;
        }
    }

    let pop = keep.iter().map(|&i| population[i].clone()).collect();
    let objs = keep.iter().map(|&i| objectives[i]).collect();
    (pop, objs)
}
