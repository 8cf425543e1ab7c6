//! Genetic operators over schedule chromosomes.
//!
//! Shared by the single-objective GA and the NSGA-II optimizer: random
//! initialization, tournament selection, single-point crossover on the
//! event sequence, bounded mutation, and the repair step that rescales
//! amounts so per-nutrient totals match the requirements again.

use rand::Rng;

use crate::model::{ApplicationEvent, CandidateSchedule, SchedulingProblem};

/// Creates a random valid-by-construction schedule.
///
/// Each required nutrient is split across 1..=`max_splits` distinct
/// feasible days with random amounts rescaled to the exact requirement.
/// Returns an empty schedule when no feasible day exists.
pub fn random_schedule<R: Rng>(
    problem: &SchedulingProblem,
    max_splits: usize,
    rng: &mut R,
) -> CandidateSchedule {
    let feasible = problem.feasible_days();
    if feasible.is_empty() || problem.is_trivial() {
        return CandidateSchedule::empty();
    }

    let mut events = Vec::new();
    for nutrient in problem.active_nutrients() {
        let req = problem.nutrient_requirements[&nutrient];
        let splits = rng.random_range(1..=max_splits.min(feasible.len()).max(1));

        let mut weights: Vec<f64> = (0..splits).map(|_| rng.random_range(0.2..1.0)).collect();
        let sum: f64 = weights.iter().sum();
        for w in &mut weights {
            *w *= req / sum;
        }

        for &amount in &weights {
            let day = feasible[rng.random_range(0..feasible.len())];
            let method = problem.application_methods
                [rng.random_range(0..problem.application_methods.len())];
            events.push(ApplicationEvent { day, nutrient, amount, method });
        }
    }
    CandidateSchedule::from_events(events)
}

/// Tournament selection over precomputed fitness values (maximization).
///
/// Picks `k` random indices and returns the one with the highest fitness.
pub fn tournament_select<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> usize {
    assert!(!fitness.is_empty(), "cannot select from an empty population");
    let n = fitness.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let idx = rng.random_range(0..n);
        if fitness[idx] > fitness[best] {
            best = idx;
        }
    }
    best
}

/// Single-point crossover on the event sequences.
///
/// Children take a prefix from one parent and the suffix from the other;
/// both are repaired afterwards so nutrient totals match again.
pub fn crossover<R: Rng>(
    p1: &CandidateSchedule,
    p2: &CandidateSchedule,
    problem: &SchedulingProblem,
    rng: &mut R,
) -> (CandidateSchedule, CandidateSchedule) {
    let cut_max = p1.len().min(p2.len());
    if cut_max == 0 {
        return (p1.clone(), p2.clone());
    }
    let cut = rng.random_range(0..=cut_max);

    let mut c1: Vec<ApplicationEvent> = p1.events()[..cut].to_vec();
    c1.extend_from_slice(&p2.events()[cut..]);
    let mut c2: Vec<ApplicationEvent> = p2.events()[..cut].to_vec();
    c2.extend_from_slice(&p1.events()[cut..]);

    let mut c1 = CandidateSchedule::from_events(c1);
    let mut c2 = CandidateSchedule::from_events(c2);
    repair_totals(&mut c1, problem, rng);
    repair_totals(&mut c2, problem, rng);
    (c1, c2)
}

/// Mutates one event in place: either shifts its day to a nearby feasible
/// day (within two weeks) or perturbs its amount. Callers repair afterwards.
pub fn mutate<R: Rng>(schedule: &mut CandidateSchedule, problem: &SchedulingProblem, rng: &mut R) {
    if schedule.is_empty() {
        return;
    }
    let idx = rng.random_range(0..schedule.len());

    if rng.random_bool(0.5) {
        let current = schedule.events()[idx].day;
        let nearby: Vec<u32> = problem
            .feasible_days()
            .into_iter()
            .filter(|&d| d.abs_diff(current) <= 14 && d != current)
            .collect();
        if !nearby.is_empty() {
            schedule.events_mut()[idx].day = nearby[rng.random_range(0..nearby.len())];
            schedule.resort();
        }
    } else {
        let factor = rng.random_range(0.5..1.5);
        let e = &mut schedule.events_mut()[idx];
        e.amount = (e.amount * factor).max(0.0);
    }
}

/// Rescales event amounts so each nutrient's total matches its requirement.
///
/// A nutrient with a requirement but no events gets one injected at a
/// random feasible day; events for unrequired nutrients and zero-amount
/// events are removed.
pub fn repair_totals<R: Rng>(
    schedule: &mut CandidateSchedule,
    problem: &SchedulingProblem,
    rng: &mut R,
) {
    let feasible = problem.feasible_days();

    for nutrient in problem.active_nutrients() {
        let req = problem.nutrient_requirements[&nutrient];
        let total = schedule.total_for(nutrient);
        if total > 1e-12 {
            let factor = req / total;
            for e in schedule.events_mut() {
                if e.nutrient == nutrient {
                    e.amount *= factor;
                }
            }
        } else if !feasible.is_empty() {
            let day = feasible[rng.random_range(0..feasible.len())];
            let method = problem.application_methods
                [rng.random_range(0..problem.application_methods.len())];
            schedule.push(ApplicationEvent { day, nutrient, amount: req, method });
        }
    }

    schedule.events_mut().retain(|e| {
        e.amount > 1e-12
            && problem
                .nutrient_requirements
                .get(&e.nutrient)
                .is_some_and(|&req| req > 0.0)
    });
}
