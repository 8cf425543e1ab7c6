//! Schedules and their constituent application events.

use std::collections::BTreeMap;

use super::problem::{ApplicationMethod, NutrientType, SchedulingProblem};

/// Default tolerance for per-nutrient total matching, in units/acre.
pub const TOTAL_TOLERANCE: f64 = 0.01;

/// One discrete fertilizer application.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApplicationEvent {
    /// Day offset from planting.
    pub day: u32,
    /// Which nutrient is applied.
    pub nutrient: NutrientType,
    /// Amount in units/acre. Always >= 0.
    pub amount: f64,
    /// How it is applied.
    pub method: ApplicationMethod,
}

/// An ordered sequence of application events — the solution representation
/// shared by every optimization strategy.
///
/// Events are kept sorted by day. Constraint violations (nutrient totals
/// off target, events on restricted days) are never silently dropped:
/// they are reported by [`violations`](Self::violations) and soft-penalized
/// by the evaluator, which is what keeps infeasible intermediate solutions
/// alive inside the stochastic searches.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateSchedule {
    events: Vec<ApplicationEvent>,
}

impl CandidateSchedule {
    /// An empty schedule (the correct answer for trivial problems).
    pub fn empty() -> Self {
        Self { events: Vec::new() }
    }

    /// Builds a schedule from events, sorting them by day.
    pub fn from_events(mut events: Vec<ApplicationEvent>) -> Self {
        events.sort_by(|a, b| {
            a.day
                .cmp(&b.day)
                .then(a.nutrient.index().cmp(&b.nutrient.index()))
                .then(a.method.index().cmp(&b.method.index()))
        });
        Self { events }
    }

    /// Adds an event, keeping day order.
    pub fn push(&mut self, event: ApplicationEvent) {
        let pos = self.events.partition_point(|e| e.day <= event.day);
        self.events.insert(pos, event);
    }

    pub fn events(&self) -> &[ApplicationEvent] {
        &self.events
    }

    /// Mutable access for in-place operators (mutation, repair).
    /// Callers must re-sort via [`resort`](Self::resort) if days changed.
    pub fn events_mut(&mut self) -> &mut Vec<ApplicationEvent> {
        &mut self.events
    }

    /// Restores day ordering after in-place edits.
    pub fn resort(&mut self) {
        let events = std::mem::take(&mut self.events);
        *self = Self::from_events(events);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total applied amount per nutrient.
    pub fn totals(&self) -> BTreeMap<NutrientType, f64> {
        let mut totals = BTreeMap::new();
        for e in &self.events {
            *totals.entry(e.nutrient).or_insert(0.0) += e.amount;
        }
        totals
    }

    /// Total applied amount for one nutrient.
    pub fn total_for(&self, nutrient: NutrientType) -> f64 {
        self.events
            .iter()
            .filter(|e| e.nutrient == nutrient)
            .map(|e| e.amount)
            .sum()
    }

    /// Whether every per-nutrient total matches its requirement within `tol`.
    pub fn totals_within_tolerance(&self, problem: &SchedulingProblem, tol: f64) -> bool {
        problem
            .nutrient_requirements
            .iter()
            .all(|(&n, &req)| (self.total_for(n) - req).abs() <= tol)
    }

    /// Constraint-violation diagnostics against a problem.
    ///
    /// Covers negative amounts, out-of-window and restricted-day events,
    /// and per-nutrient total mismatches beyond [`TOTAL_TOLERANCE`].
    pub fn violations(&self, problem: &SchedulingProblem) -> Vec<String> {
        let mut out = Vec::new();
        for e in &self.events {
            if e.amount < 0.0 {
                out.push(format!("negative amount {} for {:?} on day {}", e.amount, e.nutrient, e.day));
            }
            if !problem.is_feasible_day(e.day) {
                out.push(format!("{:?} application on infeasible day {}", e.nutrient, e.day));
            }
        }
        for (&n, &req) in &problem.nutrient_requirements {
            let total = self.total_for(n);
            if (total - req).abs() > TOTAL_TOLERANCE {
                out.push(format!("{n:?} total {total:.3} does not match requirement {req:.3}"));
            }
        }
        out
    }
}
