//! Pareto dominance machinery for the four scheduling objectives.
//!
//! Fast non-dominated sorting and crowding distance after Deb et al.
//! (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II",
//! specialized to the fixed four-axis objective vector used here.

use crate::eval::EvaluationResult;
use crate::model::CandidateSchedule;

/// `[-yield, cost_norm, env, risk]` — every axis minimized.
pub type ObjectiveVector = [f64; 4];

/// Whether `a` Pareto-dominates `b`: no worse on every axis, strictly
/// better on at least one.
pub fn dominates(a: &ObjectiveVector, b: &ObjectiveVector) -> bool {
    let mut strictly_better = false;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        if va > vb {
            return false;
        }
        if va < vb {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Result of non-dominated sorting.
#[derive(Debug, Clone)]
pub struct NondominatedSortResult {
    /// Pareto rank per solution; 0 is the front.
    pub ranks: Vec<usize>,
    /// Indices grouped by front: `fronts[0]` holds rank-0 indices.
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sorting, O(m n^2).
pub fn non_dominated_sort(objectives: &[ObjectiveVector]) -> NondominatedSortResult {
    let n = objectives.len();
    assert!(n > 0, "objectives must not be empty");

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut ranks = vec![0usize; n];
    let mut front_0 = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&objectives[i], &objectives[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates(&objectives[j], &objectives[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
        if domination_count[i] == 0 {
            ranks[i] = 0;
            front_0.push(i);
        }
    }

    let mut fronts = vec![front_0];
    loop {
        let current = fronts.last().expect("fronts starts with front_0");
        let mut next = Vec::new();
        for &i in current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    ranks[j] = fronts.len();
                    next.push(j);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        fronts.push(next);
    }

    NondominatedSortResult { ranks, fronts }
}

/// Crowding distance per solution; boundary solutions get infinity.
///
/// Normalized per-objective gap to the nearest neighbors, used to prefer
/// isolated solutions when truncating a front.
pub fn crowding_distance(objectives: &[ObjectiveVector]) -> Vec<f64> {
    let n = objectives.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let mut distances = vec![0.0f64; n];
    for axis in 0..4 {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            objectives[a][axis]
                .partial_cmp(&objectives[b][axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        distances[order[0]] = f64::INFINITY;
        distances[order[n - 1]] = f64::INFINITY;

        let range = objectives[order[n - 1]][axis] - objectives[order[0]][axis];
        if range > 0.0 {
            for i in 1..(n - 1) {
                let gap = objectives[order[i + 1]][axis] - objectives[order[i - 1]][axis];
                distances[order[i]] += gap / range;
            }
        }
    }
    distances
}

/// One schedule on the Pareto front.
#[derive(Debug, Clone)]
pub struct ParetoMember {
    pub schedule: CandidateSchedule,
    /// Standard evaluation of the schedule.
    pub evaluation: EvaluationResult,
    /// Minimized objective vector.
    pub objectives: ObjectiveVector,
    /// Crowding distance within the front.
    pub crowding: f64,
}

/// The set of mutually non-dominated schedules a multi-objective run
/// returns — distinct trade-offs, not a single answer.
#[derive(Debug, Clone, Default)]
pub struct ParetoFront {
    pub members: Vec<ParetoMember>,
}

impl ParetoFront {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Post-hoc preferred-solution extraction.
    ///
    /// Applies caller weights to pick one schedule from the front. This is
    /// deliberately separate from the search so the Pareto exploration is
    /// never collapsed prematurely.
    pub fn preferred(&self, weights: &crate::model::ObjectiveWeights) -> Option<&ParetoMember> {
        let w = weights.normalized();
        self.members.iter().max_by(|a, b| {
            let score = |m: &ParetoMember| {
                w.yield_ * -m.objectives[0]
                    - w.cost * m.objectives[1]
                    - w.environment * m.objectives[2]
                    - w.risk * m.objectives[3]
            };
            score(a).partial_cmp(&score(b)).unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(a: f64, b: f64) -> ObjectiveVector {
        [a, b, 0.0, 0.0]
    }

    #[test]
    fn test_dominance() {
        assert!(dominates(&v(1.0, 1.0), &v(2.0, 2.0)));
        assert!(dominates(&v(1.0, 2.0), &v(1.0, 3.0)));
        assert!(!dominates(&v(1.0, 3.0), &v(3.0, 1.0)));
        assert!(!dominates(&v(1.0, 1.0), &v(1.0, 1.0)), "equal vectors do not dominate");
    }

    #[test]
    fn test_sort_single() {
        let result = non_dominated_sort(&[v(1.0, 2.0)]);
        assert_eq!(result.ranks, vec![0]);
        assert_eq!(result.fronts.len(), 1);
    }

    #[test]
    fn test_sort_layers() {
        let objs = vec![
            v(1.0, 5.0), // front 0
            v(3.0, 3.0), // front 0
            v(5.0, 1.0), // front 0
            v(4.0, 4.0), // dominated by (3,3) -> front 1
            v(6.0, 6.0), // dominated by (4,4) too -> front 2
        ];
        let result = non_dominated_sort(&objs);
        assert_eq!(result.ranks, vec![0, 0, 0, 1, 2]);
        assert_eq!(result.fronts.len(), 3);
    }

    #[test]
    fn test_sort_identical_solutions_share_front() {
        let objs = vec![v(2.0, 2.0), v(2.0, 2.0), v(2.0, 2.0)];
        let result = non_dominated_sort(&objs);
        assert!(result.ranks.iter().all(|&r| r == 0));
    }

    #[test]
    fn test_crowding_boundaries_infinite() {
        let objs = vec![v(1.0, 5.0), v(3.0, 3.0), v(5.0, 1.0)];
        let d = crowding_distance(&objs);
        assert!(d[0].is_infinite());
        assert!(d[2].is_infinite());
        assert!(d[1].is_finite() && d[1] > 0.0);
    }

    #[test]
    fn test_crowding_even_spacing_equal() {
        let objs = vec![v(0.0, 4.0), v(1.0, 3.0), v(2.0, 2.0), v(3.0, 1.0), v(4.0, 0.0)];
        let d = crowding_distance(&objs);
        assert!((d[1] - d[2]).abs() < 1e-12);
        assert!((d[2] - d[3]).abs() < 1e-12);
    }

    #[test]
    fn test_crowding_zero_range_axis_safe() {
        let objs = vec![v(1.0, 5.0), v(2.0, 5.0), v(3.0, 5.0)];
        let d = crowding_distance(&objs);
        assert!(d[1].is_finite());
    }

    #[test]
    fn test_preferred_tracks_weights() {
        use crate::model::ObjectiveWeights;
        let member = |objs: ObjectiveVector| ParetoMember {
            schedule: CandidateSchedule::empty(),
            evaluation: EvaluationResult::default(),
            objectives: objs,
            crowding: 0.0,
        };
        let front = ParetoFront {
            members: vec![
                member([-0.9, 1.0, 0.1, 0.1]), // high yield, high cost
                member([-0.3, 0.2, 0.1, 0.1]), // low yield, low cost
            ],
        };

        let yield_heavy = ObjectiveWeights { yield_: 1.0, cost: 0.0, environment: 0.0, risk: 0.0 };
        assert_eq!(front.preferred(&yield_heavy).unwrap().objectives[0], -0.9);

        let cost_heavy = ObjectiveWeights { yield_: 0.1, cost: 1.0, environment: 0.0, risk: 0.0 };
        assert_eq!(front.preferred(&cost_heavy).unwrap().objectives[1], 0.2);
    }
}
