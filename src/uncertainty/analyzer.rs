//! Monte Carlo scoring, sensitivity decomposition, and robust search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use super::config::{McConfig, UncertaintyProfile, UncertaintySource};
use super::report::{ConfidenceBand, SensitivityReport, UncertaintyReport};
use crate::error::OptimizeError;
use crate::eval::{self, Perturbation};
use crate::ga::{GaConfig, GaResult, GaRunner};
use crate::model::{CandidateSchedule, SchedulingProblem};
use crate::random::{create_rng, resolve_seed};

/// Result of robust re-optimization under sampled scenarios.
#[derive(Debug, Clone)]
pub struct RobustResult {
    /// The underlying search outcome; `search.best` is the robust schedule.
    pub search: GaResult,
    /// Monte Carlo report for the robust schedule, at full trial count.
    pub report: UncertaintyReport,
}

/// Trials evaluated between cancellation checks.
const TRIAL_BATCH: usize = 128;

/// Samples scenario perturbations and summarizes score distributions.
pub struct MonteCarloAnalyzer;

impl MonteCarloAnalyzer {
    /// Scores `schedule` across `config.trials` sampled scenarios.
    pub fn analyze(
        problem: &SchedulingProblem,
        schedule: &CandidateSchedule,
        profile: &UncertaintyProfile,
        config: &McConfig,
    ) -> Result<UncertaintyReport, OptimizeError> {
        Self::analyze_with_cancel(problem, schedule, profile, config, None)
    }

    /// Like [`analyze`](Self::analyze), but checks `cancel` between trial
    /// batches. A cancelled run summarizes the trials completed so far
    /// (at least one batch); `report.trials` reflects the actual count.
    pub fn analyze_with_cancel(
        problem: &SchedulingProblem,
        schedule: &CandidateSchedule,
        profile: &UncertaintyProfile,
        config: &McConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<UncertaintyReport, OptimizeError> {
        profile.validate().map_err(OptimizeError::InvalidConfig)?;
        config.validate().map_err(OptimizeError::InvalidConfig)?;
        problem.validate()?;

        let seed = resolve_seed(config.seed);
        let mut rng = create_rng(seed);
        let scenarios = Self::sample_scenarios(problem, profile, config.trials, &mut rng);

        // Evaluation is pure, so each batch parallelizes without
        // affecting the sampled stream.
        let mut samples: Vec<f64> = Vec::with_capacity(scenarios.len());
        for batch in scenarios.chunks(TRIAL_BATCH) {
            samples.par_extend(
                batch
                    .par_iter()
                    .map(|pert| eval::evaluate_with(problem, schedule, pert).composite_score),
            );
            if let Some(flag) = &cancel {
                if flag.load(Ordering::Relaxed) {
                    tracing::debug!(completed = samples.len(), "monte carlo cancelled");
                    break;
                }
            }
        }
        samples.sort_by(|a, b| a.total_cmp(b));

        let deterministic = eval::evaluate(problem, schedule).composite_score;
        let report = Self::summarize(&samples, deterministic, config, seed);
        tracing::info!(
            mean = report.mean,
            std_dev = report.std_dev,
            cvar = report.conditional_value_at_risk,
            trials = report.trials,
            "monte carlo analysis complete"
        );
        Ok(report)
    }

    /// Re-runs the analysis once per uncertainty source, others held at
    /// zero, with the same seed so all runs see the same normal draws.
    pub fn sensitivity(
        problem: &SchedulingProblem,
        schedule: &CandidateSchedule,
        profile: &UncertaintyProfile,
        config: &McConfig,
    ) -> Result<SensitivityReport, OptimizeError> {
        let seed = resolve_seed(config.seed);
        let seeded = config.clone().with_seed(seed);

        let mut contributions = Vec::with_capacity(UncertaintySource::ALL.len());
        for source in UncertaintySource::ALL {
            let report =
                Self::analyze(problem, schedule, &profile.only(source), &seeded)?;
            contributions.push((source, report.std_dev));
        }

        let total: f64 = contributions.iter().map(|(_, c)| c).sum();
        let shares = contributions
            .iter()
            .map(|&(s, c)| (s, if total > 0.0 { c / total } else { 0.0 }))
            .collect();
        let dominant = contributions
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s)
            .unwrap_or(UncertaintySource::Weather);

        Ok(SensitivityReport { contributions, shares, dominant })
    }

    /// Searches for a schedule that trades expected score against tail
    /// outcomes.
    ///
    /// A small scenario set is sampled once up front and held fixed for
    /// every candidate (common random numbers), so fitness differences
    /// between candidates reflect the schedules rather than the noise.
    /// The objective maximized is
    /// `(1 - risk_aversion) * mean + risk_aversion * tail_mean`, where
    /// `tail_mean` averages the worst 20% of scenario scores.
    pub fn robust_optimize(
        problem: &SchedulingProblem,
        profile: &UncertaintyProfile,
        config: &McConfig,
        ga_config: &GaConfig,
    ) -> Result<RobustResult, OptimizeError> {
        profile.validate().map_err(OptimizeError::InvalidConfig)?;
        config.validate().map_err(OptimizeError::InvalidConfig)?;

        let seed = resolve_seed(config.seed);
        let mut rng = create_rng(seed);
        let scenarios =
            Self::sample_scenarios(problem, profile, config.robust_scenarios, &mut rng);
        let lambda = config.risk_aversion;
        let tail_len = ((scenarios.len() as f64 * 0.2).ceil() as usize).max(1);

        let objective = |p: &SchedulingProblem, s: &CandidateSchedule| {
            let mut scores: Vec<f64> = scenarios
                .iter()
                .map(|pert| eval::evaluate_with(p, s, pert).composite_score)
                .collect();
            scores.sort_by(|a, b| a.total_cmp(b));
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            let tail_mean = scores[..tail_len].iter().sum::<f64>() / tail_len as f64;
            (1.0 - lambda) * mean + lambda * tail_mean
        };

        let search = GaRunner::run_with_objective(problem, ga_config, &objective, None)?;
        let report = Self::analyze(
            problem,
            &search.best,
            profile,
            &config.clone().with_seed(seed),
        )?;
        Ok(RobustResult { search, report })
    }

    fn sample_scenarios(
        problem: &SchedulingProblem,
        profile: &UncertaintyProfile,
        count: usize,
        rng: &mut ChaCha8Rng,
    ) -> Vec<Perturbation> {
        let horizon = problem.horizon_days as usize;
        let fh = profile.forecast_horizon_days as f64;
        (0..count)
            .map(|_| {
                let weather_delta = (0..horizon)
                    .map(|d| {
                        let sigma = profile.weather_std_mm * ((d as f64 + 1.0) / fh).min(3.0);
                        let z: f64 = rng.sample(StandardNormal);
                        sigma * z
                    })
                    .collect();
                let zy: f64 = rng.sample(StandardNormal);
                let zp: f64 = rng.sample(StandardNormal);
                Perturbation {
                    weather_delta,
                    yield_factor: (1.0 + profile.yield_std * zy).max(0.0),
                    price_factor: (1.0 + profile.price_std * zp).max(0.0),
                }
            })
            .collect()
    }

    fn summarize(
        sorted: &[f64],
        deterministic: f64,
        config: &McConfig,
        seed: u64,
    ) -> UncertaintyReport {
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std_dev =
            (sorted.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64).sqrt();

        let mut levels = vec![0.80, 0.90];
        if !levels.iter().any(|l| (l - config.confidence_level).abs() < 1e-9) {
            levels.push(config.confidence_level);
        }
        levels.sort_by(|a, b| a.total_cmp(b));
        let bands = levels
            .into_iter()
            .map(|level| {
                let alpha = (1.0 - level) / 2.0;
                ConfidenceBand {
                    level,
                    lower: quantile(sorted, alpha),
                    upper: quantile(sorted, 1.0 - alpha),
                }
            })
            .collect();

        let value_at_risk = quantile(sorted, config.tail_fraction);
        let tail_len = ((n as f64 * config.tail_fraction).ceil() as usize).clamp(1, n);
        let conditional_value_at_risk =
            sorted[..tail_len].iter().sum::<f64>() / tail_len as f64;
        let downside_risk = sorted
            .iter()
            .map(|&s| (s - deterministic).min(0.0).powi(2))
            .sum::<f64>()
            / n as f64;

        UncertaintyReport {
            deterministic_score: deterministic,
            mean,
            std_dev,
            bands,
            value_at_risk,
            conditional_value_at_risk,
            downside_risk,
            trials: n,
            seed,
        }
    }
}

/// Empirical quantile with linear interpolation between order statistics.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
