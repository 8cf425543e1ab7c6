//! Shared data representation for all optimization strategies.
//!
//! [`SchedulingProblem`] is the immutable per-call input; every search
//! algorithm reads it and produces [`CandidateSchedule`]s. Historical
//! outcome records feed only the ML optimizer.

mod history;
mod problem;
mod schedule;

pub use history::HistoricalRecord;
pub use problem::{
    ApplicationMethod, DailyForecast, GrowthCurve, GrowthStage, NutrientType, ObjectiveWeights,
    SchedulingProblem,
};
pub use schedule::{ApplicationEvent, CandidateSchedule, TOTAL_TOLERANCE};
