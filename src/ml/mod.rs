//! Learned-model-guided optimizer.
//!
//! Trains a small feed-forward yield-response regressor on caller-supplied
//! [`HistoricalRecord`]s — fresh on every call, no cross-call persistence —
//! then constructs a schedule by greedy placement over the day grid,
//! scoring each candidate slot with the model. An epsilon-greedy
//! exploration step keeps the placement from collapsing to a local
//! optimum; full reinforcement learning is out of scope.
//!
//! [`HistoricalRecord`]: crate::model::HistoricalRecord

mod config;
mod features;
mod network;
mod runner;

pub use config::MlConfig;
pub use features::{FeatureScaler, FEATURE_DIM};
pub use network::YieldNet;
pub use runner::{MlResult, MlRunner};
