//! Weighted statistics and reform loss metrics

pub mod weighted;
mod loss;

pub use loss::{baseline_poverty_gaps, loss_metrics, LossMetrics, Objective, Population};
pub use weighted::{gini, pct_change, top_share, weighted_mean, weighted_quantile, weighted_sum};
