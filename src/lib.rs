//! UBI Reform - budget-neutral basic income scenarios over UK household microdata
//!
//! This library provides:
//! - Household microdata loading and validation
//! - Basic income calculation and budget-neutral calibration of the adult amount
//! - Loss metrics (loser share, poverty gaps, Gini) against the baseline
//! - Distributional tables by income decile and region
//! - Batch scenario runs and grid search over UBI amounts

pub mod error;
pub mod config;
pub mod household;
pub mod reform;
pub mod metrics;
pub mod distribution;
pub mod scenario;
pub mod optimise;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use config::PipelineConfig;
pub use household::{Dataset, Household, Region};
pub use reform::{set_ubi, solve_adult_amount, BudgetSolution, ReformTable, UbiParameters};
pub use metrics::{loss_metrics, LossMetrics, Objective, Population};
pub use scenario::{ReformVariant, ScenarioRunner};
