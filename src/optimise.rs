//! Grid search for UBI amounts that minimise a loss metric
//!
//! Each candidate fixes the senior, child and disability amounts; the adult
//! amount is then solved for budget neutrality and the resulting reform is
//! scored.

use crate::error::{Error, Result};
use crate::household::Dataset;
use crate::metrics::{loss_metrics, LossMetrics, Objective, Population};
use crate::reform::{set_ubi, UbiParameters};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Largest number of amounts a single range may expand to
pub const MAX_RANGE_VALUES: usize = 100_000;

/// Inclusive range of weekly amounts to try
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl AmountRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// A single fixed amount
    pub fn fixed(amount: f64) -> Self {
        Self { min: amount, max: amount, step: 1.0 }
    }

    /// Amounts from min to max inclusive
    pub fn values(&self) -> Result<Vec<f64>> {
        if !(self.min.is_finite() && self.max.is_finite() && self.step.is_finite()) {
            return Err(Error::InvalidRange(format!(
                "{}:{}:{} is not finite",
                self.min, self.max, self.step
            )));
        }
        if self.step <= 0.0 || self.max < self.min {
            return Ok(vec![self.min]);
        }
        let steps = ((self.max - self.min) / self.step + 1e-9).floor();
        let count = (steps as usize)
            .checked_add(1)
            .filter(|&n| steps < MAX_RANGE_VALUES as f64 && n <= MAX_RANGE_VALUES)
            .ok_or_else(|| {
                Error::InvalidRange(format!(
                    "{}:{}:{} expands to more than {} amounts",
                    self.min, self.max, self.step, MAX_RANGE_VALUES
                ))
            })?;
        Ok((0..count).map(|i| self.min + i as f64 * self.step).collect())
    }
}

/// Search space and objective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearch {
    pub senior: AmountRange,
    pub child: AmountRange,
    pub dis_base: AmountRange,
    /// Amounts held fixed across candidates (disability tiers, regions)
    pub base: UbiParameters,
    pub objective: Objective,
    pub population: Population,
}

/// One scored candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Amounts including the solved adult amount
    pub params: UbiParameters,
    pub metrics: LossMetrics,
    pub score: f64,
}

/// Evaluated candidates, best first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub objective: Objective,
    pub evaluated: usize,
    /// Candidates discarded because the adult amount came out negative
    pub infeasible: usize,
    pub candidates: Vec<Candidate>,
}

impl SearchResult {
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

impl GridSearch {
    /// Every parameter set on the grid (adult amount still unsolved)
    pub fn grid(&self) -> Result<Vec<UbiParameters>> {
        let (seniors, children, dis_bases) =
            (self.senior.values()?, self.child.values()?, self.dis_base.values()?);
        let mut grid = Vec::new();
        for &senior in &seniors {
            for &child in &children {
                for &dis_base in &dis_bases {
                    let mut params = self.base.with_senior(senior).with_child(child);
                    params.dis_base = dis_base;
                    grid.push(params);
                }
            }
        }
        Ok(grid)
    }

    /// Score every grid point in parallel
    pub fn run(&self, dataset: &Dataset) -> Result<SearchResult> {
        let grid = self.grid()?;
        log::info!("Evaluating {} candidates against {:?}", grid.len(), self.objective);

        let scored: Vec<Option<Candidate>> = grid
            .par_iter()
            .map(|params| self.evaluate(dataset, params))
            .collect::<Result<_>>()?;

        let evaluated = scored.len();
        let mut candidates: Vec<Candidate> = scored.into_iter().flatten().collect();
        let infeasible = evaluated - candidates.len();
        if candidates.is_empty() {
            return Err(Error::NoFeasibleCandidate);
        }

        candidates.sort_by(|a, b| a.score.total_cmp(&b.score));

        if infeasible > 0 {
            log::warn!("{} of {} candidates exceed the budget before adults", infeasible, evaluated);
        }

        Ok(SearchResult {
            objective: self.objective,
            evaluated,
            infeasible,
            candidates,
        })
    }

    /// Solve and score one grid point; None when the adult amount is negative
    fn evaluate(&self, dataset: &Dataset, params: &UbiParameters) -> Result<Option<Candidate>> {
        let (solution, table) = set_ubi(dataset, params)?;
        if !solution.is_feasible() {
            return Ok(None);
        }
        let metrics = loss_metrics(dataset, &table, self.population)?;
        Ok(Some(Candidate {
            params: table.params,
            score: metrics.get(self.objective),
            metrics,
        }))
    }
}
