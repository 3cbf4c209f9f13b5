//! Loss metrics of a reform against the baseline
//!
//! Used both to report on a reform and as objectives when searching for
//! UBI amounts.

use super::weighted::{gini, weighted_sum};
use crate::error::{Error, Result};
use crate::household::{Dataset, Household};
use crate::reform::ReformTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subpopulation whose members are counted when weighting households
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Population {
    /// Everyone in the household
    #[default]
    Everyone,
    Children,
    Seniors,
    WorkingAgeAdults,
    /// Members claiming a disability benefit
    Disabled,
}

impl Population {
    /// Members of this population in a household
    pub fn count(&self, household: &Household) -> u32 {
        match self {
            Population::Everyone => household.people,
            Population::Children => household.children,
            Population::Seniors => household.seniors,
            Population::WorkingAgeAdults => household.working_age_adults,
            Population::Disabled => household.disabled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Population::Everyone => "everyone",
            Population::Children => "children",
            Population::Seniors => "seniors",
            Population::WorkingAgeAdults => "working_age_adults",
            Population::Disabled => "disabled",
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Population {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "everyone" => Ok(Population::Everyone),
            "children" => Ok(Population::Children),
            "seniors" => Ok(Population::Seniors),
            "working_age_adults" => Ok(Population::WorkingAgeAdults),
            "disabled" => Ok(Population::Disabled),
            other => Err(format!("Unknown population: {}", other)),
        }
    }
}

/// A single loss metric, for minimisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    LoserShare,
    Losses,
    MeanPctLoss,
    MeanPctLossPwd2,
    PovertyGapBhc,
    PovertyGapAhc,
    Gini,
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "loser_share" => Ok(Objective::LoserShare),
            "losses" => Ok(Objective::Losses),
            "mean_pct_loss" => Ok(Objective::MeanPctLoss),
            "mean_pct_loss_pwd2" => Ok(Objective::MeanPctLossPwd2),
            "poverty_gap_bhc" => Ok(Objective::PovertyGapBhc),
            "poverty_gap_ahc" => Ok(Objective::PovertyGapAhc),
            "gini" => Ok(Objective::Gini),
            other => Err(format!("Unknown objective: {}", other)),
        }
    }
}

/// Loss metrics of one reform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossMetrics {
    /// Share of the population in households that lose income
    pub loser_share: f64,
    /// Total yearly losses among losers, in pounds
    pub losses: f64,
    /// Mean percentage loss, counting zero for non-losers
    pub mean_pct_loss: f64,
    /// Mean percentage loss with double weight for disabled households
    pub mean_pct_loss_pwd2: f64,
    /// Yearly poverty gap before housing costs
    pub poverty_gap_bhc: f64,
    /// Yearly poverty gap after housing costs
    pub poverty_gap_ahc: f64,
    /// Gini index of per-person household net income under the reform
    pub gini: f64,
}

impl LossMetrics {
    /// Value of one metric
    pub fn get(&self, objective: Objective) -> f64 {
        match objective {
            Objective::LoserShare => self.loser_share,
            Objective::Losses => self.losses,
            Objective::MeanPctLoss => self.mean_pct_loss,
            Objective::MeanPctLossPwd2 => self.mean_pct_loss_pwd2,
            Objective::PovertyGapBhc => self.poverty_gap_bhc,
            Objective::PovertyGapAhc => self.poverty_gap_ahc,
            Objective::Gini => self.gini,
        }
    }
}

/// Compute every loss metric of a reform against the dataset's baseline
pub fn loss_metrics(
    dataset: &Dataset,
    reform: &ReformTable,
    population: Population,
) -> Result<LossMetrics> {
    let households = dataset.households();
    let rows = &reform.rows;

    let weight: Vec<f64> = households
        .iter()
        .map(|h| h.weight * population.count(h) as f64)
        .collect();
    let total_pop: f64 = weight.iter().sum();
    if total_pop <= 0.0 {
        return Err(Error::EmptyPopulation(population.to_string()));
    }

    let mut losers = 0.0;
    let mut losses = 0.0;
    let mut total_pct_loss = 0.0;
    let mut total_pct_loss_pwd2 = 0.0;
    let mut total_pop_pwd2 = 0.0;
    let mut poverty_gap_bhc = 0.0;
    let mut poverty_gap_ahc = 0.0;
    let mut skipped = 0usize;

    for ((h, r), &w) in households.iter().zip(rows).zip(&weight) {
        let loss = (h.net_income - r.net_income).max(0.0);
        let pwd2_weight = if h.is_disabled() { 2.0 * w } else { w };

        if loss > 0.0 {
            losers += w;
        }
        losses += w * loss;
        total_pop_pwd2 += pwd2_weight;

        let pct_loss = loss / h.net_income;
        if pct_loss.is_finite() {
            total_pct_loss += w * pct_loss;
            total_pct_loss_pwd2 += pwd2_weight * pct_loss;
        } else {
            skipped += 1;
        }

        poverty_gap_bhc += h.weight * (h.poverty_line_bhc - r.net_income).max(0.0);
        poverty_gap_ahc += h.weight * (h.poverty_line_ahc - r.net_income_ahc).max(0.0);
    }

    if skipped > 0 {
        log::warn!("{} households have no finite percentage loss", skipped);
    }

    let income_per_person: Vec<f64> = households
        .iter()
        .zip(rows)
        .map(|(h, r)| r.net_income / h.people as f64)
        .collect();

    Ok(LossMetrics {
        loser_share: losers / total_pop,
        losses,
        mean_pct_loss: total_pct_loss / total_pop,
        mean_pct_loss_pwd2: total_pct_loss_pwd2 / total_pop_pwd2,
        poverty_gap_bhc,
        poverty_gap_ahc,
        gini: gini(&income_per_person, &weight),
    })
}

/// Baseline poverty gaps, for comparison with a reform's
pub fn baseline_poverty_gaps(dataset: &Dataset) -> (f64, f64) {
    let households = dataset.households();
    let weights: Vec<f64> = households.iter().map(|h| h.weight).collect();
    let bhc: Vec<f64> = households
        .iter()
        .map(|h| (h.poverty_line_bhc - h.net_income).max(0.0))
        .collect();
    let ahc: Vec<f64> = households
        .iter()
        .map(|h| (h.poverty_line_ahc - h.net_income_ahc).max(0.0))
        .collect();
    (weighted_sum(&bhc, &weights), weighted_sum(&ahc, &weights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::household::{fixtures, Region};
    use crate::reform::{apply_ubi, UbiParameters};
    use approx::assert_relative_eq;

    /// Two households: one loses 2,000 (10%), one gains
    fn dataset() -> Dataset {
        let mut loser = fixtures::household(1, 100.0, Region::London);
        loser.people = 2;
        loser.disabled = 1;
        loser.net_income = 20_000.0;
        loser.reform_net_income = 18_000.0;
        loser.reform_net_income_ahc = 9_000.0;
        loser.poverty_line_ahc = 10_000.0;

        let mut gainer = fixtures::household(2, 300.0, Region::Wales);
        gainer.net_income = 8_000.0;
        gainer.net_income_ahc = 6_000.0;
        gainer.reform_net_income = 9_000.0;
        gainer.reform_net_income_ahc = 7_000.0;

        Dataset::from_households(vec![loser, gainer]).unwrap()
    }

    #[test]
    fn test_loss_metrics() {
        let data = dataset();
        let table = apply_ubi(&data, &UbiParameters::zero());
        let metrics = loss_metrics(&data, &table, Population::Everyone).unwrap();

        // Person weights: 200 and 300
        assert_relative_eq!(metrics.loser_share, 200.0 / 500.0);
        assert_relative_eq!(metrics.losses, 200.0 * 2_000.0);
        assert_relative_eq!(metrics.mean_pct_loss, 200.0 * 0.1 / 500.0);
        // Disabled household counts twice: 400 of 700
        assert_relative_eq!(metrics.mean_pct_loss_pwd2, 400.0 * 0.1 / 700.0);
        // Gainer at 9,000 is below the 10,000 BHC line
        assert_relative_eq!(metrics.poverty_gap_bhc, 300.0 * 1_000.0);
        // Loser at 9,000 AHC against 10,000, gainer at 7,000 against 8,000
        assert_relative_eq!(metrics.poverty_gap_ahc, 100.0 * 1_000.0 + 300.0 * 1_000.0);
        // Both households end up on 9,000 per person
        assert_relative_eq!(metrics.gini, 0.0, epsilon = 1e-12);
        assert_eq!(metrics.get(Objective::Losses), metrics.losses);
    }

    #[test]
    fn test_population_selector() {
        let data = dataset();
        let table = apply_ubi(&data, &UbiParameters::zero());

        let disabled = loss_metrics(&data, &table, Population::Disabled).unwrap();
        assert_relative_eq!(disabled.loser_share, 1.0);

        assert!(matches!(
            loss_metrics(&data, &table, Population::Children),
            Err(Error::EmptyPopulation(_))
        ));
    }

    #[test]
    fn test_zero_baseline_income_excluded_from_pct_loss() {
        let mut hh = fixtures::household(1, 10.0, Region::London);
        hh.net_income = 0.0;
        hh.reform_net_income = -100.0;
        let data = Dataset::from_households(vec![hh]).unwrap();
        let table = apply_ubi(&data, &UbiParameters::zero());
        let metrics = loss_metrics(&data, &table, Population::Everyone).unwrap();

        assert_relative_eq!(metrics.loser_share, 1.0);
        assert_eq!(metrics.mean_pct_loss, 0.0);
        assert!(metrics.mean_pct_loss.is_finite());
    }

    #[test]
    fn test_names_parse() {
        assert_eq!("working_age_adults".parse::<Population>(), Ok(Population::WorkingAgeAdults));
        assert_eq!("mean_pct_loss_pwd2".parse::<Objective>(), Ok(Objective::MeanPctLossPwd2));
        assert!("nobody".parse::<Population>().is_err());
        assert_eq!(Population::Seniors.to_string(), "seniors");
    }

    #[test]
    fn test_baseline_poverty_gaps() {
        let data = dataset();
        let (bhc, ahc) = baseline_poverty_gaps(&data);
        // Gainer: 10,000 - 8,000 BHC and 8,000 - 6,000 AHC
        assert_relative_eq!(bhc, 300.0 * 2_000.0);
        assert_relative_eq!(ahc, 300.0 * 2_000.0);
    }
}
