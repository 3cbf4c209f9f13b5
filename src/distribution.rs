//! Distributional impact of reforms: inequality, winners and losers by
//! income decile and by region

use crate::household::{Dataset, Region};
use crate::metrics::baseline_poverty_gaps;
use crate::metrics::weighted::{gini, pct_change, top_share, weighted_deciles, weighted_mean, weighted_sum};
use crate::reform::ReformTable;
use serde::{Deserialize, Serialize};

/// Inequality measures of one income distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inequality {
    pub gini: f64,
    pub top_10_pct_share: f64,
    pub top_1_pct_share: f64,
}

impl Inequality {
    /// Measure the distribution of `values` weighted by `weights`
    pub fn measure(values: &[f64], weights: &[f64]) -> Self {
        Self {
            gini: gini(values, weights),
            top_10_pct_share: top_share(values, weights, 0.10).unwrap_or(f64::NAN),
            top_1_pct_share: top_share(values, weights, 0.01).unwrap_or(f64::NAN),
        }
    }
}

/// Headline impact of one reform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReformSummary {
    pub reform: String,
    /// Person-weighted mean of percentage losses (gains count as zero)
    pub mean_pct_loss: f64,
    /// Share of people in households with higher net income
    pub winner_share: f64,
    pub gini_base: f64,
    pub gini_reform: f64,
    pub gini_pc: f64,
    pub top_10_pct_share_base: f64,
    pub top_10_pct_share_reform: f64,
    pub top_10_pct_share_pc: f64,
    pub top_1_pct_share_base: f64,
    pub top_1_pct_share_reform: f64,
    pub top_1_pct_share_pc: f64,
    /// Share of people in households below the poverty line
    pub poverty_rate_bhc_base: f64,
    pub poverty_rate_bhc_reform: f64,
    pub poverty_rate_bhc_pc: f64,
    pub poverty_rate_ahc_base: f64,
    pub poverty_rate_ahc_reform: f64,
    pub poverty_rate_ahc_pc: f64,
    /// Household-weighted shortfall below the poverty line, pounds per year
    pub poverty_gap_bhc_base: f64,
    pub poverty_gap_bhc_reform: f64,
    pub poverty_gap_bhc_pc: f64,
    pub poverty_gap_ahc_base: f64,
    pub poverty_gap_ahc_reform: f64,
    pub poverty_gap_ahc_pc: f64,
}

/// Aggregate impact of one reform on one income decile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecileImpact {
    pub reform: String,
    pub decile: u8,
    /// Weighted total net income under the reform
    pub household_net_income: f64,
    /// Weighted total baseline net income
    pub household_net_income_base: f64,
    pub people: f64,
    pub chg: f64,
    pub chg_pp: f64,
    pub pc: f64,
}

/// Aggregate impact of one reform on one region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionImpact {
    pub reform: String,
    pub region: Region,
    pub people: f64,
    /// Mean yearly net income change per person
    pub chg_pp: f64,
    pub winner_share: f64,
}

/// All distributional tables for a set of reforms
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributionReport {
    pub summaries: Vec<ReformSummary>,
    pub deciles: Vec<DecileImpact>,
    pub regions: Vec<RegionImpact>,
}

/// Income decile of each household, ranking people by baseline equivalised income
pub fn baseline_deciles(dataset: &Dataset) -> Vec<u8> {
    let households = dataset.households();
    let equivalised: Vec<f64> = households.iter().map(|h| h.equivalised_net_income()).collect();
    let person_weights: Vec<f64> = households.iter().map(|h| h.person_weight()).collect();
    weighted_deciles(&equivalised, &person_weights)
}

fn below(income: f64, line: f64) -> f64 {
    if income < line {
        1.0
    } else {
        0.0
    }
}

/// Headline summary of one reform.
///
/// Winner, loss and poverty-rate figures are weighted by people; inequality
/// is measured over equivalised household income with household weights.
pub fn reform_summary(dataset: &Dataset, name: &str, table: &ReformTable) -> ReformSummary {
    let households = dataset.households();
    let person_weights: Vec<f64> = households.iter().map(|h| h.person_weight()).collect();
    let household_weights: Vec<f64> = households.iter().map(|h| h.weight).collect();

    let mut pct_losses = Vec::with_capacity(households.len());
    let mut winners = Vec::with_capacity(households.len());
    let mut equivalised_base = Vec::with_capacity(households.len());
    let mut equivalised_reform = Vec::with_capacity(households.len());
    let mut poor = [Vec::with_capacity(households.len()), Vec::new(), Vec::new(), Vec::new()];
    let mut gap_bhc = Vec::with_capacity(households.len());
    let mut gap_ahc = Vec::with_capacity(households.len());

    for (h, r) in households.iter().zip(&table.rows) {
        let chg = r.net_income - h.net_income;
        // Percentage change only defined for positive baselines
        let pc = if h.net_income > 0.0 { chg / h.net_income } else { f64::NAN };
        pct_losses.push(if pc.is_nan() { pc } else { pc.min(0.0) });
        winners.push(if chg > 0.0 { 1.0 } else { 0.0 });
        equivalised_base.push(h.equivalised_net_income());
        equivalised_reform.push(r.net_income / h.equivalisation_bhc);

        poor[0].push(below(h.net_income, h.poverty_line_bhc));
        poor[1].push(below(r.net_income, h.poverty_line_bhc));
        poor[2].push(below(h.net_income_ahc, h.poverty_line_ahc));
        poor[3].push(below(r.net_income_ahc, h.poverty_line_ahc));
        gap_bhc.push((h.poverty_line_bhc - r.net_income).max(0.0));
        gap_ahc.push((h.poverty_line_ahc - r.net_income_ahc).max(0.0));
    }

    let [rate_bhc_base, rate_bhc_reform, rate_ahc_base, rate_ahc_reform] =
        poor.map(|flags| weighted_mean(&flags, &person_weights).unwrap_or(0.0));
    let (gap_bhc_base, gap_ahc_base) = baseline_poverty_gaps(dataset);
    let gap_bhc_reform = weighted_sum(&gap_bhc, &household_weights);
    let gap_ahc_reform = weighted_sum(&gap_ahc, &household_weights);

    let base = Inequality::measure(&equivalised_base, &household_weights);
    let reform = Inequality::measure(&equivalised_reform, &household_weights);

    ReformSummary {
        reform: name.to_string(),
        mean_pct_loss: weighted_mean(&pct_losses, &person_weights).unwrap_or(0.0),
        winner_share: weighted_mean(&winners, &person_weights).unwrap_or(0.0),
        gini_base: base.gini,
        gini_reform: reform.gini,
        gini_pc: pct_change(base.gini, reform.gini),
        top_10_pct_share_base: base.top_10_pct_share,
        top_10_pct_share_reform: reform.top_10_pct_share,
        top_10_pct_share_pc: pct_change(base.top_10_pct_share, reform.top_10_pct_share),
        top_1_pct_share_base: base.top_1_pct_share,
        top_1_pct_share_reform: reform.top_1_pct_share,
        top_1_pct_share_pc: pct_change(base.top_1_pct_share, reform.top_1_pct_share),
        poverty_rate_bhc_base: rate_bhc_base,
        poverty_rate_bhc_reform: rate_bhc_reform,
        poverty_rate_bhc_pc: pct_change(rate_bhc_base, rate_bhc_reform),
        poverty_rate_ahc_base: rate_ahc_base,
        poverty_rate_ahc_reform: rate_ahc_reform,
        poverty_rate_ahc_pc: pct_change(rate_ahc_base, rate_ahc_reform),
        poverty_gap_bhc_base: gap_bhc_base,
        poverty_gap_bhc_reform: gap_bhc_reform,
        poverty_gap_bhc_pc: pct_change(gap_bhc_base, gap_bhc_reform),
        poverty_gap_ahc_base: gap_ahc_base,
        poverty_gap_ahc_reform: gap_ahc_reform,
        poverty_gap_ahc_pc: pct_change(gap_ahc_base, gap_ahc_reform),
    }
}

/// Weighted totals of one reform by baseline income decile
pub fn decile_impacts(
    dataset: &Dataset,
    name: &str,
    table: &ReformTable,
    deciles: &[u8],
) -> Vec<DecileImpact> {
    let mut reform_income = [0.0; 10];
    let mut base_income = [0.0; 10];
    let mut people = [0.0; 10];

    for ((h, r), &d) in dataset.households().iter().zip(&table.rows).zip(deciles) {
        let idx = (d as usize).saturating_sub(1).min(9);
        reform_income[idx] += h.weight * r.net_income;
        base_income[idx] += h.weight * h.net_income;
        people[idx] += h.person_weight();
    }

    (0..10)
        .filter(|&i| people[i] > 0.0)
        .map(|i| {
            let chg = reform_income[i] - base_income[i];
            DecileImpact {
                reform: name.to_string(),
                decile: i as u8 + 1,
                household_net_income: reform_income[i],
                household_net_income_base: base_income[i],
                people: people[i],
                chg,
                chg_pp: chg / people[i],
                pc: chg / base_income[i],
            }
        })
        .collect()
}

/// Per-person change and winner share of one reform by region
pub fn region_impacts(dataset: &Dataset, name: &str, table: &ReformTable) -> Vec<RegionImpact> {
    let mut chg = [0.0; Region::ALL.len()];
    let mut people = [0.0; Region::ALL.len()];
    let mut winners = [0.0; Region::ALL.len()];

    for (h, r) in dataset.households().iter().zip(&table.rows) {
        let idx = h.region.index();
        let change = r.net_income - h.net_income;
        chg[idx] += h.weight * change;
        people[idx] += h.person_weight();
        if change > 0.0 {
            winners[idx] += h.person_weight();
        }
    }

    Region::ALL
        .iter()
        .filter(|region| people[region.index()] > 0.0)
        .map(|&region| {
            let i = region.index();
            RegionImpact {
                reform: name.to_string(),
                region,
                people: people[i],
                chg_pp: chg[i] / people[i],
                winner_share: winners[i] / people[i],
            }
        })
        .collect()
}

/// Build every distributional table for a set of named reforms
pub fn analyse<'a, I>(dataset: &Dataset, reforms: I) -> DistributionReport
where
    I: IntoIterator<Item = (&'a str, &'a ReformTable)>,
{
    let deciles = baseline_deciles(dataset);
    let mut report = DistributionReport::default();

    for (name, table) in reforms {
        report.summaries.push(reform_summary(dataset, name, table));
        report.deciles.extend(decile_impacts(dataset, name, table, &deciles));
        report.regions.extend(region_impacts(dataset, name, table));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::household::fixtures;
    use crate::reform::{apply_ubi, set_ubi, UbiParameters};
    use approx::assert_relative_eq;

    /// Ten single-person households with incomes 10k..100k
    fn ladder() -> Dataset {
        let households = (1..=10)
            .map(|i| {
                let region = if i <= 5 { Region::London } else { Region::Scotland };
                let mut h = fixtures::household(i, 100.0, region);
                h.net_income = 10_000.0 * i as f64;
                h.reform_net_income = h.net_income * 0.8;
                h
            })
            .collect();
        Dataset::from_households(households).unwrap()
    }

    #[test]
    fn test_one_household_per_decile() {
        let data = ladder();
        assert_eq!(baseline_deciles(&data), (1..=10).collect::<Vec<u8>>());
    }

    #[test]
    fn test_flat_ubi_is_progressive() {
        let data = ladder();
        let (_, table) = set_ubi(&data, &UbiParameters::zero()).unwrap();
        let summary = reform_summary(&data, "flat", &table);

        // Revenue is 20% of 550k per 100 weight, paid back as 11k each
        assert_relative_eq!(table.rows[0].basic_income, 11_000.0, max_relative = 1e-12);
        assert!(summary.gini_reform < summary.gini_base);
        assert!(summary.gini_pc < 0.0);
        assert!(summary.top_10_pct_share_reform < summary.top_10_pct_share_base);
        // Incomes up to 50k gain; 60k and above lose
        assert_relative_eq!(summary.winner_share, 0.5);
        assert!(summary.mean_pct_loss < 0.0);
    }

    #[test]
    fn test_poverty_rates_and_gaps() {
        let mut data = ladder().households().to_vec();
        // Poorest household starts 1k below the BHC line, and 500 below AHC
        data[0].net_income = 9_000.0;
        data[0].reform_net_income = 7_200.0;
        data[0].net_income_ahc = 7_500.0;
        data[0].reform_net_income_ahc = 6_000.0;
        let data = Dataset::from_households(data).unwrap();

        let tax_only = reform_summary(&data, "tax only", &apply_ubi(&data, &UbiParameters::zero()));
        assert_relative_eq!(tax_only.poverty_rate_bhc_base, 0.1);
        // 20k falls to 16k: still above the line
        assert_relative_eq!(tax_only.poverty_rate_bhc_reform, 0.1);
        assert_relative_eq!(tax_only.poverty_rate_bhc_pc, 0.0);
        assert_relative_eq!(tax_only.poverty_gap_bhc_base, 100.0 * 1_000.0);
        assert_relative_eq!(tax_only.poverty_gap_bhc_reform, 100.0 * 2_800.0);
        assert_relative_eq!(tax_only.poverty_gap_bhc_pc, 1.8);
        assert_relative_eq!(tax_only.poverty_rate_ahc_base, 0.1);
        assert_relative_eq!(tax_only.poverty_gap_ahc_base, 100.0 * 500.0);
        assert_relative_eq!(tax_only.poverty_gap_ahc_reform, 100.0 * 2_000.0);

        let (_, table) = set_ubi(&data, &UbiParameters::zero()).unwrap();
        let flat = reform_summary(&data, "flat", &table);
        assert_eq!(flat.poverty_rate_bhc_reform, 0.0);
        assert_eq!(flat.poverty_gap_bhc_reform, 0.0);
        assert_eq!(flat.poverty_rate_ahc_reform, 0.0);
        assert_relative_eq!(flat.poverty_rate_bhc_pc, -1.0);
        assert_relative_eq!(flat.poverty_gap_ahc_pc, -1.0);
    }

    #[test]
    fn test_decile_table_sums_to_budget_neutral() {
        let data = ladder();
        let (_, table) = set_ubi(&data, &UbiParameters::zero()).unwrap();
        let deciles = decile_impacts(&data, "flat", &table, &baseline_deciles(&data));

        assert_eq!(deciles.len(), 10);
        let total_chg: f64 = deciles.iter().map(|d| d.chg).sum();
        assert_relative_eq!(total_chg, 0.0, epsilon = 1e-4);

        let poorest = &deciles[0];
        // 10k * 0.8 + 11k against 10k baseline
        assert_relative_eq!(poorest.chg_pp, 9_000.0, max_relative = 1e-12);
        assert_relative_eq!(poorest.pc, 0.9, max_relative = 1e-12);
        assert_eq!(poorest.people, 100.0);
    }

    #[test]
    fn test_region_impacts() {
        let data = ladder();
        let table = apply_ubi(&data, &UbiParameters::zero());
        let regions = region_impacts(&data, "tax only", &table);

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].region, Region::London);
        // London incomes 10k..50k, each loses 20%
        assert_relative_eq!(regions[0].chg_pp, -6_000.0);
        assert_eq!(regions[0].winner_share, 0.0);
        assert_eq!(regions[1].region, Region::Scotland);
    }

    #[test]
    fn test_analyse_collects_every_reform() {
        let data = ladder();
        let tax_only = apply_ubi(&data, &UbiParameters::zero());
        let (_, flat) = set_ubi(&data, &UbiParameters::zero()).unwrap();

        let report = analyse(&data, [("tax only", &tax_only), ("flat", &flat)]);
        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.deciles.len(), 20);
        assert_eq!(report.regions.len(), 4);
        assert_eq!(report.summaries[1].reform, "flat");
    }
}
