//! Scenario runner for batches of reform variants
//!
//! Loads the microdata once, then solves and evaluates many UBI variants
//! against the same baseline.

use crate::distribution::{analyse, DistributionReport};
use crate::error::{Error, Result};
use crate::household::{Dataset, Region};
use crate::metrics::{loss_metrics, LossMetrics, Population};
use crate::reform::{apply_ubi, set_ubi, BudgetSolution, ReformTable, UbiParameters};
use crate::report::{format_gbp, RunReport, VariantReport};
use csv::StringRecord;
use rayon::prelude::*;
use std::path::Path;

/// Default file name of the variants table inside the data directory
pub const DEFAULT_VARIANTS_FILE: &str = "reform_params.csv";

/// Names given to variants that carry no `name` column, by row
pub const DEFAULT_VARIANT_NAMES: [&str; 3] = ["1: Foundational", "2: Disability", "3: Disability + geo"];

/// How the adult amount of a variant is set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdultAmount {
    /// Solve for budget neutrality
    Solve,
    /// Use the given weekly amount as-is
    Fixed(f64),
}

/// One named reform to evaluate
#[derive(Debug, Clone)]
pub struct ReformVariant {
    pub name: String,
    pub params: UbiParameters,
    pub adult: AdultAmount,
}

impl ReformVariant {
    /// Variant whose adult amount is solved for budget neutrality
    pub fn budget_neutral(name: impl Into<String>, params: UbiParameters) -> Self {
        Self {
            name: name.into(),
            params,
            adult: AdultAmount::Solve,
        }
    }
}

/// Outcome of one variant
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub variant: ReformVariant,
    /// Present when the adult amount was solved
    pub solution: Option<BudgetSolution>,
    pub table: ReformTable,
    pub metrics: LossMetrics,
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn parse_amount(record: &StringRecord, idx: Option<usize>, row: usize, column: &str) -> Result<Option<f64>> {
    let raw = match idx.and_then(|i| record.get(i)) {
        Some(raw) if !raw.trim().is_empty() => raw.trim(),
        _ => return Ok(None),
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| Error::invalid_scenario(row, format!("{} is not a number: '{}'", column, raw)))?;
    if !value.is_finite() {
        return Err(Error::invalid_scenario(row, format!("{} must be finite", column)));
    }
    Ok(Some(value))
}

/// Load variants from any reader.
///
/// `senior`, `child` and `dis_base` are required; other amounts default to
/// zero. Rows with no `adult` value solve it. With `round`, amounts are
/// rounded to whole pounds first. Data rows are numbered from 1 in errors.
pub fn load_variants_from_reader<R: std::io::Read>(reader: R, round: bool) -> Result<Vec<ReformVariant>> {
    read_variants(reader, round, "variants table")
}

fn read_variants<R: std::io::Read>(reader: R, round: bool, source: &str) -> Result<Vec<ReformVariant>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let required = ["senior", "child", "dis_base"];
    for column in required {
        if column_index(&headers, column).is_none() {
            return Err(Error::MissingColumn {
                column: column.to_string(),
                file: source.to_string(),
            });
        }
    }

    let name_idx = column_index(&headers, "name");
    let region_idx: Vec<(Region, Option<usize>)> = Region::ALL
        .iter()
        .map(|&r| (r, column_index(&headers, r.as_str())))
        .collect();

    let mut variants = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = row + 1;
        let amount = |column: &str| parse_amount(&record, column_index(&headers, column), line, column);

        let mut params = UbiParameters::zero()
            .with_senior(amount("senior")?.unwrap_or(0.0))
            .with_child(amount("child")?.unwrap_or(0.0))
            .with_disability(
                amount("dis_base")?.unwrap_or(0.0),
                amount("dis_severe")?.unwrap_or(0.0),
                amount("dis_enhanced")?.unwrap_or(0.0),
            );
        for &(region, idx) in &region_idx {
            params = params.with_region(region, parse_amount(&record, idx, line, region.as_str())?.unwrap_or(0.0));
        }

        let adult = match amount("adult")? {
            Some(weekly) => {
                params = params.with_adult(weekly);
                AdultAmount::Fixed(weekly)
            }
            None => AdultAmount::Solve,
        };

        if round {
            params = params.rounded();
        }
        let adult = match adult {
            AdultAmount::Fixed(_) => AdultAmount::Fixed(params.adult),
            AdultAmount::Solve => AdultAmount::Solve,
        };

        let name = name_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| DEFAULT_VARIANT_NAMES.get(row).map(|s| s.to_string()))
            .unwrap_or_else(|| format!("Reform {}", line));

        variants.push(ReformVariant { name, params, adult });
    }

    if variants.is_empty() {
        return Err(Error::invalid_scenario(0, "no variants defined"));
    }

    Ok(variants)
}

/// Load variants from a CSV file
pub fn load_variants<P: AsRef<Path>>(path: P, round: bool) -> Result<Vec<ReformVariant>> {
    let file = std::fs::File::open(path.as_ref())?;
    let variants = read_variants(file, round, &path.as_ref().display().to_string())?;
    log::info!("Loaded {} reform variants from {}", variants.len(), path.as_ref().display());
    Ok(variants)
}

/// Pre-loaded scenario runner for batches of variants
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    dataset: Dataset,
    population: Population,
}

impl ScenarioRunner {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            population: Population::Everyone,
        }
    }

    /// Population used to weight loss metrics
    pub fn with_population(mut self, population: Population) -> Self {
        self.population = population;
        self
    }

    /// Load the household extract and create a runner
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        Ok(Self::new(Dataset::load(path)?))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn population(&self) -> Population {
        self.population
    }

    /// Solve (if needed) and evaluate one variant
    pub fn run(&self, variant: &ReformVariant) -> Result<ScenarioResult> {
        let (solution, table) = match variant.adult {
            AdultAmount::Solve => {
                let (solution, table) = set_ubi(&self.dataset, &variant.params)?;
                (Some(solution), table)
            }
            AdultAmount::Fixed(weekly) => (None, apply_ubi(&self.dataset, &variant.params.with_adult(weekly))),
        };
        let metrics = loss_metrics(&self.dataset, &table, self.population)?;

        log::info!(
            "{}: adult {}/week, loser share {:.1}%, gini {:.4}",
            variant.name,
            format_gbp(table.params.adult),
            metrics.loser_share * 100.0,
            metrics.gini
        );

        Ok(ScenarioResult {
            variant: variant.clone(),
            solution,
            table,
            metrics,
        })
    }

    /// Evaluate many variants in parallel, preserving order
    pub fn run_batch(&self, variants: &[ReformVariant]) -> Result<Vec<ScenarioResult>> {
        variants.par_iter().map(|v| self.run(v)).collect()
    }

    /// Distributional tables for a set of results
    pub fn distribution(&self, results: &[ScenarioResult]) -> DistributionReport {
        analyse(
            &self.dataset,
            results.iter().map(|r| (r.variant.name.as_str(), &r.table)),
        )
    }

    /// Run a batch and assemble the full run report
    pub fn report(&self, variants: &[ReformVariant]) -> Result<(Vec<ScenarioResult>, RunReport)> {
        let results = self.run_batch(variants)?;
        let distribution = self.distribution(&results);
        let variant_reports = results
            .iter()
            .map(|r| VariantReport {
                name: r.variant.name.clone(),
                params: r.table.params,
                solution: r.solution,
                metrics: r.metrics,
            })
            .collect();
        let report = RunReport::new(&self.dataset, variant_reports, distribution);
        Ok((results, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::household::fixtures;
    use approx::assert_relative_eq;

    fn runner() -> ScenarioRunner {
        let mut a = fixtures::household(1, 100.0, Region::London);
        a.people = 3;
        a.children = 1;
        a.working_age_adults = 2;
        a.net_income = 40_000.0;
        a.reform_net_income = 30_000.0;

        let mut b = fixtures::household(2, 100.0, Region::Wales);
        b.working_age_adults = 0;
        b.seniors = 1;
        b.disabled = 1;
        b.net_income = 12_000.0;
        b.reform_net_income = 6_000.0;

        ScenarioRunner::new(Dataset::from_households(vec![a, b]).unwrap())
    }

    #[test]
    fn test_load_variants() {
        let text = "senior,child,dis_base,NORTH_EAST,LONDON,WALES\n\
                    175.4,40,0,,,\n\
                    175,40,25.6,,,\n\
                    175,40,25,1.2,0,3.7\n";
        let variants = load_variants_from_reader(text.as_bytes(), true).unwrap();

        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].name, "1: Foundational");
        assert_eq!(variants[2].name, "3: Disability + geo");
        assert_eq!(variants[0].params.senior, 175.0);
        assert_eq!(variants[1].params.dis_base, 26.0);
        assert_eq!(variants[2].params.geo_for(Region::NorthEast), 1.0);
        assert_eq!(variants[2].params.geo_for(Region::Wales), 4.0);
        assert_eq!(variants[2].params.geo_for(Region::Scotland), 0.0);
        assert!(variants.iter().all(|v| v.adult == AdultAmount::Solve));
    }

    #[test]
    fn test_load_variants_with_names_and_fixed_adult() {
        let text = "name,senior,adult,child,dis_base\nCurrent amounts,180,71.5,35,0\n";
        let variants = load_variants_from_reader(text.as_bytes(), false).unwrap();
        assert_eq!(variants[0].name, "Current amounts");
        assert_eq!(variants[0].adult, AdultAmount::Fixed(71.5));
    }

    #[test]
    fn test_load_variants_rejects_bad_input() {
        let missing = "senior,child\n1,2\n";
        assert!(matches!(
            load_variants_from_reader(missing.as_bytes(), false),
            Err(Error::MissingColumn { .. })
        ));

        let not_a_number = "senior,child,dis_base\n1,2,0\nlots,2,0\n";
        assert!(matches!(
            load_variants_from_reader(not_a_number.as_bytes(), false),
            Err(Error::InvalidScenario { row: 2, .. })
        ));

        let first_row = "senior,child,dis_base\n1,2,inf\n";
        assert!(matches!(
            load_variants_from_reader(first_row.as_bytes(), false),
            Err(Error::InvalidScenario { row: 1, .. })
        ));

        let empty = "senior,child,dis_base\n";
        assert!(load_variants_from_reader(empty.as_bytes(), false).is_err());
    }

    #[test]
    fn test_missing_column_names_the_file() {
        let path = std::env::temp_dir().join(format!("ubi_variants_{}.csv", std::process::id()));
        std::fs::write(&path, "senior,dis_base\n1,0\n").unwrap();

        let err = load_variants(&path, false).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        match err {
            Error::MissingColumn { column, file } => {
                assert_eq!(column, "child");
                assert_eq!(file, path.display().to_string());
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_run_batch_preserves_order_and_neutrality() {
        let runner = runner();
        let variants = vec![
            ReformVariant::budget_neutral("age only", UbiParameters::foundational(100.0, 20.0)),
            ReformVariant::budget_neutral(
                "disability",
                UbiParameters::foundational(100.0, 20.0).with_disability(30.0, 0.0, 0.0),
            ),
            ReformVariant {
                name: "fixed".to_string(),
                params: UbiParameters::foundational(100.0, 20.0),
                adult: AdultAmount::Fixed(50.0),
            },
        ];

        let results = runner.run_batch(&variants).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].variant.name, "disability");

        for result in &results[..2] {
            assert_relative_eq!(result.table.net_cost(runner.dataset()), 0.0, epsilon = 1e-4);
            assert!(result.solution.is_some());
        }
        // Paying the disabled pensioner more leaves less for adults
        assert!(results[1].table.params.adult < results[0].table.params.adult);

        assert!(results[2].solution.is_none());
        assert_eq!(results[2].table.params.adult, 50.0);
    }

    #[test]
    fn test_report_assembles_tables() {
        let runner = runner();
        let variants = vec![ReformVariant::budget_neutral("flat", UbiParameters::zero())];
        let (results, report) = runner.report(&variants).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(report.variants.len(), 1);
        assert_eq!(report.household_count, 2);
        assert_relative_eq!(report.revenue, 100.0 * 10_000.0 + 100.0 * 6_000.0);
        assert_eq!(report.distribution.summaries.len(), 1);
        assert_eq!(report.distribution.regions.len(), 2);
    }

    #[test]
    fn test_sample_variants_are_budget_neutral() {
        let runner = ScenarioRunner::from_csv_path(Path::new("data/households.csv")).unwrap();
        let variants = load_variants("data/reform_params.csv", true).unwrap();
        let results = runner.run_batch(&variants).unwrap();

        assert_eq!(results.len(), 3);
        for result in &results {
            let neutral = result.table.net_cost(runner.dataset()) / runner.dataset().revenue();
            assert_relative_eq!(neutral, 0.0, epsilon = 1e-9);
            assert!(result.solution.unwrap().is_feasible());
        }
        assert_eq!(results[2].variant.params.geo_for(Region::London), 12.0);
    }
}
