//! CSV and JSON output of reform results

use crate::distribution::DistributionReport;
use crate::error::Result;
use crate::household::Dataset;
use crate::metrics::LossMetrics;
use crate::reform::{BudgetSolution, ReformTable, UbiParameters};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Format an amount of money as pounds with thousands separators, e.g. "£1,234"
pub fn format_gbp(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-£{}", grouped)
    } else {
        format!("£{}", grouped)
    }
}

/// Solved amounts and metrics of one reform variant
#[derive(Debug, Clone, Serialize)]
pub struct VariantReport {
    pub name: String,
    pub params: UbiParameters,
    pub solution: Option<BudgetSolution>,
    pub metrics: LossMetrics,
}

/// Full record of a scenario run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub household_count: usize,
    pub population: f64,
    pub revenue: f64,
    pub variants: Vec<VariantReport>,
    pub distribution: DistributionReport,
}

impl RunReport {
    pub fn new(dataset: &Dataset, variants: Vec<VariantReport>, distribution: DistributionReport) -> Self {
        Self {
            generated_at: Utc::now(),
            household_count: dataset.len(),
            population: dataset.population(),
            revenue: dataset.revenue(),
            variants,
            distribution,
        }
    }
}

/// Serialize rows to a CSV file with a header
pub fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::debug!("Wrote {} rows to {}", rows.len(), path.as_ref().display());
    Ok(())
}

/// One CSV row per household of a reform, with its baseline for reference
#[derive(Debug, Serialize)]
struct HouseholdOutputRow {
    household_id: u64,
    household_weight: f64,
    basic_income: f64,
    household_net_income_base: f64,
    household_net_income: f64,
    household_net_income_ahc_base: f64,
    household_net_income_ahc: f64,
}

/// Write the household-level table of one reform
pub fn write_reform_table<P: AsRef<Path>>(path: P, dataset: &Dataset, table: &ReformTable) -> Result<()> {
    let rows: Vec<HouseholdOutputRow> = dataset
        .households()
        .iter()
        .zip(&table.rows)
        .map(|(h, r)| HouseholdOutputRow {
            household_id: h.household_id,
            household_weight: h.weight,
            basic_income: r.basic_income,
            household_net_income_base: h.net_income,
            household_net_income: r.net_income,
            household_net_income_ahc_base: h.net_income_ahc,
            household_net_income_ahc: r.net_income_ahc,
        })
        .collect();
    write_csv(path, &rows)
}

/// Write summary, decile and region tables plus the JSON report into `dir`
pub fn write_run_report<P: AsRef<Path>>(dir: P, report: &RunReport) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    write_csv(dir.join("summary.csv"), &report.distribution.summaries)?;
    write_csv(dir.join("deciles.csv"), &report.distribution.deciles)?;
    write_csv(dir.join("regions.csv"), &report.distribution.regions)?;

    let mut file = File::create(dir.join("report.json"))?;
    serde_json::to_writer_pretty(&mut file, report)?;
    writeln!(file)?;

    log::info!("Reports written to {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_gbp() {
        assert_eq!(format_gbp(0.0), "£0");
        assert_eq!(format_gbp(999.4), "£999");
        assert_eq!(format_gbp(1234.5), "£1,235");
        assert_eq!(format_gbp(1_234_567.0), "£1,234,567");
        assert_eq!(format_gbp(-52_000.0), "-£52,000");
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        #[derive(Serialize)]
        struct Row {
            decile: u8,
            chg: f64,
        }

        let path = std::env::temp_dir().join(format!("ubi_reform_write_csv_{}.csv", std::process::id()));
        write_csv(&path, &[Row { decile: 1, chg: 2.5 }, Row { decile: 2, chg: -1.0 }]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(text, "decile,chg\n1,2.5\n2,-1.0\n");
    }
}
