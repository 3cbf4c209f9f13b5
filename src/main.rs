//! UBI reform CLI
//!
//! Solve budget-neutral UBI amounts and report their distributional effects

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use ubi_reform::metrics::baseline_poverty_gaps;
use ubi_reform::reform::{apply_ubi, WEEKS_IN_YEAR};
use ubi_reform::report::{format_gbp, write_reform_table, write_run_report};
use ubi_reform::scenario::load_variants;
use ubi_reform::{
    loss_metrics, set_ubi, solve_adult_amount, Dataset, PipelineConfig, Population, Region,
    ScenarioRunner, UbiParameters,
};

#[derive(Parser)]
#[command(name = "ubi-reform")]
#[command(about = "Budget-neutral UBI reforms over UK household microdata")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Household extract (overrides the configured data directory)
    #[arg(long, global = true)]
    households: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the budget and the budget-neutral adult amount
    Budget {
        #[command(flatten)]
        amounts: AmountArgs,
    },

    /// Compute loss metrics of one reform
    Metrics {
        #[command(flatten)]
        amounts: AmountArgs,

        /// Weekly adult amount; solved for budget neutrality when omitted
        #[arg(long)]
        adult: Option<f64>,

        /// Population weighting the metrics
        #[arg(short, long)]
        population: Option<Population>,

        /// Write the household-level reform table to this CSV
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run every variant in the variants table and write reports
    Scenarios {
        /// Variants table (overrides the configured file)
        #[arg(long)]
        variants: Option<PathBuf>,

        /// Output directory for reports
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep variant amounts unrounded
        #[arg(long)]
        no_round: bool,
    },
}

/// Weekly UBI amounts other than the adult amount
#[derive(Args)]
struct AmountArgs {
    /// Per person at State Pension age
    #[arg(long, default_value = "0")]
    senior: f64,

    /// Per child
    #[arg(long, default_value = "0")]
    child: f64,

    /// Supplement for any disability benefit claimant
    #[arg(long, default_value = "0")]
    dis_base: f64,

    /// Supplement for middle-rate disability benefit claimants
    #[arg(long, default_value = "0")]
    dis_severe: f64,

    /// Supplement for top-rate disability benefit claimants
    #[arg(long, default_value = "0")]
    dis_enhanced: f64,

    /// Regional supplement per person, e.g. LONDON=10 (repeatable)
    #[arg(long = "geo", value_parser = parse_geo)]
    geo: Vec<(Region, f64)>,
}

impl AmountArgs {
    fn params(&self) -> UbiParameters {
        let mut params = UbiParameters::foundational(self.senior, self.child).with_disability(
            self.dis_base,
            self.dis_severe,
            self.dis_enhanced,
        );
        for &(region, amount) in &self.geo {
            params = params.with_region(region, amount);
        }
        params
    }
}

fn parse_geo(s: &str) -> std::result::Result<(Region, f64), String> {
    let (name, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected REGION=AMOUNT, got '{}'", s))?;
    let region = Region::from_name(name.trim()).ok_or_else(|| format!("unknown region '{}'", name))?;
    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| format!("invalid amount '{}'", amount))?;
    Ok((region, amount))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let households_path = cli.households.clone().unwrap_or_else(|| config.households_path());

    let dataset = Dataset::load(&households_path)
        .with_context(|| format!("Failed to load households from {}", households_path.display()))?;

    match cli.command {
        Command::Budget { amounts } => budget(&dataset, &amounts.params()),
        Command::Metrics { amounts, adult, population, out } => metrics(
            &dataset,
            &amounts.params(),
            adult,
            population.unwrap_or(config.population),
            out,
        ),
        Command::Scenarios { variants, output, no_round } => {
            let variants_path = variants.unwrap_or_else(|| config.variants_path());
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            scenarios(dataset, &config, &variants_path, &output_dir, config.round_parameters && !no_round)
        }
    }
}

fn budget(dataset: &Dataset, params: &UbiParameters) -> Result<()> {
    let solution = solve_adult_amount(dataset, params)?;

    println!("Households:      {}", dataset.len());
    println!("Population:      {:.0}", dataset.population());
    println!("Revenue:         {}/year", format_gbp(solution.revenue));
    println!("Non-adult cost:  {}/year", format_gbp(solution.fixed_cost));
    println!("Adult cost:      {}/year", format_gbp(solution.adult_cost));
    println!(
        "Adult amount:    {}/week ({}/year)",
        format_gbp(solution.adult_weekly),
        format_gbp(solution.adult_yearly())
    );
    if !solution.is_feasible() {
        println!("\nThe non-adult amounts exceed the budget.");
    }
    Ok(())
}

fn metrics(
    dataset: &Dataset,
    params: &UbiParameters,
    adult: Option<f64>,
    population: Population,
    out: Option<PathBuf>,
) -> Result<()> {
    let table = match adult {
        Some(weekly) => apply_ubi(dataset, &params.with_adult(weekly)),
        None => set_ubi(dataset, params)?.1,
    };
    let metrics = loss_metrics(dataset, &table, population)?;
    let (base_gap_bhc, base_gap_ahc) = baseline_poverty_gaps(dataset);

    println!("Adult amount:        {}/week", format_gbp(table.params.adult));
    println!("Net cost:            {}/year", format_gbp(table.net_cost(dataset)));
    println!("Population:          {}", population);
    println!("Loser share:         {:.2}%", metrics.loser_share * 100.0);
    println!("Losses:              {}/year", format_gbp(metrics.losses));
    println!("Mean % loss:         {:.3}%", metrics.mean_pct_loss * 100.0);
    println!("Mean % loss (PWD2):  {:.3}%", metrics.mean_pct_loss_pwd2 * 100.0);
    println!(
        "Poverty gap (BHC):   {} (baseline {})",
        format_gbp(metrics.poverty_gap_bhc),
        format_gbp(base_gap_bhc)
    );
    println!(
        "Poverty gap (AHC):   {} (baseline {})",
        format_gbp(metrics.poverty_gap_ahc),
        format_gbp(base_gap_ahc)
    );
    println!("Gini:                {:.4}", metrics.gini);

    if let Some(path) = out {
        write_reform_table(&path, dataset, &table)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nHousehold table written to: {}", path.display());
    }
    Ok(())
}

fn scenarios(
    dataset: Dataset,
    config: &PipelineConfig,
    variants_path: &std::path::Path,
    output_dir: &std::path::Path,
    round: bool,
) -> Result<()> {
    let variants = load_variants(variants_path, round)
        .with_context(|| format!("Failed to load variants from {}", variants_path.display()))?;

    let runner = ScenarioRunner::new(dataset).with_population(config.population);
    let (results, report) = runner.report(&variants)?;

    println!(
        "{:<24} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Reform", "Adult/wk", "Losers%", "MeanLoss%", "Winners%", "Gini"
    );
    println!("{}", "-".repeat(79));
    for (result, summary) in results.iter().zip(&report.distribution.summaries) {
        println!(
            "{:<24} {:>10.2} {:>10.2} {:>10.3} {:>10.2} {:>10.4}",
            result.variant.name,
            result.table.params.adult,
            result.metrics.loser_share * 100.0,
            result.metrics.mean_pct_loss * 100.0,
            summary.winner_share * 100.0,
            result.metrics.gini,
        );
    }

    write_run_report(output_dir, &report)?;
    for result in &results {
        let file_name = format!("households_{}.csv", slug(&result.variant.name));
        write_reform_table(output_dir.join(file_name), runner.dataset(), &result.table)?;
    }

    println!(
        "\nBudget: {}/year ({}/week per person)",
        format_gbp(report.revenue),
        format_gbp(report.revenue / report.population / WEEKS_IN_YEAR)
    );
    println!("Reports written to: {}", output_dir.display());
    Ok(())
}

/// File-name-safe form of a variant name
fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    slug.trim_end_matches('_').to_string()
}
