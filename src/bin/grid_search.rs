//! Search for the UBI amounts that minimise a loss metric
//!
//! Every candidate is made budget-neutral by solving the adult amount.
//! Supports JSON output for downstream tooling via --json.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use ubi_reform::optimise::{AmountRange, GridSearch};
use ubi_reform::report::{format_gbp, write_csv};
use ubi_reform::{Dataset, Objective, PipelineConfig, Population, Region, UbiParameters};

#[derive(Parser)]
#[command(name = "grid_search")]
#[command(about = "Grid search for budget-neutral UBI amounts")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Household extract (overrides the configured data directory)
    #[arg(long)]
    households: Option<PathBuf>,

    /// Metric to minimise
    #[arg(long, default_value = "mean_pct_loss")]
    objective: Objective,

    /// Population weighting the metrics
    #[arg(short, long)]
    population: Option<Population>,

    /// Senior amounts as MIN:MAX:STEP (weekly)
    #[arg(long, default_value = "150:200:5", value_parser = parse_range)]
    senior: AmountRange,

    /// Child amounts as MIN:MAX:STEP (weekly)
    #[arg(long, default_value = "20:80:5", value_parser = parse_range)]
    child: AmountRange,

    /// Disability supplement amounts as MIN:MAX:STEP (weekly)
    #[arg(long, default_value = "0", value_parser = parse_range)]
    dis_base: AmountRange,

    /// Number of best candidates to keep in the output
    #[arg(long, default_value = "20")]
    top: usize,

    /// CSV file for the best candidates
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn parse_range(s: &str) -> std::result::Result<AmountRange, String> {
    let parts: Vec<f64> = s
        .split(':')
        .map(|p| p.trim().parse::<f64>().map_err(|_| format!("invalid amount '{}'", p)))
        .collect::<std::result::Result<_, _>>()?;
    if parts.iter().any(|p| !p.is_finite()) {
        return Err(format!("amounts must be finite, got '{}'", s));
    }
    let range = match parts.as_slice() {
        [amount] => AmountRange::fixed(*amount),
        [min, max, step] if *step > 0.0 && max >= min => AmountRange::new(*min, *max, *step),
        [_, _, _] => return Err("expected MIN <= MAX and STEP > 0".to_string()),
        _ => return Err(format!("expected AMOUNT or MIN:MAX:STEP, got '{}'", s)),
    };
    range.values().map_err(|e| e.to_string())?;
    Ok(range)
}

/// Flat CSV row of one candidate
#[derive(Serialize)]
struct CandidateRow {
    rank: usize,
    senior: f64,
    adult: f64,
    child: f64,
    dis_base: f64,
    score: f64,
    loser_share: f64,
    losses: f64,
    mean_pct_loss: f64,
    mean_pct_loss_pwd2: f64,
    poverty_gap_bhc: f64,
    poverty_gap_ahc: f64,
    gini: f64,
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    objective: Objective,
    population: Population,
    evaluated: usize,
    infeasible: usize,
    best: &'a [CandidateRow],
    execution_time_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let start = Instant::now();

    let config = PipelineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let households_path = cli.households.clone().unwrap_or_else(|| config.households_path());
    let dataset = Dataset::load(&households_path)
        .with_context(|| format!("Failed to load households from {}", households_path.display()))?;

    let population = cli.population.unwrap_or(config.population);
    let search = GridSearch {
        senior: cli.senior,
        child: cli.child,
        dis_base: cli.dis_base,
        base: UbiParameters::zero(),
        objective: cli.objective,
        population,
    };

    let result = search.run(&dataset)?;

    let rows: Vec<CandidateRow> = result
        .candidates
        .iter()
        .take(cli.top)
        .enumerate()
        .map(|(i, c)| CandidateRow {
            rank: i + 1,
            senior: c.params.senior,
            adult: c.params.adult,
            child: c.params.child,
            dis_base: c.params.dis_base,
            score: c.score,
            loser_share: c.metrics.loser_share,
            losses: c.metrics.losses,
            mean_pct_loss: c.metrics.mean_pct_loss,
            mean_pct_loss_pwd2: c.metrics.mean_pct_loss_pwd2,
            poverty_gap_bhc: c.metrics.poverty_gap_bhc,
            poverty_gap_ahc: c.metrics.poverty_gap_ahc,
            gini: c.metrics.gini,
        })
        .collect();

    if let Some(path) = &cli.out {
        write_csv(path, &rows).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if cli.json {
        let response = SearchResponse {
            objective: result.objective,
            population,
            evaluated: result.evaluated,
            infeasible: result.infeasible,
            best: &rows,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!(
        "Evaluated {} candidates ({} infeasible) in {:?}",
        result.evaluated,
        result.infeasible,
        start.elapsed()
    );
    if let Some(best) = result.best() {
        println!("\nBest by {:?}:", result.objective);
        println!("  Senior:   {}/week", format_gbp(best.params.senior));
        println!("  Adult:    {}/week", format_gbp(best.params.adult));
        println!("  Child:    {}/week", format_gbp(best.params.child));
        println!("  Disabled: {}/week", format_gbp(best.params.dis_base));
        println!("  Score:    {:.6}", best.score);
        println!("  Losers:   {:.2}%", best.metrics.loser_share * 100.0);
        println!("  Gini:     {:.4}", best.metrics.gini);

        // Row for the variants table, ready to paste
        let geo: Vec<String> = Region::ALL.iter().map(|r| format!("{}", best.params.geo_for(*r))).collect();
        println!(
            "\n  senior,child,dis_base,{}\n  {},{},{},{}",
            Region::ALL.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(","),
            best.params.senior,
            best.params.child,
            best.params.dis_base,
            geo.join(",")
        );
    }
    if let Some(path) = &cli.out {
        println!("\nTop {} candidates written to: {}", rows.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("150:200:5"), Ok(AmountRange::new(150.0, 200.0, 5.0)));
        assert_eq!(parse_range("0"), Ok(AmountRange::fixed(0.0)));
        assert!(parse_range("200:150:5").is_err());
        assert!(parse_range("0:10:0").is_err());
        assert!(parse_range("0:inf:1").is_err());
        assert!(parse_range("NaN").is_err());
        assert!(parse_range("0:1e18:1").is_err());
        assert!(parse_range("1:2").is_err());
    }
}
