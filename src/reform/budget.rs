//! Budget-neutral calibration of the adult UBI amount
//!
//! The tax reform raises a fixed revenue. Every UBI amount except the adult
//! one is chosen by the caller, so the adult amount is the single unknown of
//!
//! ```text
//! sum_h w_h * 52 * (fixed_h + adult * WA_h) = revenue
//! ```
//!
//! which has a closed-form solution.

use super::params::{UbiParameters, WEEKS_IN_YEAR};
use crate::error::{Error, Result};
use crate::household::{Dataset, Household};
use crate::report::format_gbp;
use serde::{Deserialize, Serialize};

/// Outcome of solving for the adult amount
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BudgetSolution {
    /// Weekly amount per working-age adult
    pub adult_weekly: f64,
    /// Yearly revenue available for UBI
    pub revenue: f64,
    /// Yearly cost of all non-adult components
    pub fixed_cost: f64,
    /// Yearly cost of the adult component
    pub adult_cost: f64,
}

impl BudgetSolution {
    /// Yearly amount per working-age adult
    pub fn adult_yearly(&self) -> f64 {
        self.adult_weekly * WEEKS_IN_YEAR
    }

    /// Whether the non-adult components fit inside the budget
    pub fn is_feasible(&self) -> bool {
        self.adult_weekly >= 0.0
    }
}

/// Yearly weighted cost of the UBI excluding the adult component
pub fn fixed_cost(households: &[Household], params: &UbiParameters) -> f64 {
    households
        .iter()
        .map(|h| h.weight * params.weekly_fixed_income(h) * WEEKS_IN_YEAR)
        .sum()
}

/// Yearly weighted cost of the full UBI
pub fn total_cost(households: &[Household], params: &UbiParameters) -> f64 {
    households
        .iter()
        .map(|h| h.weight * params.yearly_basic_income(h))
        .sum()
}

/// Solve for the weekly adult amount that spends exactly the revenue.
///
/// `params.adult` is ignored. A negative amount is returned as-is when the
/// other components already exceed the budget.
pub fn solve_adult_amount(dataset: &Dataset, params: &UbiParameters) -> Result<BudgetSolution> {
    let households = dataset.households();
    let revenue = dataset.revenue();

    let fixed = fixed_cost(households, params);
    let adult_years: f64 = households
        .iter()
        .map(|h| h.weight * h.working_age_adults as f64 * WEEKS_IN_YEAR)
        .sum();

    if adult_years <= 0.0 {
        return Err(Error::NoWorkingAgeAdults);
    }

    let adult_weekly = (revenue - fixed) / adult_years;
    let solution = BudgetSolution {
        adult_weekly,
        revenue,
        fixed_cost: fixed,
        adult_cost: revenue - fixed,
    };

    if solution.is_feasible() {
        log::info!("Adult amount: {}/week", format_gbp(adult_weekly));
    } else {
        log::warn!(
            "Non-adult components cost {} against revenue {}; adult amount is {}/week",
            format_gbp(fixed),
            format_gbp(revenue),
            format_gbp(adult_weekly)
        );
    }

    Ok(solution)
}

/// Net incomes of one household under a UBI reform
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReformedHousehold {
    pub household_id: u64,
    /// Yearly basic income paid to the household
    pub basic_income: f64,
    /// Net income before housing costs
    pub net_income: f64,
    /// Net income after housing costs
    pub net_income_ahc: f64,
}

/// Household-level outcome of a reform, aligned index-for-index with the dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReformTable {
    pub params: UbiParameters,
    pub rows: Vec<ReformedHousehold>,
}

impl ReformTable {
    /// Yearly weighted UBI spending
    pub fn cost(&self, dataset: &Dataset) -> f64 {
        dataset
            .households()
            .iter()
            .zip(&self.rows)
            .map(|(h, r)| h.weight * r.basic_income)
            .sum()
    }

    /// Weighted net income change against the baseline; zero for a budget-neutral reform
    pub fn net_cost(&self, dataset: &Dataset) -> f64 {
        dataset
            .households()
            .iter()
            .zip(&self.rows)
            .map(|(h, r)| h.weight * (r.net_income - h.net_income))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pay the UBI described by `params` (adult amount included) on top of the tax reform
pub fn apply_ubi(dataset: &Dataset, params: &UbiParameters) -> ReformTable {
    let rows = dataset
        .households()
        .iter()
        .map(|h| {
            let basic_income = params.yearly_basic_income(h);
            ReformedHousehold {
                household_id: h.household_id,
                basic_income,
                net_income: h.reform_net_income + basic_income,
                net_income_ahc: h.reform_net_income_ahc + basic_income,
            }
        })
        .collect();

    ReformTable { params: *params, rows }
}

/// Solve the adult amount and pay the resulting budget-neutral UBI
pub fn set_ubi(dataset: &Dataset, params: &UbiParameters) -> Result<(BudgetSolution, ReformTable)> {
    let solution = solve_adult_amount(dataset, params)?;
    let calibrated = params.with_adult(solution.adult_weekly);
    Ok((solution, apply_ubi(dataset, &calibrated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::household::{fixtures, Region};
    use approx::assert_relative_eq;

    fn dataset() -> Dataset {
        let mut single = fixtures::household(1, 100.0, Region::London);
        single.reform_net_income = single.net_income - 5_200.0;

        let mut family = fixtures::household(2, 50.0, Region::Wales);
        family.people = 4;
        family.children = 2;
        family.working_age_adults = 2;
        family.reform_net_income = family.net_income - 10_400.0;

        let mut pensioner = fixtures::household(3, 80.0, Region::Scotland);
        pensioner.working_age_adults = 0;
        pensioner.seniors = 1;
        pensioner.disabled = 1;
        pensioner.reform_net_income = pensioner.net_income - 2_600.0;

        Dataset::from_households(vec![single, family, pensioner]).unwrap()
    }

    #[test]
    fn test_solved_reform_is_budget_neutral() {
        let data = dataset();
        let params = UbiParameters::foundational(150.0, 40.0)
            .with_disability(20.0, 0.0, 0.0)
            .with_region(Region::Wales, 3.0);

        let (solution, table) = set_ubi(&data, &params).unwrap();

        assert_relative_eq!(table.cost(&data), data.revenue(), max_relative = 1e-12);
        assert_relative_eq!(table.net_cost(&data), 0.0, epsilon = 1e-6);
        assert_relative_eq!(solution.fixed_cost + solution.adult_cost, solution.revenue);
        assert_eq!(table.params.adult, solution.adult_weekly);
    }

    #[test]
    fn test_closed_form_adult_amount() {
        let data = dataset();
        // revenue = 100*5200 + 50*10400 + 80*2600 = 1_248_000
        assert_relative_eq!(data.revenue(), 1_248_000.0);

        let solution = solve_adult_amount(&data, &UbiParameters::zero()).unwrap();
        // adult-years = 52 * (100*1 + 50*2) = 10_400
        assert_relative_eq!(solution.adult_weekly, 120.0);
        assert_relative_eq!(solution.adult_yearly(), 6_240.0);
        assert!(solution.is_feasible());
    }

    #[test]
    fn test_adult_input_is_ignored() {
        let data = dataset();
        let a = solve_adult_amount(&data, &UbiParameters::zero()).unwrap();
        let b = solve_adult_amount(&data, &UbiParameters::zero().with_adult(999.0)).unwrap();
        assert_relative_eq!(a.adult_weekly, b.adult_weekly);
    }

    #[test]
    fn test_generous_seniors_make_adult_amount_negative() {
        let data = dataset();
        let params = UbiParameters::foundational(1_000.0, 0.0);
        let solution = solve_adult_amount(&data, &params).unwrap();
        assert!(!solution.is_feasible());

        let (_, table) = set_ubi(&data, &params).unwrap();
        assert_relative_eq!(table.net_cost(&data), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_no_adults_is_an_error() {
        let mut hh = fixtures::household(1, 10.0, Region::London);
        hh.working_age_adults = 0;
        hh.seniors = 1;
        let data = Dataset::from_households(vec![hh]).unwrap();
        assert!(matches!(
            solve_adult_amount(&data, &UbiParameters::zero()),
            Err(Error::NoWorkingAgeAdults)
        ));
    }

    #[test]
    fn test_apply_ubi_adds_to_both_income_measures() {
        let data = dataset();
        let params = UbiParameters::zero().with_adult(10.0);
        let table = apply_ubi(&data, &params);
        let hh = &data.households()[1];
        let row = &table.rows[1];

        assert_eq!(row.household_id, 2);
        assert_relative_eq!(row.basic_income, 2.0 * 10.0 * 52.0);
        assert_relative_eq!(row.net_income, hh.reform_net_income + row.basic_income);
        assert_relative_eq!(row.net_income_ahc, hh.reform_net_income_ahc + row.basic_income);
        assert_relative_eq!(total_cost(data.households(), &params), table.cost(&data));
    }
}
