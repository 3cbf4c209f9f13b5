//! UBI reform definition and budget-neutral calibration

mod params;
mod budget;

pub use params::{UbiParameters, WEEKS_IN_YEAR};
pub use budget::{
    apply_ubi, fixed_cost, set_ubi, solve_adult_amount, total_cost,
    BudgetSolution, ReformTable, ReformedHousehold,
};
