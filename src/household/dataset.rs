//! Loaded microdata together with the UBI budget it implies

use super::{load_households, Household};
use crate::error::{Error, Result};
use std::path::Path;

/// Households plus the revenue raised by the tax reform before any UBI is paid
#[derive(Debug, Clone)]
pub struct Dataset {
    households: Vec<Household>,
    revenue: f64,
}

impl Dataset {
    /// Build a dataset and compute its budget
    pub fn from_households(households: Vec<Household>) -> Result<Self> {
        if households.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let revenue = tax_reform_revenue(&households);
        if !revenue.is_finite() {
            let id = households
                .iter()
                .find(|h| !(h.weight * h.tax_reform_change()).is_finite())
                .map_or(0, |h| h.household_id);
            return Err(Error::invalid_household(id, "weight or net income is not finite"));
        }
        Ok(Self { households, revenue })
    }

    /// Load a household extract from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dataset = Self::from_households(load_households(path)?)?;
        log::info!(
            "Tax reform raises {} per year",
            crate::report::format_gbp(dataset.revenue)
        );
        Ok(dataset)
    }

    pub fn households(&self) -> &[Household] {
        &self.households
    }

    /// Yearly revenue available for UBI spending
    pub fn revenue(&self) -> f64 {
        self.revenue
    }

    pub fn len(&self) -> usize {
        self.households.len()
    }

    pub fn is_empty(&self) -> bool {
        self.households.is_empty()
    }

    /// Weighted number of people
    pub fn population(&self) -> f64 {
        self.households.iter().map(Household::person_weight).sum()
    }
}

/// Yearly revenue raised by removing benefits and flattening tax,
/// i.e. the weighted net income households lose under the reform without UBI
pub fn tax_reform_revenue(households: &[Household]) -> f64 {
    -households
        .iter()
        .map(|h| h.weight * h.tax_reform_change())
        .sum::<f64>()
}
