//! Load households from a household-level microdata extract

use super::{Household, Region};
use crate::error::{Error, Result};
use csv::Reader;
use std::path::Path;

/// Default file name of the household extract inside the data directory
pub const DEFAULT_HOUSEHOLDS_FILE: &str = "households.csv";

/// Raw CSV row matching the household extract columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    household_id: u64,
    household_weight: f64,
    people_in_household: u32,
    region: String,
    #[serde(rename = "is_SP_age")]
    is_sp_age: u32,
    is_child: u32,
    #[serde(rename = "is_WA_adult")]
    is_wa_adult: u32,
    is_disabled_for_ubi: u32,
    is_severely_disabled_for_ubi: u32,
    is_enhanced_disabled_for_ubi: u32,
    household_net_income: f64,
    household_net_income_ahc: f64,
    reform_net_income: f64,
    reform_net_income_ahc: f64,
    household_equivalisation_bhc: f64,
    household_equivalisation_ahc: f64,
    absolute_poverty_bhc: f64,
    absolute_poverty_ahc: f64,
}

/// Parse a region given either as its name or as its integer code
fn parse_region(raw: &str) -> Result<Region> {
    let raw = raw.trim();
    let region = match raw.parse::<usize>() {
        Ok(index) => Region::from_index(index),
        Err(_) => Region::from_name(raw),
    };
    region.ok_or_else(|| Error::UnknownRegion(raw.to_string()))
}

impl CsvRow {
    fn to_household(self) -> Result<Household> {
        let id = self.household_id;

        if !self.household_weight.is_finite() || self.household_weight < 0.0 {
            return Err(Error::invalid_household(
                id,
                format!("weight must be finite and non-negative, got {}", self.household_weight),
            ));
        }
        if self.people_in_household == 0 {
            return Err(Error::invalid_household(id, "household has no people"));
        }
        let factors = [self.household_equivalisation_bhc, self.household_equivalisation_ahc];
        if factors.iter().any(|f| !(f.is_finite() && *f > 0.0)) {
            return Err(Error::invalid_household(id, "equivalisation factors must be finite and positive"));
        }
        let amounts = [
            ("household_net_income", self.household_net_income),
            ("household_net_income_ahc", self.household_net_income_ahc),
            ("reform_net_income", self.reform_net_income),
            ("reform_net_income_ahc", self.reform_net_income_ahc),
            ("absolute_poverty_bhc", self.absolute_poverty_bhc),
            ("absolute_poverty_ahc", self.absolute_poverty_ahc),
        ];
        if let Some((column, value)) = amounts.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::invalid_household(id, format!("{} must be finite, got {}", column, value)));
        }
        let members = self
            .is_sp_age
            .checked_add(self.is_child)
            .and_then(|n| n.checked_add(self.is_wa_adult))
            .ok_or_else(|| Error::invalid_household(id, "age-group counts overflow"))?;
        if members > self.people_in_household {
            return Err(Error::invalid_household(
                id,
                format!("{} age-group members but only {} people", members, self.people_in_household),
            ));
        }

        let region = parse_region(&self.region)?;

        Ok(Household {
            household_id: id,
            weight: self.household_weight,
            people: self.people_in_household,
            region,
            seniors: self.is_sp_age,
            children: self.is_child,
            working_age_adults: self.is_wa_adult,
            disabled: self.is_disabled_for_ubi,
            severely_disabled: self.is_severely_disabled_for_ubi,
            enhanced_disabled: self.is_enhanced_disabled_for_ubi,
            net_income: self.household_net_income,
            net_income_ahc: self.household_net_income_ahc,
            reform_net_income: self.reform_net_income,
            reform_net_income_ahc: self.reform_net_income_ahc,
            equivalisation_bhc: self.household_equivalisation_bhc,
            equivalisation_ahc: self.household_equivalisation_ahc,
            poverty_line_bhc: self.absolute_poverty_bhc,
            poverty_line_ahc: self.absolute_poverty_ahc,
        })
    }
}

/// Load all households from a CSV file
pub fn load_households<P: AsRef<Path>>(path: P) -> Result<Vec<Household>> {
    let reader = Reader::from_path(path.as_ref())?;
    let households = read_rows(reader)?;
    log::info!("Loaded {} households from {}", households.len(), path.as_ref().display());
    Ok(households)
}

/// Load households from any reader (e.g., string buffer, network stream)
pub fn load_households_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<Household>> {
    read_rows(Reader::from_reader(reader))
}

fn read_rows<R: std::io::Read>(mut reader: Reader<R>) -> Result<Vec<Household>> {
    let mut households = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        households.push(row.to_household()?);
    }

    if households.is_empty() {
        return Err(Error::EmptyDataset);
    }

    Ok(households)
}
