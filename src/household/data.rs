//! Household records matching the microdata extract format

use serde::{Deserialize, Serialize};

/// Number of UK regions in the microdata
pub const REGION_COUNT: usize = 12;

/// UK region of a household, ordered as coded in the microdata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    NorthEast,
    NorthWest,
    Yorkshire,
    EastMidlands,
    WestMidlands,
    EastOfEngland,
    London,
    SouthEast,
    SouthWest,
    Wales,
    Scotland,
    NorthernIreland,
}

impl Region {
    /// All regions in microdata code order
    pub const ALL: [Region; REGION_COUNT] = [
        Region::NorthEast,
        Region::NorthWest,
        Region::Yorkshire,
        Region::EastMidlands,
        Region::WestMidlands,
        Region::EastOfEngland,
        Region::London,
        Region::SouthEast,
        Region::SouthWest,
        Region::Wales,
        Region::Scotland,
        Region::NorthernIreland,
    ];

    /// Region from its integer code (0 = NORTH_EAST)
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Region from its microdata name, e.g. "EAST_OF_ENGLAND"
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.as_str() == name)
    }

    /// Integer code of the region
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Get the string representation used in the microdata
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NorthEast => "NORTH_EAST",
            Region::NorthWest => "NORTH_WEST",
            Region::Yorkshire => "YORKSHIRE",
            Region::EastMidlands => "EAST_MIDLANDS",
            Region::WestMidlands => "WEST_MIDLANDS",
            Region::EastOfEngland => "EAST_OF_ENGLAND",
            Region::London => "LONDON",
            Region::SouthEast => "SOUTH_EAST",
            Region::SouthWest => "SOUTH_WEST",
            Region::Wales => "WALES",
            Region::Scotland => "SCOTLAND",
            Region::NorthernIreland => "NORTHERN_IRELAND",
        }
    }
}

/// One household of the microdata.
///
/// Person-level flags are stored as counts of members carrying the flag,
/// which is how they aggregate when mapped to the household.
/// All incomes are yearly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub household_id: u64,

    /// Survey grossing weight
    pub weight: f64,

    pub people: u32,

    pub region: Region,

    /// Members at State Pension age
    pub seniors: u32,

    pub children: u32,

    pub working_age_adults: u32,

    /// Members claiming any disability benefit
    pub disabled: u32,

    /// Members claiming a middle-rate disability benefit
    pub severely_disabled: u32,

    /// Members claiming a top-rate disability benefit
    pub enhanced_disabled: u32,

    /// Baseline net income before housing costs
    pub net_income: f64,

    /// Baseline net income after housing costs
    pub net_income_ahc: f64,

    /// Net income under the tax reform with no UBI paid, before housing costs
    pub reform_net_income: f64,

    /// Net income under the tax reform with no UBI paid, after housing costs
    pub reform_net_income_ahc: f64,

    pub equivalisation_bhc: f64,

    pub equivalisation_ahc: f64,

    /// Absolute poverty line for this household, before housing costs
    pub poverty_line_bhc: f64,

    /// Absolute poverty line for this household, after housing costs
    pub poverty_line_ahc: f64,
}

impl Household {
    /// Number of people represented by this household in the population
    pub fn person_weight(&self) -> f64 {
        self.weight * self.people as f64
    }

    /// Whether any member claims a disability benefit
    pub fn is_disabled(&self) -> bool {
        self.disabled > 0
    }

    /// Baseline net income divided by the BHC equivalisation factor
    pub fn equivalised_net_income(&self) -> f64 {
        self.net_income / self.equivalisation_bhc
    }

    /// Net income change from the tax reform alone (negative for most households)
    pub fn tax_reform_change(&self) -> f64 {
        self.reform_net_income - self.net_income
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Household with one working-age adult and otherwise neutral values
    pub fn household(id: u64, weight: f64, region: Region) -> Household {
        Household {
            household_id: id,
            weight,
            people: 1,
            region,
            seniors: 0,
            children: 0,
            working_age_adults: 1,
            disabled: 0,
            severely_disabled: 0,
            enhanced_disabled: 0,
            net_income: 20_000.0,
            net_income_ahc: 15_000.0,
            reform_net_income: 18_000.0,
            reform_net_income_ahc: 13_000.0,
            equivalisation_bhc: 1.0,
            equivalisation_ahc: 1.0,
            poverty_line_bhc: 10_000.0,
            poverty_line_ahc: 8_000.0,
        }
    }
}
