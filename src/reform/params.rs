//! Weekly UBI amounts and the per-household basic income they imply

use crate::household::{Household, Region, REGION_COUNT};
use serde::{Deserialize, Serialize};

/// Weeks per year used to annualise weekly amounts
pub const WEEKS_IN_YEAR: f64 = 52.0;

/// Weekly UBI amounts by recipient group.
///
/// Disability supplements stack: a person on a top-rate benefit also counts
/// as disabled and severely disabled when the microdata flags them so.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UbiParameters {
    /// Per person at State Pension age
    pub senior: f64,
    /// Per working-age adult
    pub adult: f64,
    /// Per child
    pub child: f64,
    /// Supplement for anyone claiming a disability benefit
    pub dis_base: f64,
    /// Supplement for middle-rate disability benefit claimants
    pub dis_severe: f64,
    /// Supplement for top-rate disability benefit claimants
    pub dis_enhanced: f64,
    /// Per-person supplement by region, indexed by region code
    pub geo: [f64; REGION_COUNT],
}

impl UbiParameters {
    /// No UBI at all
    pub fn zero() -> Self {
        Self {
            senior: 0.0,
            adult: 0.0,
            child: 0.0,
            dis_base: 0.0,
            dis_severe: 0.0,
            dis_enhanced: 0.0,
            geo: [0.0; REGION_COUNT],
        }
    }

    /// Age-based amounts only
    pub fn foundational(senior: f64, child: f64) -> Self {
        Self::zero().with_senior(senior).with_child(child)
    }

    pub fn with_senior(mut self, amount: f64) -> Self {
        self.senior = amount;
        self
    }

    pub fn with_adult(mut self, amount: f64) -> Self {
        self.adult = amount;
        self
    }

    pub fn with_child(mut self, amount: f64) -> Self {
        self.child = amount;
        self
    }

    pub fn with_disability(mut self, base: f64, severe: f64, enhanced: f64) -> Self {
        self.dis_base = base;
        self.dis_severe = severe;
        self.dis_enhanced = enhanced;
        self
    }

    pub fn with_region(mut self, region: Region, amount: f64) -> Self {
        self.geo[region.index()] = amount;
        self
    }

    /// Round every amount to whole pounds
    pub fn rounded(&self) -> Self {
        let mut geo = self.geo;
        for g in geo.iter_mut() {
            *g = g.round();
        }
        Self {
            senior: self.senior.round(),
            adult: self.adult.round(),
            child: self.child.round(),
            dis_base: self.dis_base.round(),
            dis_severe: self.dis_severe.round(),
            dis_enhanced: self.dis_enhanced.round(),
            geo,
        }
    }

    /// Regional supplement for a region
    pub fn geo_for(&self, region: Region) -> f64 {
        self.geo[region.index()]
    }

    /// Weekly UBI paid to a household, excluding the adult component
    pub fn weekly_fixed_income(&self, household: &Household) -> f64 {
        self.senior * household.seniors as f64
            + self.child * household.children as f64
            + self.dis_base * household.disabled as f64
            + self.dis_severe * household.severely_disabled as f64
            + self.dis_enhanced * household.enhanced_disabled as f64
            + self.geo_for(household.region) * household.people as f64
    }

    /// Weekly UBI paid to a household
    pub fn weekly_basic_income(&self, household: &Household) -> f64 {
        self.weekly_fixed_income(household) + self.adult * household.working_age_adults as f64
    }

    /// Yearly UBI paid to a household
    pub fn yearly_basic_income(&self, household: &Household) -> f64 {
        self.weekly_basic_income(household) * WEEKS_IN_YEAR
    }
}

impl Default for UbiParameters {
    fn default() -> Self {
        Self::zero()
    }
}
