//! Household microdata and loading

mod data;
mod dataset;
pub mod loader;

pub use data::{Household, Region, REGION_COUNT};
pub use dataset::Dataset;
pub use loader::{load_households, load_households_from_reader, DEFAULT_HOUSEHOLDS_FILE};

#[cfg(test)]
pub(crate) use data::fixtures;
