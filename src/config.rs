//! Pipeline configuration: file locations and analysis options
//!
//! Resolved in layers: defaults, then an optional JSON file, then
//! environment variables (`UBI_DATA_DIR`, `UBI_OUTPUT_DIR`, `UBI_POPULATION`),
//! then command-line flags applied by the binaries.

use crate::error::Result;
use crate::household::DEFAULT_HOUSEHOLDS_FILE;
use crate::metrics::Population;
use crate::scenario::DEFAULT_VARIANTS_FILE;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Default path to the data directory
pub const DEFAULT_DATA_PATH: &str = "data";

/// Default path for generated reports
pub const DEFAULT_OUTPUT_PATH: &str = "output";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    /// Household extract, relative to `data_dir`
    pub households_file: String,
    /// Reform variants table, relative to `data_dir`
    pub variants_file: String,
    pub output_dir: PathBuf,
    /// Round variant amounts to whole pounds before solving
    pub round_parameters: bool,
    /// Population whose members weight the loss metrics
    pub population: Population,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_PATH),
            households_file: DEFAULT_HOUSEHOLDS_FILE.to_string(),
            variants_file: DEFAULT_VARIANTS_FILE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_PATH),
            round_parameters: true,
            population: Population::Everyone,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Load from an optional JSON file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_json_path(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override fields from environment variables when set
    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = env::var("UBI_DATA_DIR").ok().filter(|s| !s.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env::var("UBI_OUTPUT_DIR").ok().filter(|s| !s.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        match env::var("UBI_POPULATION").ok().map(|s| s.parse::<Population>()) {
            Some(Ok(population)) => self.population = population,
            Some(Err(e)) => log::warn!("Ignoring UBI_POPULATION: {}", e),
            None => {}
        }
    }

    pub fn households_path(&self) -> PathBuf {
        self.data_dir.join(&self.households_file)
    }

    pub fn variants_path(&self) -> PathBuf {
        self.data_dir.join(&self.variants_file)
    }
}
