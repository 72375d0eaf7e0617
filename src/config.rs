//! TOML-based testbench configuration.
//!
//! Every field defaults to the fixed domain constants of the solar home
//! testbench, so an empty document yields the reference setup.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::error::BenchError;
use crate::params::TestbenchParameters;

/// Name of the historical source file under the crate's `data` directory.
pub const DATA_FILE_NAME: &str = "data_2011-2012.csv";

/// Top-level testbench configuration parsed from TOML.
///
/// Load with [`BenchConfig::from_toml_file`] or use
/// [`BenchConfig::default`] for the built-in reference values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    /// Storage, PV and grid sizing.
    #[serde(default)]
    pub testbench: TestbenchConfig,
    /// Two-tier grid tariff.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Source file location and extraction windows.
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Output location for saved result sets.
    #[serde(default)]
    pub results: ResultsConfig,
}

/// Storage, PV and grid sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestbenchConfig {
    /// Storage capacity (kWh).
    pub e_rated: f64,
    /// PV panel size (kWp).
    pub p_pvp: f64,
    /// Subscribed grid capacity (kW).
    pub p_grid_max: Option<f64>,
}

impl Default for TestbenchConfig {
    fn default() -> Self {
        Self {
            e_rated: 8.0,
            p_pvp: 4.0,
            p_grid_max: Some(3.0),
        }
    }
}

impl TestbenchConfig {
    /// Builds the validated, immutable parameter set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a value is not strictly positive.
    pub fn parameters(&self) -> Result<TestbenchParameters, BenchError> {
        TestbenchParameters::new(self.e_rated, self.p_pvp, self.p_grid_max)
    }
}

/// Two-tier grid tariff: night price before `night_end_hour`, day price after.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Price during `[0, night_end_hour)` (€/kWh).
    pub night_price: f64,
    /// Price during `[night_end_hour, 24)` (€/kWh).
    pub day_price: f64,
    /// Hour of day at which the day price starts.
    pub night_end_hour: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            night_price: 0.10,
            day_price: 0.20,
            night_end_hour: 6.0,
        }
    }
}

/// Source file location and extraction windows.
///
/// Dates are written as quoted strings in TOML, e.g. `test_start = "2011-11-29"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// Historical half-hourly CSV file.
    pub path: PathBuf,
    /// First day of the test window.
    pub test_start: NaiveDate,
    /// First day of the training window.
    pub train_start: NaiveDate,
    /// Source column holding the house load (kW).
    pub load_column: String,
    /// Source column holding the solar production of the reference panel.
    pub solar_column: String,
    /// Divisor turning the reference panel output into kW per kWp.
    pub solar_calibration: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            test_start: NaiveDate::from_ymd_opt(2011, 11, 29).unwrap_or_default(),
            train_start: NaiveDate::from_ymd_opt(2011, 10, 29).unwrap_or_default(),
            load_column: "GC".to_string(),
            solar_column: "GG".to_string(),
            solar_calibration: 1.04,
        }
    }
}

impl DatasetConfig {
    /// Days between the training and test window starts.
    ///
    /// Training extractions longer than this overlap the test window.
    pub fn train_test_gap_days(&self) -> i64 {
        (self.test_start - self.train_start).num_days()
    }
}

/// Output location for saved result sets.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResultsConfig {
    /// Directory receiving `<name>_{meta,stat,traj}.csv`.
    pub dir: PathBuf,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
        }
    }
}

/// Conventional location of the source file, relative to the crate root.
pub fn default_data_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join(DATA_FILE_NAME)
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"tariff.night_end_hour"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl BenchConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let tb = &self.testbench;
        if !is_positive(tb.e_rated) {
            errors.push(ConfigError::new("testbench.e_rated", "must be > 0"));
        }
        if !is_positive(tb.p_pvp) {
            errors.push(ConfigError::new("testbench.p_pvp", "must be > 0"));
        }
        if tb.p_grid_max.is_some_and(|p| !is_positive(p)) {
            errors.push(ConfigError::new("testbench.p_grid_max", "must be > 0"));
        }

        let tariff = &self.tariff;
        if !is_non_negative(tariff.night_price) {
            errors.push(ConfigError::new("tariff.night_price", "must be >= 0"));
        }
        if !is_non_negative(tariff.day_price) {
            errors.push(ConfigError::new("tariff.day_price", "must be >= 0"));
        }
        if !(0.0..=24.0).contains(&tariff.night_end_hour) {
            errors.push(ConfigError::new(
                "tariff.night_end_hour",
                "must be in [0.0, 24.0]",
            ));
        }

        let ds = &self.dataset;
        if ds.train_start >= ds.test_start {
            errors.push(ConfigError::new(
                "dataset.train_start",
                "must be before dataset.test_start",
            ));
        }
        if ds.load_column.is_empty() {
            errors.push(ConfigError::new("dataset.load_column", "must not be empty"));
        }
        if ds.solar_column.is_empty() {
            errors.push(ConfigError::new("dataset.solar_column", "must not be empty"));
        }
        if !is_positive(ds.solar_calibration) {
            errors.push(ConfigError::new("dataset.solar_calibration", "must be > 0"));
        }

        errors
    }

    /// Validates the configuration, returning the first error.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` reported by [`BenchConfig::validate`].
    pub fn check(&self) -> Result<(), ConfigError> {
        match self.validate().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// NaN fails both
fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn is_non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}
