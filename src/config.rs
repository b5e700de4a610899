//! TOML-based run configuration, built-in parameter defaults, and
//! `KEY=VALUE` overrides.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ef::tables::{
    EmissionRateTable, MissingPolicy, Neighbor, NeighborFactorTable, Parameters, RegionCode,
};
use crate::ef::technology::Technology;
use crate::error::{EfError, Result};
use crate::io::tables::{read_factor_table, read_rate_table};

/// Default technology emission rates (t CO2e/GWh).
pub const DEFAULT_EMISSION_RATES: [(Technology, f64); Technology::COUNT] = [
    (Technology::Biofuel, 6.15),
    (Technology::Hydro, 0.0),
    (Technology::NaturalGas, 525.0),
    (Technology::Nuclear, 0.15),
    (Technology::Solar, 6.15),
    (Technology::Wind, 0.74),
];

/// Earliest and latest accepted analysis years.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 2002..=2100;

/// Top-level run configuration parsed from TOML.
///
/// Every section is optional. A `[emission_rates]` or `[neighbor_factors]`
/// section replaces the built-in table as a whole, so a technology left out
/// of it is genuinely missing and subject to `run.missing_rate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Year, file locations and lookup policies.
    #[serde(default)]
    pub run: RunSection,
    /// Technology name → t CO2e/GWh.
    #[serde(default = "default_emission_rates")]
    pub emission_rates: BTreeMap<String, f64>,
    /// Region name → t CO2e/GWh.
    #[serde(default = "default_neighbor_factors")]
    pub neighbor_factors: BTreeMap<String, f64>,
}

/// Year, file locations and lookup policies.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    /// Analysis year.
    pub year: i32,
    /// Root holding `IESO/<year>/...` raw reports.
    pub data_dir: PathBuf,
    /// Destination for the output series.
    pub output_dir: PathBuf,
    /// Policy for a technology absent from the rate table.
    pub missing_rate: MissingPolicy,
    /// Policy for an interconnection region absent from the factor table.
    pub missing_region: MissingPolicy,
    /// Optional CSV replacing `[emission_rates]`.
    pub emission_rates_csv: Option<PathBuf>,
    /// Optional CSV replacing `[neighbor_factors]`.
    pub neighbor_factors_csv: Option<PathBuf>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            year: 2020,
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("data/output"),
            missing_rate: MissingPolicy::Fail,
            missing_region: MissingPolicy::Zero,
            emission_rates_csv: None,
            neighbor_factors_csv: None,
        }
    }
}

fn default_emission_rates() -> BTreeMap<String, f64> {
    DEFAULT_EMISSION_RATES
        .into_iter()
        .map(|(t, v)| (t.name().to_string(), v))
        .collect()
}

fn default_neighbor_factors() -> BTreeMap<String, f64> {
    Neighbor::ALL
        .into_iter()
        .map(|n| (n.name().to_string(), n.default_factor_t_per_gwh()))
        .collect()
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"run.year"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run: RunSection::default(),
            emission_rates: default_emission_rates(),
            neighbor_factors: default_neighbor_factors(),
        }
    }
}

impl RunConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
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
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Replaces the inline tables with the CSV tables named in `[run]`, if any.
    ///
    /// # Errors
    ///
    /// Propagates read and format errors from the table files.
    pub fn load_table_files(&mut self) -> Result<()> {
        if let Some(path) = &self.run.emission_rates_csv {
            self.emission_rates = read_rate_table(path)?;
        }
        if let Some(path) = &self.run.neighbor_factors_csv {
            self.neighbor_factors = read_factor_table(path)?;
        }
        Ok(())
    }

    /// Applies a `TECH=VALUE` override (t CO2e/GWh).
    ///
    /// Technology names match case-insensitively; an existing entry for the
    /// same technology is replaced whatever its spelling.
    pub fn apply_rate_override(&mut self, raw: &str) -> Result<()> {
        let (key, value) = split_override(raw)?;
        let tech: Technology = key.parse().map_err(|_| EfError::InvalidOverride {
            raw: raw.to_string(),
            reason: format!("unknown technology {key:?}"),
        })?;
        self.emission_rates
            .retain(|name, _| name.parse::<Technology>().ok() != Some(tech));
        self.emission_rates.insert(tech.name().to_string(), value);
        Ok(())
    }

    /// Applies a `REGION=VALUE` override (t CO2e/GWh).
    ///
    /// Any existing entry reducing to the same region code is replaced.
    pub fn apply_factor_override(&mut self, raw: &str) -> Result<()> {
        let (key, value) = split_override(raw)?;
        let code = RegionCode::from_region_name(key);
        self.neighbor_factors
            .retain(|name, _| RegionCode::from_region_name(name) != code);
        self.neighbor_factors.insert(key.to_string(), value);
        Ok(())
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !YEAR_RANGE.contains(&self.run.year) {
            errors.push(ConfigError::new(
                "run.year",
                format!(
                    "must be in {}..={}, got {}",
                    YEAR_RANGE.start(),
                    YEAR_RANGE.end(),
                    self.run.year
                ),
            ));
        }

        for (name, value) in &self.emission_rates {
            let field = format!("emission_rates.{name}");
            if name.parse::<Technology>().is_err() {
                errors.push(ConfigError::new(&field, "unknown technology"));
            }
            if !value.is_finite() || *value < 0.0 {
                errors.push(ConfigError::new(&field, "must be a finite number >= 0"));
            }
        }

        let mut seen: BTreeMap<Technology, &str> = BTreeMap::new();
        for name in self.emission_rates.keys() {
            if let Ok(tech) = name.parse::<Technology>() {
                if let Some(previous) = seen.insert(tech, name) {
                    errors.push(ConfigError::new(
                        format!("emission_rates.{name}"),
                        format!("duplicates {previous:?}"),
                    ));
                }
            }
        }

        let mut codes: BTreeMap<RegionCode, &str> = BTreeMap::new();
        for (name, value) in &self.neighbor_factors {
            let field = format!("neighbor_factors.{name}");
            if name.trim().is_empty() {
                errors.push(ConfigError::new(&field, "region name must not be empty"));
            }
            if !value.is_finite() || *value < 0.0 {
                errors.push(ConfigError::new(&field, "must be a finite number >= 0"));
            }
            let code = RegionCode::from_region_name(name);
            if let Some(previous) = codes.insert(code.clone(), name) {
                errors.push(ConfigError::new(
                    &field,
                    format!("region code {code} already used by {previous:?}"),
                ));
            }
        }

        errors
    }

    /// Builds the immutable parameter tables for a run.
    ///
    /// Call after [`RunConfig::validate`] returns no errors.
    pub fn parameters(&self) -> Result<Parameters> {
        let mut rates = BTreeMap::new();
        for (name, value) in &self.emission_rates {
            rates.insert(name.parse::<Technology>()?, *value);
        }
        let rates = EmissionRateTable::from_gwh(&rates, self.run.missing_rate)?;
        let neighbors = NeighborFactorTable::from_gwh(
            self.neighbor_factors.iter().map(|(k, v)| (k.as_str(), *v)),
            self.run.missing_region,
        )?;
        Ok(Parameters { rates, neighbors })
    }
}

fn split_override(raw: &str) -> Result<(&str, f64)> {
    let invalid = |reason: &str| EfError::InvalidOverride {
        raw: raw.to_string(),
        reason: reason.to_string(),
    };
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| invalid("expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid("empty key"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| invalid("value is not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid("value must be a finite number >= 0"));
    }
    Ok((key, value))
}
