use std::path::PathBuf;

use clap::Parser;

use crate::config::RunConfig;
use crate::error::Result;

/// Hourly supply- and consumption-based emission factors for Ontario.
#[derive(Debug, Parser)]
#[command(name = "ontario-ef", version, long_about = None)]
pub struct CliOptions {
    /// TOML run configuration
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Analysis year (overrides `run.year`)
    #[arg(long)]
    pub year: Option<i32>,

    /// Root holding `IESO/<year>/...` raw reports
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Destination for the output series
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Technology emission rate override in t CO2e/GWh, e.g. `"Natural Gas=490"`
    #[arg(long = "emission-rate", value_name = "TECH=VALUE")]
    pub emission_rates: Vec<String>,

    /// Neighbouring-region factor override in t CO2e/GWh, e.g. `Michigan=480`
    #[arg(long = "neighbor-factor", value_name = "REGION=VALUE")]
    pub neighbor_factors: Vec<String>,

    /// Recompute even if the consumption-based output already exists
    #[arg(long)]
    pub force: bool,

    /// Also write the annual summary as JSON
    #[arg(long, value_name = "PATH")]
    pub summary_json: Option<PathBuf>,

    /// Log as one JSON object per line
    #[arg(long)]
    pub log_json: bool,
}

impl CliOptions {
    /// Loads the configuration file (or defaults) and layers the
    /// command-line values on top.
    ///
    /// Table files named in the config are read before the `KEY=VALUE`
    /// overrides, so an override always wins.
    pub fn resolve_config(&self) -> anyhow::Result<RunConfig> {
        let mut cfg = match &self.config {
            Some(path) => RunConfig::from_toml_file(path)?,
            None => RunConfig::default(),
        };
        self.apply_to(&mut cfg)?;
        Ok(cfg)
    }

    fn apply_to(&self, cfg: &mut RunConfig) -> Result<()> {
        if let Some(year) = self.year {
            cfg.run.year = year;
        }
        if let Some(dir) = &self.data_dir {
            cfg.run.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            cfg.run.output_dir = dir.clone();
        }
        cfg.load_table_files()?;
        for raw in &self.emission_rates {
            cfg.apply_rate_override(raw)?;
        }
        for raw in &self.neighbor_factors {
            cfg.apply_factor_override(raw)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::try_parse_from(std::iter::once("ontario-ef").chain(args.iter().copied()))
            .expect("args should parse")
    }

    #[test]
    fn no_args_uses_defaults() {
        let opts = parse(&[]);
        assert!(opts.config.is_none());
        assert!(!opts.force);
        let cfg = opts.resolve_config().unwrap();
        assert_eq!(cfg.run.year, 2020);
    }

    #[test]
    fn repeated_overrides_are_collected() {
        let opts = parse(&[
            "--emission-rate",
            "Natural Gas=490",
            "--emission-rate",
            "wind=1",
            "--neighbor-factor",
            "Michigan=480",
        ]);
        assert_eq!(opts.emission_rates.len(), 2);
        let cfg = opts.resolve_config().unwrap();
        assert_eq!(cfg.emission_rates.get("Natural Gas"), Some(&490.0));
        assert_eq!(cfg.emission_rates.get("Wind"), Some(&1.0));
        assert_eq!(cfg.neighbor_factors.get("Michigan"), Some(&480.0));
    }

    #[test]
    fn paths_and_year_override_config() {
        let opts = parse(&["--year", "2022", "--data-dir", "raw", "--output-dir", "out"]);
        let cfg = opts.resolve_config().unwrap();
        assert_eq!(cfg.run.year, 2022);
        assert_eq!(cfg.run.data_dir, PathBuf::from("raw"));
        assert_eq!(cfg.run.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn malformed_override_is_an_error() {
        let opts = parse(&["--emission-rate", "coal=900"]);
        assert!(opts.resolve_config().is_err());
        let opts = parse(&["--neighbor-factor", "Quebec"]);
        assert!(opts.resolve_config().is_err());
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let result = CliOptions::try_parse_from(["ontario-ef", "--no-such-flag"]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let opts = parse(&["--config", "does/not/exist.toml"]);
        let err = opts.resolve_config().expect_err("must fail");
        assert!(err.to_string().contains("does/not/exist.toml"));
    }
}
