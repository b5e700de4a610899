//! Hourly supply- and consumption-based emission factors for the Ontario grid.

pub mod cli;
/// TOML run configuration and parameter-table overrides.
pub mod config;
/// Core emission-factor calculation.
pub mod ef;
pub mod error;
pub mod io;
pub mod telemetry;
