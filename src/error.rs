//! Error taxonomy for emission-factor runs.
//!
//! Every variant here is fatal: the run stops and no output series is
//! written. Degraded data (unknown interconnection regions, unreadable
//! generation cells) never reaches this type; it is logged and defaulted
//! to zero where it occurs.

use std::path::PathBuf;

use thiserror::Error;

use crate::ef::technology::Technology;
use crate::ef::timestep::Timestep;

/// Fatal failure of an emission-factor run.
#[derive(Debug, Error)]
pub enum EfError {
    /// The three input series differ in length.
    #[error(
        "input series length mismatch: generation={generation}, demand={demand}, interchange={interchange}"
    )]
    LengthMismatch {
        generation: usize,
        demand: usize,
        interchange: usize,
    },

    /// Two series disagree on the timestep at the same position.
    #[error("{series} row {index} is {found}, expected {expected}")]
    TimestepMismatch {
        series: &'static str,
        index: usize,
        expected: Timestep,
        found: Timestep,
    },

    /// A row's (date, hour) key could not be parsed.
    #[error("malformed timestep key: date {date:?}, hour {hour:?}")]
    MalformedTimestep { date: String, hour: String },

    /// A technology has no emission rate and the rate policy is `fail`.
    #[error("no emission rate configured for {0}")]
    MissingRate(Technology),

    /// An interconnection region has no factor and the region policy is `fail`.
    #[error("no emission factor configured for region code {code:?} (column {column:?})")]
    MissingRegion { code: String, column: String },

    /// A `KEY=VALUE` override could not be applied.
    #[error("invalid override {raw:?}: {reason}")]
    InvalidOverride { raw: String, reason: String },

    /// Two region names in the factor table reduce to the same code.
    #[error("region {second:?} reduces to code {code}, already used by {first:?}")]
    RegionCollision {
        code: String,
        first: String,
        second: String,
    },

    /// A parameter table lists the same key twice.
    #[error("{table} table lists {key:?} more than once")]
    DuplicateKey { table: &'static str, key: String },

    /// A technology name is not part of the fixed vocabulary.
    #[error("unknown technology {0:?}")]
    UnknownTechnology(String),

    /// A row carries a different number of values than its header.
    #[error("{series} row {index} has {found} values, header has {expected}")]
    RowWidth {
        series: &'static str,
        index: usize,
        expected: usize,
        found: usize,
    },

    /// An input file is structurally unusable.
    #[error("{}: {message}", path.display())]
    Input { path: PathBuf, message: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EfError>;

impl EfError {
    /// Shorthand for [`EfError::Input`].
    pub fn input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Input {
            path: path.into(),
            message: message.into(),
        }
    }
}
