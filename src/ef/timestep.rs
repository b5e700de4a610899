//! Hourly timestep keys carried alongside every row.

use std::fmt;

use chrono::NaiveDate;

use crate::error::{EfError, Result};

/// Date layouts seen in the public IESO reports.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y"];

/// One delivery hour: a calendar date plus an hour-ending index in `1..=24`.
///
/// Ordering is chronological (date first, then hour).
///
/// # Examples
///
/// ```
/// use ontario_ef::ef::timestep::Timestep;
///
/// let ts = Timestep::parse("2020-01-01", "24").unwrap();
/// assert_eq!(ts.hour(), 24);
/// assert_eq!(ts.to_string(), "2020-01-01 H24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestep {
    date: NaiveDate,
    hour: u8,
}

impl Timestep {
    /// Builds a timestep, rejecting hours outside `1..=24`.
    pub fn new(date: NaiveDate, hour: u8) -> Result<Self> {
        if !(1..=24).contains(&hour) {
            return Err(EfError::MalformedTimestep {
                date: date.to_string(),
                hour: hour.to_string(),
            });
        }
        Ok(Self { date, hour })
    }

    /// Parses raw date and hour cells.
    ///
    /// Hours may be written as floats (`"1.0"`) by some exports; anything
    /// that is not a whole number in `1..=24` is rejected.
    pub fn parse(date: &str, hour: &str) -> Result<Self> {
        let malformed = || EfError::MalformedTimestep {
            date: date.to_string(),
            hour: hour.to_string(),
        };

        let date_trimmed = date.trim();
        let parsed_date = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(date_trimmed, fmt).ok())
            .ok_or_else(malformed)?;

        let hour_value: f64 = hour.trim().parse().map_err(|_| malformed())?;
        if hour_value.fract() != 0.0 || !(1.0..=24.0).contains(&hour_value) {
            return Err(malformed());
        }

        Ok(Self {
            date: parsed_date,
            hour: hour_value as u8,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Hour-ending index, `1..=24`.
    pub fn hour(&self) -> u8 {
        self.hour
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} H{:02}", self.date.format("%Y-%m-%d"), self.hour)
    }
}

/// Checks that `found` sits at the same position as `expected`.
pub(crate) fn ensure_aligned(
    series: &'static str,
    index: usize,
    expected: Timestep,
    found: Timestep,
) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(EfError::TimestepMismatch {
            series,
            index,
            expected,
            found,
        })
    }
}
