//! Generation technologies and the per-timestep technology aggregator.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::timestep::Timestep;
use crate::error::{EfError, Result};

/// Fixed generation technology vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Technology {
    Biofuel,
    Hydro,
    NaturalGas,
    Nuclear,
    Solar,
    Wind,
}

impl Technology {
    pub const COUNT: usize = 6;

    /// All technologies in table order.
    pub const ALL: [Technology; Self::COUNT] = [
        Technology::Biofuel,
        Technology::Hydro,
        Technology::NaturalGas,
        Technology::Nuclear,
        Technology::Solar,
        Technology::Wind,
    ];

    /// Single-letter prefix used by generator column names.
    pub fn code(self) -> char {
        match self {
            Technology::Biofuel => 'B',
            Technology::Hydro => 'H',
            Technology::NaturalGas => 'G',
            Technology::Nuclear => 'N',
            Technology::Solar => 'S',
            Technology::Wind => 'W',
        }
    }

    /// Inverse of [`Technology::code`]. Matching is exact (upper-case).
    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    /// Display name as used in rate tables.
    pub fn name(self) -> &'static str {
        match self {
            Technology::Biofuel => "Biofuel",
            Technology::Hydro => "Hydro",
            Technology::NaturalGas => "Natural Gas",
            Technology::Nuclear => "Nuclear",
            Technology::Solar => "Solar",
            Technology::Wind => "Wind",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Technology {
    type Err = EfError;

    /// Case-insensitive; spaces, hyphens and underscores are ignored so
    /// `natural_gas`, `NATURAL GAS` and `Natural Gas` all match.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|t| t.name().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| EfError::UnknownTechnology(s.trim().to_string()))
    }
}

/// Technology resolved from a generator column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTechnology {
    Known(Technology),
    /// Column whose leading character maps to no technology; it is excluded
    /// from every total.
    Unknown(String),
}

impl ColumnTechnology {
    /// Classifies a generator column by its leading character.
    pub fn classify(column: &str) -> Self {
        match column.chars().next().and_then(Technology::from_code) {
            Some(tech) => ColumnTechnology::Known(tech),
            None => ColumnTechnology::Unknown(column.to_string()),
        }
    }
}

/// One raw row of per-generator output, as read from the wide table.
#[derive(Debug, Clone)]
pub struct GenerationRecord {
    pub date: String,
    pub hour: String,
    /// Cell text for each generator column, in header order.
    pub cells: Vec<String>,
}

/// Technology-level output totals for one timestep (MWh).
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyOutputRow {
    pub timestep: Timestep,
    outputs: [f64; Technology::COUNT],
}

impl TechnologyOutputRow {
    /// Row with every technology at zero.
    pub fn zeroed(timestep: Timestep) -> Self {
        Self {
            timestep,
            outputs: [0.0; Technology::COUNT],
        }
    }

    /// Builds a row from explicit `(technology, MWh)` pairs; unlisted
    /// technologies are zero and repeated entries accumulate.
    pub fn from_pairs(
        timestep: Timestep,
        pairs: impl IntoIterator<Item = (Technology, f64)>,
    ) -> Self {
        let mut row = Self::zeroed(timestep);
        for (tech, mwh) in pairs {
            row.add(tech, mwh);
        }
        row
    }

    pub fn get(&self, tech: Technology) -> f64 {
        self.outputs[tech.index()]
    }

    fn add(&mut self, tech: Technology, mwh: f64) {
        self.outputs[tech.index()] += mwh;
    }

    /// `(technology, MWh)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Technology, f64)> + '_ {
        Technology::ALL.into_iter().map(|t| (t, self.get(t)))
    }
}

/// Reads a generation cell; blanks, text and non-finite values count as zero.
pub fn parse_output_cell(cell: &str) -> f64 {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Collapses per-generator columns into technology totals.
///
/// The column classification is resolved once from the header and reused
/// for every row.
#[derive(Debug, Clone)]
pub struct TechnologyAggregator {
    columns: Vec<ColumnTechnology>,
}

impl TechnologyAggregator {
    /// Builds an aggregator for the given generator column names.
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        let columns: Vec<ColumnTechnology> = columns
            .iter()
            .map(|c| ColumnTechnology::classify(c.as_ref()))
            .collect();

        let unknown = columns
            .iter()
            .filter(|c| matches!(c, ColumnTechnology::Unknown(_)))
            .count();
        debug!(
            columns = columns.len(),
            unknown, "technology aggregator ready"
        );

        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnTechnology] {
        &self.columns
    }

    /// Columns excluded from every technology total.
    pub fn unknown_columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| match c {
            ColumnTechnology::Unknown(name) => Some(name.as_str()),
            ColumnTechnology::Known(_) => None,
        })
    }

    /// Sums one raw row into technology totals.
    ///
    /// Cells past the end of a short row count as missing (zero).
    ///
    /// # Errors
    ///
    /// Returns [`EfError::MalformedTimestep`] if the row's date or hour does
    /// not parse. Cell contents never cause an error.
    pub fn aggregate(&self, record: &GenerationRecord) -> Result<TechnologyOutputRow> {
        let timestep = Timestep::parse(&record.date, &record.hour)?;
        let mut row = TechnologyOutputRow::zeroed(timestep);

        for (column, cell) in self.columns.iter().zip(&record.cells) {
            if let ColumnTechnology::Known(tech) = column {
                row.add(*tech, parse_output_cell(cell));
            }
        }

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cells: &[&str]) -> GenerationRecord {
        GenerationRecord {
            date: "2020-01-01".to_string(),
            hour: "1".to_string(),
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn codes_round_trip_for_every_technology() {
        for tech in Technology::ALL {
            assert_eq!(Technology::from_code(tech.code()), Some(tech));
        }
        assert_eq!(Technology::from_code('X'), None);
    }

    #[test]
    fn names_parse_loosely() {
        assert_eq!("natural gas".parse::<Technology>().ok(), Some(Technology::NaturalGas));
        assert_eq!("NATURAL_GAS".parse::<Technology>().ok(), Some(Technology::NaturalGas));
        assert_eq!(" wind ".parse::<Technology>().ok(), Some(Technology::Wind));
        assert!("coal".parse::<Technology>().is_err());
    }

    #[test]
    fn sums_columns_by_prefix() {
        let agg = TechnologyAggregator::from_columns(&[
            "HYDRO - A",
            "HYDRO - B",
            "GAS - C",
            "NUCLEAR - D",
        ]);
        let row = agg.aggregate(&record(&["100", "50.5", "20", "800"])).expect("row");
        assert_eq!(row.get(Technology::Hydro), 150.5);
        assert_eq!(row.get(Technology::NaturalGas), 20.0);
        assert_eq!(row.get(Technology::Nuclear), 800.0);
        assert_eq!(row.get(Technology::Wind), 0.0);
    }

    #[test]
    fn unknown_prefix_columns_are_excluded() {
        let agg = TechnologyAggregator::from_columns(&["WIND - A", "OTHER - B", "x - C"]);
        let row = agg.aggregate(&record(&["10", "999", "999"])).expect("row");
        let total: f64 = row.iter().map(|(_, v)| v).sum();
        assert_eq!(total, 10.0);
        let unknown: Vec<&str> = agg.unknown_columns().collect();
        assert_eq!(unknown, vec!["OTHER - B", "x - C"]);
    }

    #[test]
    fn lower_case_prefix_is_not_a_technology() {
        assert_eq!(
            ColumnTechnology::classify("hydro - A"),
            ColumnTechnology::Unknown("hydro - A".to_string())
        );
    }

    #[test]
    fn missing_and_non_numeric_cells_count_as_zero() {
        let agg = TechnologyAggregator::from_columns(&["SOLAR - A", "SOLAR - B", "SOLAR - C", "SOLAR - D"]);
        let row = agg.aggregate(&record(&["", "n/a", "NaN", "4"])).expect("row");
        assert_eq!(row.get(Technology::Solar), 4.0);

        let short = agg.aggregate(&record(&["2"])).expect("short row");
        assert_eq!(short.get(Technology::Solar), 2.0);
    }

    #[test]
    fn malformed_timestep_fails() {
        let agg = TechnologyAggregator::from_columns(&["HYDRO - A"]);
        let mut rec = record(&["1"]);
        rec.hour = "hour one".to_string();
        assert!(matches!(
            agg.aggregate(&rec),
            Err(EfError::MalformedTimestep { .. })
        ));
    }

    #[test]
    fn from_pairs_accumulates_repeats() {
        let ts = Timestep::parse("2020-01-01", "1").unwrap();
        let row = TechnologyOutputRow::from_pairs(
            ts,
            [(Technology::Hydro, 1.0), (Technology::Hydro, 2.0)],
        );
        assert_eq!(row.get(Technology::Hydro), 3.0);
    }
}
