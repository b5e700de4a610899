//! Interchange accounting: import/export totals and import-attributed
//! emissions per timestep.
//!
//! Sign convention on every flow: positive = export from Ontario,
//! negative = import into Ontario. Exports carry no emissions here; the
//! supply-based factor already covers them. Imports are charged at the
//! source region's factor.

use tracing::warn;

use super::tables::{MissingPolicy, NeighborFactorTable, RegionCode};
use super::timestep::Timestep;
use crate::error::{EfError, Result};

/// Signed interchange flows for one timestep (MWh), one per column.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRow {
    pub timestep: Timestep,
    pub flows: Vec<f64>,
}

/// Diagnostic interchange totals for one timestep.
///
/// Retained for audit; only the totals feed the consumption calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotCheckRow {
    pub timestep: Timestep,
    pub total_exports_mwh: f64,
    pub total_imports_mwh: f64,
    pub total_import_emissions_t: f64,
}

/// An interconnection column bound to its region factor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tie {
    pub column: String,
    pub code: RegionCode,
    /// Factor in t CO2e/MWh; `None` when the region is not in the table.
    pub factor: Option<f64>,
}

impl Tie {
    fn applied_factor(&self) -> f64 {
        self.factor.unwrap_or(0.0)
    }
}

/// Classifies flows and attributes emissions to imports.
///
/// Region lookups happen once, when the accountant is built from the flow
/// header; every timestep then reuses the resolved [`Tie`]s.
#[derive(Debug, Clone)]
pub struct InterchangeAccountant {
    ties: Vec<Tie>,
}

impl InterchangeAccountant {
    /// Resolves each interconnection column against the factor table.
    ///
    /// # Errors
    ///
    /// With [`MissingPolicy::Fail`] on the table, a column whose region code
    /// has no factor returns [`EfError::MissingRegion`]. Otherwise the
    /// column is kept with a zero factor and a warning is logged.
    pub fn new<S: AsRef<str>>(columns: &[S], table: &NeighborFactorTable) -> Result<Self> {
        let mut ties = Vec::with_capacity(columns.len());
        for column in columns {
            let column = column.as_ref();
            let code = RegionCode::from_column(column);
            let factor = table.get(&code);

            if factor.is_none() {
                match table.policy() {
                    MissingPolicy::Fail => {
                        return Err(EfError::MissingRegion {
                            code: code.to_string(),
                            column: column.to_string(),
                        });
                    }
                    MissingPolicy::Zero => {
                        warn!(
                            column,
                            region = %code,
                            "no emission factor for region; imports counted at 0"
                        );
                    }
                }
            }

            ties.push(Tie {
                column: column.to_string(),
                code,
                factor,
            });
        }
        Ok(Self { ties })
    }

    pub fn ties(&self) -> &[Tie] {
        &self.ties
    }

    /// Columns that fell back to a zero factor.
    pub fn unresolved(&self) -> impl Iterator<Item = &Tie> {
        self.ties.iter().filter(|t| t.factor.is_none())
    }

    /// Totals one timestep's flows.
    ///
    /// # Errors
    ///
    /// Returns [`EfError::RowWidth`] when the row does not carry exactly one
    /// flow per interconnection column.
    pub fn account(&self, index: usize, row: &FlowRow) -> Result<SpotCheckRow> {
        if row.flows.len() != self.ties.len() {
            return Err(EfError::RowWidth {
                series: "interchange",
                index,
                expected: self.ties.len(),
                found: row.flows.len(),
            });
        }

        let mut total_exports_mwh = 0.0;
        let mut total_imports_mwh = 0.0;
        let mut total_import_emissions_t = 0.0;

        for (tie, &flow) in self.ties.iter().zip(&row.flows) {
            if flow > 0.0 {
                total_exports_mwh += flow;
            } else if flow < 0.0 {
                let imported = flow.abs();
                total_imports_mwh += imported;
                total_import_emissions_t += imported * tie.applied_factor();
            }
        }

        Ok(SpotCheckRow {
            timestep: row.timestep,
            total_exports_mwh,
            total_imports_mwh,
            total_import_emissions_t,
        })
    }
}
