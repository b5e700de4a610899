//! Post-hoc annual summary computed from a finished report.

use std::fmt;

use serde::Serialize;

use super::engine::EfReport;
use super::supply::G_PER_KWH_PER_T_PER_MWH;

/// Mean, minimum and maximum of one factor series (g CO2e/kWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStats {
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        let mut n = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            n += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if n == 0 {
            return Self {
                mean: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        Self {
            mean: sum / n as f64,
            min,
            max,
        }
    }
}

/// Aggregate indicators for a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct EfSummary {
    pub hours: usize,
    pub supply_ef_g_per_kwh: SeriesStats,
    pub consumption_ef_g_per_kwh: SeriesStats,
    /// Output-weighted supply factor over the year (g CO2e/kWh).
    pub weighted_supply_ef_g_per_kwh: f64,
    pub total_output_mwh: f64,
    pub total_exports_mwh: f64,
    pub total_imports_mwh: f64,
    pub total_import_emissions_t: f64,
    pub zero_output_hours: usize,
    pub zero_demand_hours: usize,
    pub surplus_hours: usize,
    pub unresolved_ties: Vec<String>,
}

impl EfSummary {
    pub fn from_report(report: &EfReport) -> Self {
        let total_output_mwh: f64 = report.supply.iter().map(|s| s.total_output_mwh).sum();
        let total_emissions_t: f64 = report.supply.iter().map(|s| s.total_emissions_t).sum();
        let weighted_supply_ef_g_per_kwh = if total_output_mwh > 0.0 {
            total_emissions_t / total_output_mwh * G_PER_KWH_PER_T_PER_MWH
        } else {
            0.0
        };

        Self {
            hours: report.len(),
            supply_ef_g_per_kwh: SeriesStats::from_values(
                report.supply.iter().map(|s| s.ef_g_per_kwh()),
            ),
            consumption_ef_g_per_kwh: SeriesStats::from_values(
                report.consumption.iter().map(|c| c.ef_g_per_kwh()),
            ),
            weighted_supply_ef_g_per_kwh,
            total_output_mwh,
            total_exports_mwh: report.spot_checks.iter().map(|s| s.total_exports_mwh).sum(),
            total_imports_mwh: report.spot_checks.iter().map(|s| s.total_imports_mwh).sum(),
            total_import_emissions_t: report
                .spot_checks
                .iter()
                .map(|s| s.total_import_emissions_t)
                .sum(),
            zero_output_hours: report
                .supply
                .iter()
                .filter(|s| s.total_output_mwh <= 0.0)
                .count(),
            zero_demand_hours: report
                .consumption
                .iter()
                .filter(|c| c.demand_mwh <= 0.0)
                .count(),
            surplus_hours: report
                .consumption
                .iter()
                .filter(|c| c.balance_difference_mwh > 0.0)
                .count(),
            unresolved_ties: report
                .unresolved_ties
                .iter()
                .map(|t| t.column.clone())
                .collect(),
        }
    }
}

impl fmt::Display for EfSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Emission Factor Summary ---")?;
        writeln!(f, "Hours:                      {}", self.hours)?;
        writeln!(
            f,
            "Supply-based EF:            mean {:.2}  min {:.2}  max {:.2} g CO2e/kWh",
            self.supply_ef_g_per_kwh.mean, self.supply_ef_g_per_kwh.min, self.supply_ef_g_per_kwh.max
        )?;
        writeln!(
            f,
            "Consumption-based EF:       mean {:.2}  min {:.2}  max {:.2} g CO2e/kWh",
            self.consumption_ef_g_per_kwh.mean,
            self.consumption_ef_g_per_kwh.min,
            self.consumption_ef_g_per_kwh.max
        )?;
        writeln!(
            f,
            "Output-weighted supply EF:  {:.2} g CO2e/kWh",
            self.weighted_supply_ef_g_per_kwh
        )?;
        writeln!(f, "Total output:               {:.1} MWh", self.total_output_mwh)?;
        writeln!(f, "Total exports:              {:.1} MWh", self.total_exports_mwh)?;
        writeln!(f, "Total imports:              {:.1} MWh", self.total_imports_mwh)?;
        writeln!(
            f,
            "Import emissions:           {:.1} t CO2e",
            self.total_import_emissions_t
        )?;
        writeln!(
            f,
            "Zero-output / zero-demand:  {} / {} h",
            self.zero_output_hours, self.zero_demand_hours
        )?;
        write!(f, "Surplus hours:              {}", self.surplus_hours)?;
        if !self.unresolved_ties.is_empty() {
            write!(
                f,
                "\nUnresolved interconnections: {}",
                self.unresolved_ties.join(", ")
            )?;
        }
        Ok(())
    }
}
