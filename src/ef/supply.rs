//! Supply-based emission factor.

use super::tables::EmissionRateTable;
use super::technology::TechnologyOutputRow;
use super::timestep::Timestep;

/// Tonnes/MWh → grams/kWh.
pub const G_PER_KWH_PER_T_PER_MWH: f64 = 1000.0;

/// Supply-side result for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyResult {
    pub timestep: Timestep,
    /// Sum of all technology outputs (MWh).
    pub total_output_mwh: f64,
    /// Emissions implied by that output (t CO2e).
    pub total_emissions_t: f64,
    /// Supply-based intensity (t CO2e/MWh); zero when there is no output.
    pub ef_t_per_mwh: f64,
}

impl SupplyResult {
    /// Published supply-based factor (g CO2e/kWh).
    pub fn ef_g_per_kwh(&self) -> f64 {
        self.ef_t_per_mwh * G_PER_KWH_PER_T_PER_MWH
    }
}

/// Combines technology totals with emission rates.
///
/// A zero-output hour has no attributable intensity and yields exactly 0.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use ontario_ef::ef::tables::{EmissionRateTable, MissingPolicy};
/// use ontario_ef::ef::technology::{Technology, TechnologyOutputRow};
/// use ontario_ef::ef::timestep::Timestep;
/// use ontario_ef::ef::supply::supply_factor;
///
/// let rates: BTreeMap<Technology, f64> = Technology::ALL
///     .into_iter()
///     .map(|t| (t, if t == Technology::NaturalGas { 300.0 } else { 0.0 }))
///     .collect();
/// let rates = EmissionRateTable::from_gwh(&rates, MissingPolicy::Fail).unwrap();
/// let ts = Timestep::parse("2020-01-01", "1").unwrap();
/// let row = TechnologyOutputRow::from_pairs(
///     ts,
///     [(Technology::Hydro, 500.0), (Technology::NaturalGas, 100.0)],
/// );
///
/// let supply = supply_factor(&row, &rates);
/// assert_eq!(supply.total_output_mwh, 600.0);
/// assert!((supply.ef_g_per_kwh() - 50.0).abs() < 1e-9);
/// ```
pub fn supply_factor(row: &TechnologyOutputRow, rates: &EmissionRateTable) -> SupplyResult {
    let mut total_output_mwh = 0.0;
    let mut total_emissions_t = 0.0;
    for (tech, mwh) in row.iter() {
        total_output_mwh += mwh;
        total_emissions_t += mwh * rates.rate(tech);
    }

    let ef_t_per_mwh = if total_output_mwh > 0.0 {
        total_emissions_t / total_output_mwh
    } else {
        0.0
    };

    SupplyResult {
        timestep: row.timestep,
        total_output_mwh,
        total_emissions_t,
        ef_t_per_mwh,
    }
}
