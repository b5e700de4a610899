//! Consumption-based emission factor.
//!
//! Accounted supply for an hour is `output - exports + imports`. Any part of
//! that which exceeds reported demand is surplus, and its emissions (at the
//! supply-based factor) are removed before dividing by demand. A deficit is
//! left uncorrected.

use super::interchange::SpotCheckRow;
use super::supply::{G_PER_KWH_PER_T_PER_MWH, SupplyResult};
use super::timestep::{Timestep, ensure_aligned};
use crate::error::Result;

/// Regional demand for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemandRow {
    pub timestep: Timestep,
    /// Ontario demand (MWh).
    pub demand_mwh: f64,
}

/// Consumption-side result for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsumptionResult {
    pub timestep: Timestep,
    /// Demand the factor was divided by (MWh).
    pub demand_mwh: f64,
    /// `output - exports + imports` (MWh).
    pub net_balance_mwh: f64,
    /// `net_balance - demand` (MWh); positive means unaccounted surplus.
    pub balance_difference_mwh: f64,
    /// Emissions stripped for the surplus (t CO2e); zero on a deficit.
    pub adjusted_emissions_t: f64,
    /// Consumption-based intensity (t CO2e/MWh); zero when demand is zero.
    pub ef_t_per_mwh: f64,
}

impl ConsumptionResult {
    /// Published consumption-based factor (g CO2e/kWh).
    pub fn ef_g_per_kwh(&self) -> f64 {
        self.ef_t_per_mwh * G_PER_KWH_PER_T_PER_MWH
    }
}

/// Computes the consumption-based factor for row `index`.
///
/// # Errors
///
/// Returns [`crate::error::EfError::TimestepMismatch`] when the demand or
/// interchange row is keyed to a different timestep than the supply row.
pub fn consumption_factor(
    index: usize,
    supply: &SupplyResult,
    demand: &DemandRow,
    interchange: &SpotCheckRow,
) -> Result<ConsumptionResult> {
    ensure_aligned("demand", index, supply.timestep, demand.timestep)?;
    ensure_aligned("interchange", index, supply.timestep, interchange.timestep)?;

    let supply_ef = supply.ef_t_per_mwh;
    let output = supply.total_output_mwh;
    let exports = interchange.total_exports_mwh;
    let imports = interchange.total_imports_mwh;

    let net_balance_mwh = output - exports + imports;
    let balance_difference_mwh = net_balance_mwh - demand.demand_mwh;
    let adjusted_emissions_t = if balance_difference_mwh > 0.0 {
        balance_difference_mwh * supply_ef
    } else {
        0.0
    };

    let ef_t_per_mwh = if demand.demand_mwh > 0.0 {
        (supply_ef * output - supply_ef * exports + interchange.total_import_emissions_t
            - adjusted_emissions_t)
            / demand.demand_mwh
    } else {
        0.0
    };

    Ok(ConsumptionResult {
        timestep: supply.timestep,
        demand_mwh: demand.demand_mwh,
        net_balance_mwh,
        balance_difference_mwh,
        adjusted_emissions_t,
        ef_t_per_mwh,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EfError;

    fn ts(hour: &str) -> Timestep {
        Timestep::parse("2020-01-01", hour).unwrap()
    }

    fn supply(output: f64, ef: f64) -> SupplyResult {
        SupplyResult {
            timestep: ts("1"),
            total_output_mwh: output,
            total_emissions_t: output * ef,
            ef_t_per_mwh: ef,
        }
    }

    fn spot(exports: f64, imports: f64, import_emissions: f64) -> SpotCheckRow {
        SpotCheckRow {
            timestep: ts("1"),
            total_exports_mwh: exports,
            total_imports_mwh: imports,
            total_import_emissions_t: import_emissions,
        }
    }

    fn demand(mwh: f64) -> DemandRow {
        DemandRow {
            timestep: ts("1"),
            demand_mwh: mwh,
        }
    }

    #[test]
    fn surplus_emissions_are_stripped() {
        let r = consumption_factor(0, &supply(600.0, 0.05), &demand(500.0), &spot(0.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(r.net_balance_mwh, 600.0);
        assert_eq!(r.balance_difference_mwh, 100.0);
        assert!((r.adjusted_emissions_t - 5.0).abs() < 1e-12);
        assert!((r.ef_t_per_mwh - 0.05).abs() < 1e-12);
        assert!((r.ef_g_per_kwh() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn deficit_is_not_corrected() {
        // 400 generated, demand 500: (0.05*400)/500 = 0.04
        let r = consumption_factor(0, &supply(400.0, 0.05), &demand(500.0), &spot(0.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(r.balance_difference_mwh, -100.0);
        assert_eq!(r.adjusted_emissions_t, 0.0);
        assert!((r.ef_t_per_mwh - 0.04).abs() < 1e-12);
    }

    #[test]
    fn imports_and_exports_shift_the_factor() {
        // output 1000 @ 0.1, export 200, import 200 carrying 100 t, demand 1000
        // (100 - 20 + 100 - 0) / 1000 = 0.18
        let r = consumption_factor(
            0,
            &supply(1000.0, 0.1),
            &demand(1000.0),
            &spot(200.0, 200.0, 100.0),
        )
        .unwrap();
        assert_eq!(r.balance_difference_mwh, 0.0);
        assert!((r.ef_t_per_mwh - 0.18).abs() < 1e-12);
    }

    #[test]
    fn zero_demand_is_exactly_zero() {
        let r = consumption_factor(0, &supply(600.0, 0.05), &demand(0.0), &spot(10.0, 5.0, 1.0))
            .unwrap();
        assert_eq!(r.ef_t_per_mwh, 0.0);
        assert_eq!(r.ef_g_per_kwh(), 0.0);
    }

    #[test]
    fn misaligned_demand_is_rejected() {
        let mut d = demand(500.0);
        d.timestep = ts("2");
        let err = consumption_factor(4, &supply(600.0, 0.05), &d, &spot(0.0, 0.0, 0.0))
            .expect_err("must fail");
        assert!(matches!(
            err,
            EfError::TimestepMismatch { series: "demand", index: 4, .. }
        ));
    }

    #[test]
    fn misaligned_interchange_is_rejected() {
        let mut s = spot(0.0, 0.0, 0.0);
        s.timestep = ts("3");
        let err = consumption_factor(0, &supply(600.0, 0.05), &demand(500.0), &s)
            .expect_err("must fail");
        assert!(matches!(
            err,
            EfError::TimestepMismatch { series: "interchange", .. }
        ));
    }
}
