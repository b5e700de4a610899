//! Ordered pass over a year of timesteps.
//!
//! Data flows strictly forward:
//! generation → aggregator → supply factor → (with demand and interchange
//! totals) → consumption factor. Every row carries its own timestep and the
//! keys are compared wherever two series meet.

use std::time::Instant;

use tracing::{debug, info};

use super::consumption::{ConsumptionResult, DemandRow, consumption_factor};
use super::interchange::{FlowRow, InterchangeAccountant, SpotCheckRow, Tie};
use super::supply::{SupplyResult, supply_factor};
use super::tables::Parameters;
use super::technology::{GenerationRecord, TechnologyAggregator};
use super::timestep::ensure_aligned;
use crate::error::{EfError, Result};

/// Number of progress reports emitted over a full run.
const PROGRESS_STEPS: usize = 10;

/// Wide generation table: one column per generating unit.
#[derive(Debug, Clone, Default)]
pub struct GenerationSeries {
    pub columns: Vec<String>,
    pub records: Vec<GenerationRecord>,
}

/// Interchange table: one signed flow column per neighbour.
#[derive(Debug, Clone, Default)]
pub struct InterchangeSeries {
    pub columns: Vec<String>,
    pub rows: Vec<FlowRow>,
}

/// The three aligned inputs of a run.
#[derive(Debug, Clone, Default)]
pub struct EfInputs {
    pub generation: GenerationSeries,
    pub demand: Vec<DemandRow>,
    pub interchange: InterchangeSeries,
}

impl EfInputs {
    /// Fails unless all three series have the same number of rows.
    pub fn check_lengths(&self) -> Result<usize> {
        let generation = self.generation.records.len();
        let demand = self.demand.len();
        let interchange = self.interchange.rows.len();
        if generation == demand && demand == interchange {
            Ok(generation)
        } else {
            Err(EfError::LengthMismatch {
                generation,
                demand,
                interchange,
            })
        }
    }
}

/// Complete output of a run: three series in input order.
#[derive(Debug, Clone, Default)]
pub struct EfReport {
    pub supply: Vec<SupplyResult>,
    pub consumption: Vec<ConsumptionResult>,
    pub spot_checks: Vec<SpotCheckRow>,
    /// Interconnection columns counted with a zero import factor.
    pub unresolved_ties: Vec<Tie>,
    /// Generator columns excluded from every technology total.
    pub unknown_generator_columns: Vec<String>,
}

impl EfReport {
    pub fn len(&self) -> usize {
        self.supply.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supply.is_empty()
    }
}

/// Runs the whole pipeline over borrowed, read-only parameters.
pub struct Calculator<'a> {
    params: &'a Parameters,
}

impl<'a> Calculator<'a> {
    pub fn new(params: &'a Parameters) -> Self {
        Self { params }
    }

    /// Computes supply, consumption and spot-check series.
    ///
    /// All preconditions (equal lengths, resolvable region factors under a
    /// strict policy) are checked before the first timestep. Any error
    /// discards the partial results; there is no partial report.
    pub fn run(&self, inputs: &EfInputs) -> Result<EfReport> {
        let total = inputs.check_lengths()?;
        let aggregator = TechnologyAggregator::from_columns(&inputs.generation.columns);
        let accountant =
            InterchangeAccountant::new(&inputs.interchange.columns, &self.params.neighbors)?;

        let mut report = EfReport {
            supply: Vec::with_capacity(total),
            consumption: Vec::with_capacity(total),
            spot_checks: Vec::with_capacity(total),
            unresolved_ties: accountant.unresolved().cloned().collect(),
            unknown_generator_columns: aggregator.unknown_columns().map(str::to_string).collect(),
        };

        let progress_interval = (total / PROGRESS_STEPS).max(1);
        let started = Instant::now();
        info!(timesteps = total, "starting emission factor calculation");

        let rows = inputs
            .generation
            .records
            .iter()
            .zip(&inputs.demand)
            .zip(&inputs.interchange.rows)
            .enumerate();

        for (idx, ((record, demand), flow)) in rows {
            let outputs = aggregator.aggregate(record)?;
            ensure_aligned("interchange", idx, outputs.timestep, flow.timestep)?;

            let supply = supply_factor(&outputs, &self.params.rates);
            let spot = accountant.account(idx, flow)?;
            let consumption = consumption_factor(idx, &supply, demand, &spot)?;

            report.supply.push(supply);
            report.spot_checks.push(spot);
            report.consumption.push(consumption);

            let done = idx + 1;
            if done % progress_interval == 0 || done == total {
                info!(
                    done,
                    total,
                    pct = done as f64 / total as f64 * 100.0,
                    elapsed_s = started.elapsed().as_secs_f64(),
                    "progress"
                );
            }
        }

        debug!(
            unresolved = report.unresolved_ties.len(),
            unknown_columns = report.unknown_generator_columns.len(),
            "calculation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::ef::tables::{EmissionRateTable, MissingPolicy, NeighborFactorTable};
    use crate::ef::technology::Technology;
    use crate::ef::timestep::Timestep;

    fn params() -> Parameters {
        let rates: BTreeMap<Technology, f64> = Technology::ALL
            .into_iter()
            .map(|t| (t, if t == Technology::NaturalGas { 300.0 } else { 0.0 }))
            .collect();
        Parameters {
            rates: EmissionRateTable::from_gwh(&rates, MissingPolicy::Fail).unwrap(),
            neighbors: NeighborFactorTable::from_gwh([("Quebec", 2.0)], MissingPolicy::Zero)
                .unwrap(),
        }
    }

    fn inputs(hours: u8) -> EfInputs {
        let ts = |h: u8| Timestep::parse("2020-01-01", &h.to_string()).unwrap();
        EfInputs {
            generation: GenerationSeries {
                columns: vec!["HYDRO - A".into(), "GAS - B".into()],
                records: (1..=hours)
                    .map(|h| GenerationRecord {
                        date: "2020-01-01".into(),
                        hour: h.to_string(),
                        cells: vec!["500".into(), "100".into()],
                    })
                    .collect(),
            },
            demand: (1..=hours)
                .map(|h| DemandRow {
                    timestep: ts(h),
                    demand_mwh: 500.0,
                })
                .collect(),
            interchange: InterchangeSeries {
                columns: vec!["QUEBEC Total Flow".into()],
                rows: (1..=hours)
                    .map(|h| FlowRow {
                        timestep: ts(h),
                        flows: vec![0.0],
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn produces_one_result_per_timestep() {
        let p = params();
        let report = Calculator::new(&p).run(&inputs(24)).unwrap();
        assert_eq!(report.len(), 24);
        assert_eq!(report.consumption.len(), 24);
        assert_eq!(report.spot_checks.len(), 24);
        for (s, c) in report.supply.iter().zip(&report.consumption) {
            assert_eq!(s.timestep, c.timestep);
            assert!((s.ef_g_per_kwh() - 50.0).abs() < 1e-9);
            assert!((c.ef_g_per_kwh() - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn length_mismatch_fails_before_processing() {
        let p = params();
        let mut i = inputs(3);
        i.demand.pop();
        let err = Calculator::new(&p).run(&i).expect_err("must fail");
        assert!(matches!(
            err,
            EfError::LengthMismatch { generation: 3, demand: 2, interchange: 3 }
        ));
    }

    #[test]
    fn shuffled_interchange_is_rejected() {
        let p = params();
        let mut i = inputs(3);
        i.interchange.rows.swap(0, 1);
        let err = Calculator::new(&p).run(&i).expect_err("must fail");
        assert!(matches!(err, EfError::TimestepMismatch { index: 0, .. }));
    }

    #[test]
    fn empty_inputs_give_empty_report() {
        let p = params();
        let report = Calculator::new(&p).run(&EfInputs::default()).unwrap();
        assert!(report.is_empty());
    }
}
