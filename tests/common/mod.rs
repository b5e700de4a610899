//! Shared raw-report fixtures for integration tests.
//!
//! Writes a one-day year of IESO-style reports (generator months, demand
//! and intertie flows) under `<root>/IESO/<year>/`.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ontario_ef::ef::tables::{EmissionRateTable, MissingPolicy, NeighborFactorTable, Parameters};
use ontario_ef::ef::technology::Technology;
use ontario_ef::io::ReportPaths;

pub const YEAR: i32 = 2020;
pub const DAY: &str = "2020-01-01";

/// Absolute tolerance for g CO2e/kWh comparisons.
pub const TOL: f64 = 1e-9;

/// One hour of fixture data.
#[derive(Debug, Clone)]
pub struct Hour {
    pub hydro_mwh: f64,
    pub gas_mwh: f64,
    pub demand_mwh: f64,
    /// Signed flows, one per entry of [`ReportSet::ties`].
    pub flows: Vec<f64>,
}

/// A day of raw reports plus the intertie column layout.
#[derive(Debug, Clone)]
pub struct ReportSet {
    pub hours: Vec<Hour>,
    /// `(header row 0, header row 1)` per intertie column.
    pub ties: Vec<(String, String)>,
}

impl ReportSet {
    /// 24 identical hours: 500 MWh hydro, 100 MWh gas, 500 MWh demand and
    /// no trade over Manitoba, Quebec and Michigan ties.
    pub fn balanced_day() -> Self {
        Self::uniform(
            Hour {
                hydro_mwh: 500.0,
                gas_mwh: 100.0,
                demand_mwh: 500.0,
                flows: vec![0.0, 0.0, 0.0],
            },
            &[("MANITOBA", "Flow"), ("PQ.AT", "Flow"), ("MICHIGAN", "Flow")],
        )
    }

    pub fn uniform(hour: Hour, ties: &[(&str, &str)]) -> Self {
        Self {
            hours: vec![hour; 24],
            ties: ties
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }

    /// Writes all report files below `data_dir`.
    pub fn write(&self, data_dir: &Path) {
        let paths = ReportPaths::new(data_dir, YEAR);
        for dir in ["Generator", "Demand", "Trade"] {
            fs::create_dir_all(paths.root().join(dir)).unwrap();
        }
        for month in 1..=12 {
            let body = if month == 1 { self.generator_lines() } else { String::new() };
            fs::write(paths.generator_month(month), generator_report(&body)).unwrap();
        }
        fs::write(paths.demand(), self.demand_report()).unwrap();
        fs::write(paths.intertie(), self.intertie_report()).unwrap();
    }

    fn generator_lines(&self) -> String {
        let mut out = String::new();
        let series = [
            ("BECK", "HYDRO", self.hours.iter().map(|h| h.hydro_mwh).collect::<Vec<_>>()),
            ("BRIGHTON", "GAS", self.hours.iter().map(|h| h.gas_mwh).collect()),
        ];
        for (generator, fuel, values) in series {
            for measurement in ["Output", "Capability"] {
                let cells: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                out.push_str(&format!(
                    "{DAY},{generator},{fuel},{measurement},{},\n",
                    cells.join(",")
                ));
            }
        }
        out
    }

    fn demand_report(&self) -> String {
        let mut out = String::from(
            "\\\\Hourly Demand Report\n\\\\Created at 2021-01-01\n\
             Date,Hour,Market Demand,Ontario Demand\n",
        );
        for (i, h) in self.hours.iter().enumerate() {
            out.push_str(&format!("{DAY},{},0,{}\n", i + 1, h.demand_mwh));
        }
        out
    }

    fn intertie_report(&self) -> String {
        let mut out = String::from("\\\\Intertie Schedule and Flow Report\n");
        let row0: Vec<&str> = self.ties.iter().map(|t| t.0.as_str()).collect();
        let row1: Vec<&str> = self.ties.iter().map(|t| t.1.as_str()).collect();
        out.push_str(&format!(",,{}\n", row0.join(",")));
        out.push_str(&format!("Date,Hour,{}\n", row1.join(",")));
        for (i, h) in self.hours.iter().enumerate() {
            let flows: Vec<String> = h.flows.iter().map(|v| v.to_string()).collect();
            out.push_str(&format!("{DAY},{},{}\n", i + 1, flows.join(",")));
        }
        out
    }
}

fn generator_report(body: &str) -> String {
    let mut out = String::from("\\\\Generator Output and Capability Report\nCreated at 2021-01-01\n\n");
    out.push_str("Delivery Date,Generator,Fuel Type,Measurement");
    for h in 1..=24 {
        out.push_str(&format!(",Hour {h}"));
    }
    out.push_str(",\n");
    out.push_str(body);
    out
}

/// Hydro at zero, natural gas at 300 t/GWh, everything else at zero;
/// neighbour factors from the built-in defaults.
pub fn gas_only_parameters(missing_region: MissingPolicy) -> Parameters {
    let rates: BTreeMap<Technology, f64> = Technology::ALL
        .into_iter()
        .map(|t| (t, if t == Technology::NaturalGas { 300.0 } else { 0.0 }))
        .collect();
    Parameters {
        rates: EmissionRateTable::from_gwh(&rates, MissingPolicy::Fail).unwrap(),
        neighbors: NeighborFactorTable::defaults(missing_region),
    }
}
