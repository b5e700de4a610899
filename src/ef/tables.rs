//! Immutable parameter tables: technology emission rates and neighbouring
//! region emission factors.
//!
//! Both tables are built once, before any timestep is processed, and hold
//! values in t CO2e/MWh. Inputs arrive in t CO2e/GWh (the unit of the
//! published tables) and are divided by 1000 on construction.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use tracing::warn;

use super::technology::Technology;
use crate::error::{EfError, Result};

/// GWh → MWh divisor applied to every table value.
pub const GWH_PER_MWH: f64 = 1000.0;

/// What to do when a table has no entry for a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Abort the run before any timestep is processed.
    Fail,
    /// Treat the missing entry as a zero rate.
    Zero,
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingPolicy::Fail => f.write_str("fail"),
            MissingPolicy::Zero => f.write_str("zero"),
        }
    }
}

/// Technology → emission rate (t CO2e/MWh).
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRateTable {
    rates: [f64; Technology::COUNT],
}

impl EmissionRateTable {
    /// Builds the table from t CO2e/GWh values.
    ///
    /// # Errors
    ///
    /// With [`MissingPolicy::Fail`], returns [`EfError::MissingRate`] for the
    /// first technology without an entry. With [`MissingPolicy::Zero`],
    /// missing technologies get a zero rate.
    pub fn from_gwh(
        rates_t_per_gwh: &BTreeMap<Technology, f64>,
        policy: MissingPolicy,
    ) -> Result<Self> {
        let mut rates = [0.0; Technology::COUNT];
        for tech in Technology::ALL {
            match (rates_t_per_gwh.get(&tech), policy) {
                (Some(v), _) => rates[tech.index()] = v / GWH_PER_MWH,
                (None, MissingPolicy::Fail) => return Err(EfError::MissingRate(tech)),
                (None, MissingPolicy::Zero) => {
                    warn!(technology = %tech, "no emission rate configured; counted at 0");
                }
            }
        }
        Ok(Self { rates })
    }

    /// Rate for `tech` in t CO2e/MWh.
    pub fn rate(&self, tech: Technology) -> f64 {
        self.rates[tech.index()]
    }
}

/// Neighbouring regions modelled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbor {
    Manitoba,
    Michigan,
    Minnesota,
    NewYork,
    Quebec,
}

impl Neighbor {
    pub const ALL: [Neighbor; 5] = [
        Neighbor::Manitoba,
        Neighbor::Michigan,
        Neighbor::Minnesota,
        Neighbor::NewYork,
        Neighbor::Quebec,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Neighbor::Manitoba => "Manitoba",
            Neighbor::Michigan => "Michigan",
            Neighbor::Minnesota => "Minnesota",
            Neighbor::NewYork => "New York",
            Neighbor::Quebec => "Quebec",
        }
    }

    /// Default grid-average factor in t CO2e/GWh.
    pub fn default_factor_t_per_gwh(self) -> f64 {
        match self {
            Neighbor::Manitoba => 2.2,
            Neighbor::Michigan => 502.0,
            Neighbor::Minnesota => 463.0,
            Neighbor::NewYork => 211.0,
            Neighbor::Quebec => 1.7,
        }
    }
}

/// Three-character upper-case region key.
///
/// The truncation means unrelated names sharing a prefix collide: columns
/// `MIC-East Flow` and `MIC-West Flow` are both `MIC`, and so is a table
/// entry named `Michigan`. This is kept deliberately; see DESIGN.md.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionCode(String);

impl RegionCode {
    /// Code for a table entry: the whole name upper-cased, first 3 chars.
    pub fn from_region_name(name: &str) -> Self {
        Self(name.trim().to_uppercase().chars().take(3).collect())
    }

    /// Code for an interconnection column: the text before the first space,
    /// upper-cased, first 3 chars.
    pub fn from_column(column: &str) -> Self {
        let head = column.split(' ').next().unwrap_or_default();
        Self(head.to_uppercase().chars().take(3).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Region code → emission factor (t CO2e/MWh).
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborFactorTable {
    factors: BTreeMap<RegionCode, f64>,
    policy: MissingPolicy,
}

impl NeighborFactorTable {
    /// Builds the table from region names and t CO2e/GWh values.
    ///
    /// # Errors
    ///
    /// Returns [`EfError::RegionCollision`] when two region names reduce to
    /// the same code, since one of the two factors would be silently lost.
    pub fn from_gwh<'a>(
        factors_t_per_gwh: impl IntoIterator<Item = (&'a str, f64)>,
        policy: MissingPolicy,
    ) -> Result<Self> {
        let mut factors = BTreeMap::new();
        let mut names: BTreeMap<RegionCode, &str> = BTreeMap::new();
        for (name, value) in factors_t_per_gwh {
            let code = RegionCode::from_region_name(name);
            if let Some(previous) = names.insert(code.clone(), name) {
                return Err(EfError::RegionCollision {
                    code: code.to_string(),
                    first: previous.to_string(),
                    second: name.to_string(),
                });
            }
            factors.insert(code, value / GWH_PER_MWH);
        }
        Ok(Self { factors, policy })
    }

    /// Table built from [`Neighbor::default_factor_t_per_gwh`].
    pub fn defaults(policy: MissingPolicy) -> Self {
        let factors = Neighbor::ALL
            .into_iter()
            .map(|n| {
                (
                    RegionCode::from_region_name(n.name()),
                    n.default_factor_t_per_gwh() / GWH_PER_MWH,
                )
            })
            .collect();
        Self { factors, policy }
    }

    /// Factor for `code` in t CO2e/MWh, if present.
    pub fn get(&self, code: &RegionCode) -> Option<f64> {
        self.factors.get(code).copied()
    }

    pub fn policy(&self) -> MissingPolicy {
        self.policy
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RegionCode, f64)> {
        self.factors.iter().map(|(k, v)| (k, *v))
    }
}

/// Both parameter tables, shared read-only across a run.
#[derive(Debug, Clone)]
pub struct Parameters {
    pub rates: EmissionRateTable,
    pub neighbors: NeighborFactorTable,
}
