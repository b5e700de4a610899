//! CSV parameter tables (`Technology`/`Region` → t CO2e/GWh).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::info;

use crate::error::{EfError, Result};

#[derive(Debug, Deserialize)]
struct RateRecord {
    #[serde(rename = "Technology")]
    technology: String,
    #[serde(rename = "Emission Rate (t CO2e/GWh)")]
    rate: f64,
}

#[derive(Debug, Deserialize)]
struct FactorRecord {
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Emission Factor (t CO2e/GWh)")]
    factor: f64,
}

/// Reads a technology emission-rate table.
pub fn read_rate_table(path: &Path) -> Result<BTreeMap<String, f64>> {
    let file = std::fs::File::open(path)
        .map_err(|e| EfError::input(path, format!("cannot open rate table: {e}")))?;
    let table = parse_rate_table(file).map_err(|e| EfError::input(path, e.to_string()))?;
    info!(path = %path.display(), entries = table.len(), "loaded emission rates");
    Ok(table)
}

/// Reads a neighbouring-region emission-factor table.
pub fn read_factor_table(path: &Path) -> Result<BTreeMap<String, f64>> {
    let file = std::fs::File::open(path)
        .map_err(|e| EfError::input(path, format!("cannot open factor table: {e}")))?;
    let table = parse_factor_table(file).map_err(|e| EfError::input(path, e.to_string()))?;
    info!(path = %path.display(), entries = table.len(), "loaded neighbour factors");
    Ok(table)
}

pub fn parse_rate_table(reader: impl Read) -> Result<BTreeMap<String, f64>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut table = BTreeMap::new();
    for record in rdr.deserialize() {
        let r: RateRecord = record?;
        insert_unique(&mut table, "emission rate", r.technology, r.rate)?;
    }
    Ok(table)
}

pub fn parse_factor_table(reader: impl Read) -> Result<BTreeMap<String, f64>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut table = BTreeMap::new();
    for record in rdr.deserialize() {
        let r: FactorRecord = record?;
        insert_unique(&mut table, "neighbour factor", r.region, r.factor)?;
    }
    Ok(table)
}

fn insert_unique(
    table: &mut BTreeMap<String, f64>,
    name: &'static str,
    key: String,
    value: f64,
) -> Result<()> {
    if table.contains_key(&key) {
        return Err(EfError::DuplicateKey { table: name, key });
    }
    table.insert(key, value);
    Ok(())
}
