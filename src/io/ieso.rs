//! Parsers for the three public IESO report layouts.
//!
//! Each parser takes the file text so it can be tested without touching the
//! filesystem; the `read_*` wrappers add the file access and path context.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info};

use super::ReportPaths;
use crate::ef::consumption::DemandRow;
use crate::ef::engine::{EfInputs, GenerationSeries, InterchangeSeries};
use crate::ef::interchange::FlowRow;
use crate::ef::technology::{GenerationRecord, parse_output_cell};
use crate::ef::timestep::Timestep;
use crate::error::{EfError, Result};

/// Preamble lines at the top of every generator month report.
const GENERATOR_PREAMBLE_LINES: usize = 3;
/// Date, generator, fuel type, measurement and 24 hourly values.
const GENERATOR_FIELDS: usize = 28;
const HOURS_PER_DAY: usize = 24;
const OUTPUT_MEASUREMENT: &str = "Output";

pub const MANITOBA_TOTAL: &str = "MANITOBA Total Flow";
pub const QUEBEC_TOTAL: &str = "QUEBEC Total Flow";

/// One per-generator, per-day line of a generator month report.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorLine {
    pub date: String,
    pub generator: String,
    pub fuel_type: String,
    pub measurement: String,
    /// Cell text for hours 1 through 24.
    pub hours: Vec<String>,
}

impl GeneratorLine {
    /// Wide-table column name, `"<Fuel Type> - <Generator>"`.
    pub fn column(&self) -> String {
        format!("{} - {}", self.fuel_type, self.generator)
    }

    fn is_header(&self) -> bool {
        self.date == "Delivery Date" && self.measurement == "Measurement"
    }
}

/// Splits a generator month report into well-formed lines.
///
/// The preamble is skipped, trailing commas are stripped and any line that
/// does not carry exactly 28 fields is dropped. Repeated header lines are
/// removed.
pub fn parse_generator_month(text: &str) -> Vec<GeneratorLine> {
    let mut lines = Vec::new();
    for (lineno, raw) in text.lines().enumerate().skip(GENERATOR_PREAMBLE_LINES) {
        let line = raw.trim().trim_end_matches(',');
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != GENERATOR_FIELDS {
            debug!(line = lineno + 1, fields = fields.len(), "skipped generator line");
            continue;
        }
        let parsed = GeneratorLine {
            date: fields[0].to_string(),
            generator: fields[1].to_string(),
            fuel_type: fields[2].to_string(),
            measurement: fields[3].to_string(),
            hours: fields[4..].iter().map(|s| s.to_string()).collect(),
        };
        if parsed.is_header() {
            continue;
        }
        lines.push(parsed);
    }
    lines
}

/// Pivots `Output` lines into one column per generator and one row per
/// timestep, rows in chronological order and columns sorted by name. Row
/// dates are re-emitted as `YYYY-MM-DD` whatever layout the report used.
/// Cells with no reading are left empty.
///
/// # Errors
///
/// Fails when no line has measurement `Output`, when a delivery date does
/// not parse, or when the same generator reports twice for one timestep.
pub fn pivot_generation(lines: &[GeneratorLine], source: &Path) -> Result<GenerationSeries> {
    let outputs: Vec<&GeneratorLine> = lines
        .iter()
        .filter(|l| l.measurement == OUTPUT_MEASUREMENT)
        .collect();
    if outputs.is_empty() {
        return Err(EfError::input(
            source,
            "no generator lines with measurement \"Output\"",
        ));
    }

    let mut column_index: BTreeMap<String, usize> =
        outputs.iter().map(|l| (l.column(), 0)).collect();
    for (i, slot) in column_index.values_mut().enumerate() {
        *slot = i;
    }
    let width = column_index.len();

    let mut rows: BTreeMap<Timestep, Vec<Option<String>>> = BTreeMap::new();
    for line in &outputs {
        let col = column_index[&line.column()];
        for (h, cell) in line.hours.iter().enumerate().take(HOURS_PER_DAY) {
            let timestep = Timestep::parse(&line.date, &(h + 1).to_string())?;
            let row = rows.entry(timestep).or_insert_with(|| vec![None; width]);
            if row[col].is_some() {
                return Err(EfError::input(
                    source,
                    format!("duplicate reading for {} at {timestep}", line.column()),
                ));
            }
            row[col] = Some(cell.clone());
        }
    }

    let records = rows
        .into_iter()
        .map(|(timestep, cells)| GenerationRecord {
            date: timestep.date().format("%Y-%m-%d").to_string(),
            hour: timestep.hour().to_string(),
            cells: cells.into_iter().map(Option::unwrap_or_default).collect(),
        })
        .collect();

    Ok(GenerationSeries {
        columns: column_index.into_keys().collect(),
        records,
    })
}

/// Reads and pivots the twelve generator month reports of a year.
pub fn read_generation_year(paths: &ReportPaths) -> Result<GenerationSeries> {
    let mut lines = Vec::new();
    for month in 1..=12 {
        let path = paths.generator_month(month);
        let text = read_text(&path)?;
        let month_lines = parse_generator_month(&text);
        debug!(path = %path.display(), lines = month_lines.len(), "parsed generator month");
        lines.extend(month_lines);
    }
    let series = pivot_generation(&lines, &paths.root().join("Generator"))?;
    info!(
        generators = series.columns.len(),
        timesteps = series.records.len(),
        "loaded generator output"
    );
    Ok(series)
}

/// Parses the hourly demand report, keeping `Date`, `Hour` and
/// `Ontario Demand`. Unreadable demand values count as zero.
pub fn parse_demand(text: &str, source: &Path) -> Result<Vec<DemandRow>> {
    let body = strip_annotations(text);
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = rdr.headers()?.clone();
    let date = column_position(&headers, "Date", source)?;
    let hour = column_position(&headers, "Hour", source)?;
    let demand = column_position(&headers, "Ontario Demand", source)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let timestep = Timestep::parse(field(&record, date), field(&record, hour))?;
        rows.push(DemandRow {
            timestep,
            demand_mwh: parse_output_cell(field(&record, demand)),
        });
    }
    Ok(rows)
}

pub fn read_demand(path: &Path) -> Result<Vec<DemandRow>> {
    let rows = parse_demand(&read_text(path)?, path)?;
    info!(path = %path.display(), timesteps = rows.len(), "loaded demand");
    Ok(rows)
}

/// Parses the yearly intertie schedule and flow report.
///
/// The first two rows are joined into column names. Only flow columns are
/// kept: every `MANITOBA*` column is summed into [`MANITOBA_TOTAL`] and every
/// `PQ*` column into [`QUEBEC_TOTAL`]; these two lead, followed by the other
/// flow columns in file order.
pub fn parse_intertie(text: &str, source: &Path) -> Result<InterchangeSeries> {
    let body = strip_annotations(text);
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());
    let records: Vec<StringRecord> = rdr.records().collect::<std::result::Result<_, _>>()?;

    if records.len() < 2 {
        return Err(EfError::input(source, "missing the two header rows"));
    }
    let width = records.iter().map(StringRecord::len).max().unwrap_or(0);
    if width < 2 {
        return Err(EfError::input(source, "no date and hour columns"));
    }
    let headers: Vec<String> = (0..width)
        .map(|i| match i {
            0 => "Date".to_string(),
            1 => "Hour".to_string(),
            _ => format!(
                "{} {}",
                field(&records[0], i).trim(),
                field(&records[1], i).trim()
            ),
        })
        .collect();

    let flows: Vec<usize> = (2..width)
        .filter(|&i| headers[i].ends_with("Flow") && !headers[i].starts_with("Total"))
        .collect();
    let manitoba: Vec<usize> = flows
        .iter()
        .copied()
        .filter(|&i| headers[i].starts_with("MANITOBA"))
        .collect();
    let quebec: Vec<usize> = flows
        .iter()
        .copied()
        .filter(|&i| headers[i].starts_with("PQ"))
        .collect();
    let others: Vec<usize> = flows
        .iter()
        .copied()
        .filter(|i| !manitoba.contains(i) && !quebec.contains(i))
        .collect();
    debug!(
        manitoba = manitoba.len(),
        quebec = quebec.len(),
        others = others.len(),
        "intertie flow columns"
    );

    let mut columns = vec![MANITOBA_TOTAL.to_string(), QUEBEC_TOTAL.to_string()];
    columns.extend(others.iter().map(|&i| headers[i].clone()));

    let sum = |record: &StringRecord, idx: &[usize]| -> f64 {
        idx.iter().map(|&i| parse_output_cell(field(record, i))).sum()
    };

    let mut rows = Vec::with_capacity(records.len() - 2);
    for record in &records[2..] {
        let timestep = Timestep::parse(field(record, 0), field(record, 1))?;
        let mut values = vec![sum(record, &manitoba), sum(record, &quebec)];
        values.extend(others.iter().map(|&i| parse_output_cell(field(record, i))));
        rows.push(FlowRow {
            timestep,
            flows: values,
        });
    }

    Ok(InterchangeSeries { columns, rows })
}

pub fn read_intertie(path: &Path) -> Result<InterchangeSeries> {
    let series = parse_intertie(&read_text(path)?, path)?;
    info!(
        path = %path.display(),
        ties = series.columns.len(),
        timesteps = series.rows.len(),
        "loaded intertie flows"
    );
    Ok(series)
}

/// Reads all three input series for one year.
pub fn read_inputs(paths: &ReportPaths) -> Result<EfInputs> {
    Ok(EfInputs {
        generation: read_generation_year(paths)?,
        demand: read_demand(&paths.demand())?,
        interchange: read_intertie(&paths.intertie())?,
    })
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| EfError::input(path, format!("cannot read report: {e}")))
}

/// Drops report annotation lines, which contain a backslash.
fn strip_annotations(text: &str) -> String {
    text.lines()
        .filter(|l| !l.contains('\\'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn column_position(headers: &StringRecord, name: &str, source: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| EfError::input(source, format!("missing column {name:?}")))
}

fn field(record: &StringRecord, i: usize) -> &str {
    record.get(i).unwrap_or("")
}
