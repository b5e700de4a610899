//! CSV export for the supply, consumption and spot-check series.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::OutputPaths;
use crate::ef::consumption::ConsumptionResult;
use crate::ef::engine::EfReport;
use crate::ef::interchange::SpotCheckRow;
use crate::ef::supply::SupplyResult;
use crate::ef::timestep::Timestep;

const SUPPLY_HEADER: [&str; 4] = [
    "Delivery Date",
    "Hour",
    "Total Output (MWh)",
    "Supply-based EF (g CO2e/kWh)",
];
const CONSUMPTION_HEADER: [&str; 3] = ["Delivery Date", "Hour", "Consumption-based EF (g CO2e/kWh)"];
const SPOT_CHECK_HEADER: [&str; 5] = [
    "Delivery Date",
    "Hour",
    "Total Exports (MWh)",
    "Total Imports (MWh)",
    "Total Import Emissions (t CO2e)",
];

fn key(ts: &Timestep) -> [String; 2] {
    [ts.date().format("%Y-%m-%d").to_string(), ts.hour().to_string()]
}

/// Writes the supply-based series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_supply_csv(rows: &[SupplyResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SUPPLY_HEADER)?;
    for r in rows {
        let [date, hour] = key(&r.timestep);
        wtr.write_record(&[
            date,
            hour,
            format!("{:.4}", r.total_output_mwh),
            format!("{:.4}", r.ef_g_per_kwh()),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the consumption-based series as CSV to any writer.
pub fn write_consumption_csv(rows: &[ConsumptionResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(CONSUMPTION_HEADER)?;
    for r in rows {
        let [date, hour] = key(&r.timestep);
        wtr.write_record(&[date, hour, format!("{:.4}", r.ef_g_per_kwh())])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_spot_check_csv(rows: &[SpotCheckRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(SPOT_CHECK_HEADER)?;
    for r in rows {
        let [date, hour] = key(&r.timestep);
        wtr.write_record(&[
            date,
            hour,
            format!("{:.4}", r.total_exports_mwh),
            format!("{:.4}", r.total_imports_mwh),
            format!("{:.4}", r.total_import_emissions_t),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Output files written under temporary names but not yet moved into place.
///
/// Dropping a stage without committing it removes the temporary files.
#[derive(Debug)]
#[must_use = "staged outputs are discarded unless committed"]
pub struct StagedOutputs {
    /// `(temporary, destination)` pairs in commit order.
    files: Vec<(PathBuf, PathBuf)>,
    rows: usize,
}

impl StagedOutputs {
    fn stage(
        &mut self,
        dest: &Path,
        write: impl FnOnce(io::BufWriter<File>) -> io::Result<()>,
    ) -> io::Result<()> {
        let tmp = tmp_path(dest);
        self.files.push((tmp.clone(), dest.to_path_buf()));
        write(io::BufWriter::new(File::create(&tmp)?))
    }

    /// Renames every staged file onto its destination, consumption last.
    ///
    /// # Errors
    ///
    /// Returns an `io::Error` if a rename fails. Files not yet renamed are
    /// removed.
    pub fn commit(mut self) -> io::Result<()> {
        while let Some((tmp, dest)) = self.files.first() {
            fs::rename(tmp, dest)?;
            self.files.remove(0);
        }
        info!(rows = self.rows, "wrote emission factor series");
        Ok(())
    }
}

impl Drop for StagedOutputs {
    fn drop(&mut self) {
        for (tmp, _) in &self.files {
            if fs::remove_file(tmp).is_ok() {
                debug!(path = %tmp.display(), "removed uncommitted output");
            }
        }
    }
}

/// Writes all three series of a finished report to temporary files next to
/// their destinations. Nothing is visible under the final names until
/// [`StagedOutputs::commit`].
///
/// # Errors
///
/// Returns an `io::Error` if the output directory cannot be created or any
/// file cannot be written; files staged so far are removed.
pub fn stage_outputs(report: &EfReport, paths: &OutputPaths) -> io::Result<StagedOutputs> {
    if let Some(dir) = paths.consumption.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut staged = StagedOutputs {
        files: Vec::with_capacity(3),
        rows: report.len(),
    };
    staged.stage(&paths.supply, |w| write_supply_csv(&report.supply, w))?;
    staged.stage(&paths.spot_check, |w| {
        write_spot_check_csv(&report.spot_checks, w)
    })?;
    // Consumption goes last: its presence marks a finished year.
    staged.stage(&paths.consumption, |w| {
        write_consumption_csv(&report.consumption, w)
    })?;
    Ok(staged)
}

/// Stages and commits all three series of a finished report.
pub fn write_outputs(report: &EfReport, paths: &OutputPaths) -> io::Result<()> {
    stage_outputs(report, paths)?.commit()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
