//! Ontario emission factor entry point: config resolution, input loading,
//! calculation and output.

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use ontario_ef::cli::CliOptions;
use ontario_ef::ef::engine::Calculator;
use ontario_ef::ef::summary::EfSummary;
use ontario_ef::ef::tables::GWH_PER_MWH;
use ontario_ef::ef::technology::Technology;
use ontario_ef::io::export::stage_outputs;
use ontario_ef::io::ieso::read_inputs;
use ontario_ef::io::{OutputPaths, ReportPaths};
use ontario_ef::telemetry::init_tracing;

fn main() -> ExitCode {
    let cli = CliOptions::parse();
    init_tracing(cli.log_json);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &CliOptions) -> Result<()> {
    let cfg = cli.resolve_config()?;

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        anyhow::bail!("{} configuration error(s)", errors.len());
    }

    let params = cfg.parameters()?;
    for tech in Technology::ALL {
        info!(
            technology = %tech,
            t_per_gwh = params.rates.rate(tech) * GWH_PER_MWH,
            "emission rate"
        );
    }
    for (code, factor) in params.neighbors.iter() {
        info!(region = %code, t_per_gwh = factor * GWH_PER_MWH, "neighbour factor");
    }

    let year = cfg.run.year;
    let outputs = OutputPaths::new(&cfg.run.output_dir, year);
    if outputs.consumption.exists() && !cli.force {
        warn!(
            path = %outputs.consumption.display(),
            "output already exists, skipping (use --force to recompute)"
        );
        return Ok(());
    }

    let reports = ReportPaths::new(&cfg.run.data_dir, year);
    info!(year, root = %reports.root().display(), "reading IESO reports");
    let inputs = read_inputs(&reports)?;

    let report = Calculator::new(&params).run(&inputs)?;
    let staged = stage_outputs(&report, &outputs).context("failed to write output series")?;
    let summary = EfSummary::from_report(&report);

    // Written before the series are moved into place, so a failure here
    // leaves the year unfinished.
    if let Some(path) = &cli.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }

    staged
        .commit()
        .context("failed to move output series into place")?;
    println!("{summary}");

    Ok(())
}
