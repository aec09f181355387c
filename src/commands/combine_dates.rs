use super::{digests, load_collection, Settings};
use crate::dating::{combine_dates, load_tree_sequence, CombineOptions};
use crate::report::Report;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn run(
    tree_sequence: PathBuf,
    high_coverage: PathBuf,
    all_samples: PathBuf,
    output: PathBuf,
    raise_site_times: bool,
    settings: &Settings,
) -> Result<()> {
    let progress = settings.spinner("Loading dated tree sequence...")?;
    let ts = load_tree_sequence(&tree_sequence)
        .with_context(|| format!("Failed to load tree sequence {}", tree_sequence.display()))?;
    progress.set_message("Loading sample data...");
    let high = load_collection(&high_coverage)?;
    let all = load_collection(&all_samples)?;
    let sources = digests(&[
        tree_sequence.as_path(),
        high_coverage.as_path(),
        all_samples.as_path(),
    ])?;

    progress.set_message("Attaching dates...");
    let options = CombineOptions { raise_site_times };
    let outcome = combine_dates(&ts, &high, &all, &options, &sources)
        .context("Failed to combine tree sequence dates with sample data")?;

    settings.save(&outcome.data, &output)?;
    progress.finish_with_message(format!(
        "Dated {} samples and {} sites, {} constrained variants",
        outcome.dated_samples,
        outcome.dated_sites,
        outcome.diagnostics.len()
    ));

    let mut report = Report::new("combine-dates", &output)
        .with_parameters(serde_json::to_value(&options)?)
        .with_inputs(&[&tree_sequence, &high_coverage, &all_samples]);
    report.count("samples", outcome.data.num_samples());
    report.count("dated_samples", outcome.dated_samples);
    report.count("sites", outcome.data.num_sites());
    report.count("dated_sites", outcome.dated_sites);
    report.count("constrained_variants", outcome.diagnostics.len());
    report.extend_diagnostics(outcome.diagnostics);
    settings.finish_report(&report)
}
