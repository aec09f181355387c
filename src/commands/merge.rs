use super::{as_paths, digests, load_collection, Settings};
use crate::merge::{merge_collections, ConflictPolicy, MergeOptions};
use crate::report::Report;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn run(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    conflict_policy: Option<ConflictPolicy>,
    deduplicate_samples: bool,
    settings: &Settings,
) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("merge needs at least one input collection");
    }
    let options = MergeOptions {
        conflict_policy: conflict_policy.unwrap_or(settings.config.conflict_policy),
        deduplicate_samples,
    };

    let progress = settings.spinner(format!("Loading {} collections...", inputs.len()))?;
    let collections = inputs
        .iter()
        .map(|p| load_collection(p))
        .collect::<Result<Vec<_>>>()?;
    let sources = digests(&as_paths(&inputs))?;

    progress.set_message("Merging collections...");
    let outcome = merge_collections(&collections, &options, &sources)
        .context("Failed to merge sample data collections")?;

    progress.set_message(format!("Writing {}...", output.display()));
    settings.save(&outcome.data, &output)?;
    progress.finish_with_message(format!(
        "Merged {} sites x {} samples into {}",
        outcome.data.num_sites(),
        outcome.data.num_samples(),
        output.display()
    ));

    let mut report = Report::new("merge", &output)
        .with_parameters(serde_json::to_value(&options)?)
        .with_inputs(&inputs);
    report.count("sites", outcome.data.num_sites());
    report.count("samples", outcome.data.num_samples());
    report.count(
        "input_sites",
        collections.iter().map(|d| d.num_sites()).collect::<Vec<_>>(),
    );
    report.extend_diagnostics(outcome.diagnostics);
    settings.finish_report(&report)
}
