use super::{digests, load_collection, Settings};
use crate::merge::make_compatible;
use crate::report::Report;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn run(input: PathBuf, target: PathBuf, output: PathBuf, settings: &Settings) -> Result<()> {
    let progress = settings.spinner("Loading collections...")?;
    let data = load_collection(&input)?;
    let target_data = load_collection(&target)?;
    let sources = digests(&[input.as_path(), target.as_path()])?;

    progress.set_message(format!("Filtering {} against {}...", input.display(), target.display()));
    let subset = make_compatible(&data, &target_data, &sources).with_context(|| {
        format!(
            "{} cannot be made compatible with {}",
            input.display(),
            target.display()
        )
    })?;

    settings.save(&subset.data, &output)?;
    progress.finish_with_message(format!(
        "Kept {}/{} sites and {}/{} samples",
        subset.data.num_sites(),
        data.num_sites(),
        subset.data.num_samples(),
        data.num_samples()
    ));

    let mut report = Report::new("make-compatible", &output)
        .with_parameters(serde_json::json!({ "target": target.display().to_string() }))
        .with_inputs(&[&input, &target]);
    report.count("sites_kept", subset.data.num_sites());
    report.count("sites_absent_from_target", subset.sites_absent);
    report.count("sites_allele_mismatch", subset.sites_allele_mismatch);
    report.count("samples_kept", subset.data.num_samples());
    report.count("samples_already_in_target", subset.samples_dropped);
    settings.finish_report(&report)
}
