use super::{load_collection, Settings};
use crate::export::write_vcf;
use crate::report::Report;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn run(input: PathBuf, output: PathBuf, settings: &Settings) -> Result<()> {
    let progress = settings.spinner(format!("Loading {}...", input.display()))?;
    let data = load_collection(&input)?;

    progress.set_message(format!("Writing {}...", output.display()));
    write_vcf(&data, &output)
        .with_context(|| format!("Failed to export VCF to {}", output.display()))?;
    progress.finish_with_message(format!(
        "Exported {} sites x {} samples",
        data.num_sites(),
        data.num_samples()
    ));

    let mut report = Report::new("to-vcf", &output).with_inputs(&[&input]);
    report.count("records", data.num_sites());
    report.count("samples", data.num_samples());
    settings.finish_report(&report)
}
