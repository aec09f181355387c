use super::{digests, load_collection, Settings};
use crate::report::Report;
use crate::sampledata::ProvenanceRecord;
use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn run(
    input: PathBuf,
    output: PathBuf,
    samples: Option<Vec<String>>,
    start: Option<u64>,
    end: Option<u64>,
    settings: &Settings,
) -> Result<()> {
    let data = load_collection(&input)?;
    let range = match (start, end) {
        (None, None) => None,
        (start, end) => Some(start.unwrap_or(0)..end.unwrap_or(u64::MAX)),
    };
    if let Some(r) = &range {
        if r.start >= r.end {
            anyhow::bail!("Empty position range {}..{}", r.start, r.end);
        }
    }

    let mut subset = data
        .subset(samples.as_deref(), range.clone())
        .with_context(|| format!("Failed to subset {}", input.display()))?;
    let parameters = serde_json::json!({
        "samples": samples,
        "start": range.as_ref().map(|r| r.start),
        "end": range.as_ref().map(|r| r.end),
    });
    subset.add_provenance(ProvenanceRecord::new(
        "subset",
        parameters.clone(),
        digests(&[input.as_path()])?,
    ));
    settings.save(&subset, &output)?;
    tracing::info!(
        sites = subset.num_sites(),
        samples = subset.num_samples(),
        "wrote subset to {}",
        output.display()
    );

    let mut report = Report::new("subset", &output)
        .with_parameters(parameters)
        .with_inputs(&[&input]);
    report.count("sites", subset.num_sites());
    report.count("samples", subset.num_samples());
    settings.finish_report(&report)
}
