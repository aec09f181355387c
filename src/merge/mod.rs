pub mod aligner;
pub mod compat;

pub use aligner::{align_sites, AlignedSite, SiteAlignment, SiteSource};
pub use compat::{make_compatible, CompatibleSubset};

use crate::error::{Error, Result};
use crate::report::Diagnostic;
use crate::sampledata::provenance::combine_logs;
use crate::sampledata::{
    same_chromosome, Genotype, InputDigest, ProvenanceRecord, Sample, SampleData, MISSING_DATA,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// What to do when merged inputs disagree on a site's ancestral allele.
#[derive(clap::ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Drop the site and record a diagnostic.
    #[default]
    #[value(name = "drop")]
    Drop,
    /// Abort the merge.
    #[value(name = "strict")]
    Strict,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct MergeOptions {
    pub conflict_policy: ConflictPolicy,
    /// Keep the first occurrence of a repeated sample identifier instead of failing.
    pub deduplicate_samples: bool,
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub data: SampleData,
    pub diagnostics: Vec<Diagnostic>,
}

/// All collections must name the same chromosome as the first one.
pub(crate) fn check_chromosomes<'a>(inputs: impl IntoIterator<Item = &'a SampleData>) -> Result<()> {
    let mut inputs = inputs.into_iter().enumerate();
    let Some((_, first)) = inputs.next() else {
        return Ok(());
    };
    for (i, data) in inputs {
        if !same_chromosome(&first.chromosome, &data.chromosome) {
            return Err(Error::SchemaMismatch {
                context: format!("input {}", i),
                expected: first.chromosome.clone(),
                found: data.chromosome.clone(),
            });
        }
    }
    Ok(())
}

/// Label inputs without a backing file so provenance still lists every input.
pub(crate) fn source_digests(sources: &[InputDigest], count: usize) -> Vec<InputDigest> {
    (0..count)
        .map(|i| {
            sources
                .get(i)
                .cloned()
                .unwrap_or_else(|| InputDigest::in_memory(format!("input {}", i)))
        })
        .collect()
}

/// Merge collections over one chromosome into a single collection.
///
/// Sites are the union of the inputs' sites (see [`align_sites`]), samples are
/// concatenated in input order, and cells no input defines are [`MISSING_DATA`].
/// `sources` identifies the inputs in the appended provenance record.
pub fn merge_collections(
    inputs: &[SampleData],
    options: &MergeOptions,
    sources: &[InputDigest],
) -> Result<MergeOutcome> {
    if inputs.is_empty() {
        return Err(Error::EmptyInput);
    }
    let refs: Vec<&SampleData> = inputs.iter().collect();
    let alignment = align_sites(&refs, options.conflict_policy)?;
    let mut diagnostics = alignment.diagnostics.clone();

    let (samples, columns) = concatenate_samples(inputs, options, &mut diagnostics)?;

    let mut genotypes: Vec<Vec<Genotype>> = Vec::with_capacity(alignment.sites.len());
    for aligned in &alignment.sites {
        let mut row = vec![MISSING_DATA; samples.len()];
        for (k, source) in aligned.sources.iter().enumerate() {
            let Some(source) = source else { continue };
            let input_row = &inputs[k].genotypes[source.row];
            for (col, &g) in input_row.iter().enumerate() {
                if let Some(out) = columns[k][col] {
                    row[out] = source.remap(g);
                }
            }
        }
        genotypes.push(row);
    }

    let lengths: Vec<f64> = inputs.iter().map(|d| d.sequence_length).collect();
    let sequence_length = lengths.iter().copied().fold(0.0, f64::max);
    if lengths.iter().any(|&l| l != lengths[0]) {
        warn!(?lengths, "inputs disagree on sequence length, keeping {}", sequence_length);
        diagnostics.push(Diagnostic::SequenceLengthMismatch { lengths });
    }

    let mut data = SampleData::from_parts(
        inputs[0].chromosome.clone(),
        sequence_length,
        alignment.sites.into_iter().map(|a| a.site).collect(),
        samples,
        genotypes,
    )?;
    data.provenances = combine_logs(inputs.iter().map(|d| d.provenances.as_slice()));
    data.add_provenance(ProvenanceRecord::new(
        "merge",
        serde_json::to_value(options).unwrap_or_default(),
        source_digests(sources, inputs.len()),
    ));

    info!(
        inputs = inputs.len(),
        sites = data.num_sites(),
        samples = data.num_samples(),
        diagnostics = diagnostics.len(),
        "merged collections"
    );
    Ok(MergeOutcome { data, diagnostics })
}

/// Concatenate samples of all inputs, returning the output samples and, per
/// input, the output column of each input column (`None` for dropped duplicates).
fn concatenate_samples(
    inputs: &[SampleData],
    options: &MergeOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(Vec<Sample>, Vec<Vec<Option<usize>>>)> {
    let mut samples: Vec<Sample> = Vec::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(inputs.len());

    for (k, data) in inputs.iter().enumerate() {
        let mut input_columns = Vec::with_capacity(data.samples.len());
        for sample in &data.samples {
            if let Some(&first_input) = first_seen.get(&sample.id) {
                if !options.deduplicate_samples {
                    return Err(Error::DuplicateSample {
                        id: sample.id.clone(),
                        first_input,
                        second_input: k,
                    });
                }
                diagnostics.push(Diagnostic::DuplicateSampleDropped {
                    sample_id: sample.id.clone(),
                    input: k,
                });
                input_columns.push(None);
                continue;
            }
            first_seen.insert(sample.id.clone(), k);
            input_columns.push(Some(samples.len()));
            samples.push(sample.clone());
        }
        columns.push(input_columns);
    }
    Ok((samples, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampledata::Site;

    fn alleles(a: &[&str]) -> Vec<String> {
        a.iter().map(|s| s.to_string()).collect()
    }

    fn collection_a() -> SampleData {
        SampleData::from_parts(
            "chr20",
            1000.0,
            vec![Site::new(100, alleles(&["A", "G"])), Site::new(200, alleles(&["C", "T"]))],
            vec![Sample::new("s1"), Sample::new("s2")],
            vec![vec![0, 1], vec![1, 1]],
        )
        .unwrap()
    }

    fn collection_b() -> SampleData {
        SampleData::from_parts(
            "20",
            1000.0,
            vec![Site::new(200, alleles(&["C", "T"])), Site::new(300, alleles(&["G", "A"]))],
            vec![Sample::new("s3")],
            vec![vec![0], vec![1]],
        )
        .unwrap()
    }

    #[test]
    fn merges_sites_samples_and_missing_cells() {
        let outcome = merge_collections(
            &[collection_a(), collection_b()],
            &MergeOptions::default(),
            &[],
        )
        .unwrap();
        let data = outcome.data;
        assert_eq!(data.site_positions().collect::<Vec<_>>(), vec![100, 200, 300]);
        let ids: Vec<&str> = data.samples.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
        assert_eq!(
            data.genotypes,
            vec![
                vec![0, 1, MISSING_DATA],
                vec![1, 1, 0],
                vec![MISSING_DATA, MISSING_DATA, 1],
            ]
        );
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(data.chromosome, "chr20");
    }

    #[test]
    fn duplicate_samples_fail_without_deduplication() {
        let mut b = collection_b();
        b.samples[0].id = "s2".into();
        let err = merge_collections(&[collection_a(), b], &MergeOptions::default(), &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateSample { ref id, first_input: 0, second_input: 1 } if id == "s2"
        ));
    }

    #[test]
    fn deduplication_keeps_first_occurrence() {
        let mut b = collection_b();
        b.samples[0].id = "s2".into();
        let options = MergeOptions {
            deduplicate_samples: true,
            ..MergeOptions::default()
        };
        let outcome = merge_collections(&[collection_a(), b], &options, &[]).unwrap();
        assert_eq!(outcome.data.num_samples(), 2);
        assert_eq!(outcome.data.genotypes[2], vec![MISSING_DATA, MISSING_DATA]);
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::DuplicateSampleDropped {
                sample_id: "s2".into(),
                input: 1
            }]
        );
    }

    #[test]
    fn provenance_lists_every_input() {
        let mut a = collection_a();
        a.add_provenance(ProvenanceRecord::new("convert-1kg", serde_json::Value::Null, vec![]));
        let outcome = merge_collections(
            &[a.clone(), collection_b()],
            &MergeOptions::default(),
            &[InputDigest::in_memory("1kg.samples")],
        )
        .unwrap();
        let log = &outcome.data.provenances;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], a.provenances[0]);
        let record = &log[1];
        assert_eq!(record.command, "merge");
        assert_eq!(record.inputs.len(), 2);
        assert_eq!(record.inputs[0].path, "1kg.samples");
        assert_eq!(record.inputs[1].path, "input 1");
        assert_eq!(record.parameters["conflict_policy"], "drop");
    }

    #[test]
    fn unequal_sequence_lengths_keep_the_longest() {
        let mut b = collection_b();
        b.sequence_length = 2000.0;
        let outcome =
            merge_collections(&[collection_a(), b], &MergeOptions::default(), &[]).unwrap();
        assert_eq!(outcome.data.sequence_length, 2000.0);
        assert_eq!(
            outcome.diagnostics,
            vec![Diagnostic::SequenceLengthMismatch {
                lengths: vec![1000.0, 2000.0]
            }]
        );
    }

    #[test]
    fn out_of_range_genotype_is_rejected() {
        let mut b = collection_b();
        b.genotypes[0][0] = 5;
        let err = merge_collections(&[collection_a(), b], &MergeOptions::default(), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidCollection(_)));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            merge_collections(&[], &MergeOptions::default(), &[]).unwrap_err(),
            Error::EmptyInput
        ));
    }
}
