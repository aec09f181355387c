pub mod tree_sequence;

pub use tree_sequence::{load_tree_sequence, Edge, Mutation, Node, TreeSequence, TsSite, NODE_IS_SAMPLE};

use crate::error::{Error, Result};
use crate::merge::{check_chromosomes, source_digests};
use crate::report::Diagnostic;
use crate::sampledata::{InputDigest, ProvenanceRecord, SampleData, TimeBound};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Serialize, Debug, Clone, Default)]
pub struct CombineOptions {
    /// Raise the time of each constrained site to the oldest sample carrying it.
    pub raise_site_times: bool,
}

#[derive(Debug)]
pub struct CombineOutcome {
    pub data: SampleData,
    pub diagnostics: Vec<Diagnostic>,
    /// Samples that received a time bound from the tree sequence.
    pub dated_samples: usize,
    /// Sites that received an age from the tree sequence.
    pub dated_sites: usize,
}

/// Carry sample dates and site ages from a dated tree sequence (inferred from
/// `high_coverage`) onto the superset collection `all_samples`.
///
/// Samples present as sample nodes are bounded to their node time, all others
/// are left unconstrained. A dated sample carrying a derived allele at a site
/// younger than the sample is reported as a constrained variant; genotypes are
/// never altered.
pub fn combine_dates(
    ts: &TreeSequence,
    high_coverage: &SampleData,
    all_samples: &SampleData,
    options: &CombineOptions,
    sources: &[InputDigest],
) -> Result<CombineOutcome> {
    ts.validate()?;
    high_coverage.validate()?;
    all_samples.validate()?;
    check_chromosomes([all_samples, high_coverage])?;

    let sample_nodes = ts.sample_nodes();
    let missing: Vec<String> = high_coverage
        .samples
        .iter()
        .filter(|s| !sample_nodes.contains_key(s.id.as_str()))
        .map(|s| s.id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(Error::SubsetViolation { missing });
    }

    let mut data = all_samples.clone();
    let mut dated_samples = 0;
    for sample in data.samples.iter_mut() {
        sample.time = sample_nodes
            .get(sample.id.as_str())
            .map(|&node| TimeBound::exact(ts.nodes[node].time));
        if sample.time.is_some() {
            dated_samples += 1;
        }
    }

    let ages = ts.site_ages();
    let mut dated_sites = 0;
    let mut diagnostics = Vec::new();
    for (site, row) in data.sites.iter_mut().zip(&data.genotypes) {
        let Some(&age) = ages.get(&site.position) else {
            continue;
        };
        dated_sites += 1;
        let mut oldest_carrier = age;
        for (sample, &genotype) in data.samples.iter().zip(row) {
            let Some(bound) = sample.time else { continue };
            if genotype > 0 && age < bound.lower {
                debug!(position = site.position, sample = %sample.id, age, sample_time = bound.lower, "constrained variant");
                diagnostics.push(Diagnostic::ConstrainedVariant {
                    position: site.position,
                    sample_id: sample.id.clone(),
                    site_time: age,
                    sample_time: bound.lower,
                });
                oldest_carrier = oldest_carrier.max(bound.lower);
            }
        }
        site.time = Some(if options.raise_site_times {
            oldest_carrier
        } else {
            age
        });
    }

    if !diagnostics.is_empty() {
        warn!(
            constrained_variants = diagnostics.len(),
            "dated samples carry derived alleles at younger sites"
        );
    }

    data.add_provenance(ProvenanceRecord::new(
        "combine-dates",
        serde_json::to_value(options).unwrap_or_default(),
        source_digests(sources, 3),
    ));

    info!(
        dated_samples,
        undated_samples = data.num_samples() - dated_samples,
        dated_sites,
        "combined tree sequence dates"
    );
    Ok(CombineOutcome {
        data,
        diagnostics,
        dated_samples,
        dated_sites,
    })
}
