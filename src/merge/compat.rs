use super::{check_chromosomes, source_digests};
use crate::error::Result;
use crate::sampledata::{InputDigest, ProvenanceRecord, SampleData};
use serde::Serialize;
use tracing::info;

/// Result of restricting a collection to what a target collection can accept.
#[derive(Debug)]
pub struct CompatibleSubset {
    pub data: SampleData,
    /// Sites whose position does not occur in the target.
    pub sites_absent: usize,
    /// Sites present in the target at the same position but with different alleles.
    pub sites_allele_mismatch: usize,
    /// Samples already present in the target.
    pub samples_dropped: Vec<String>,
}

#[derive(Serialize)]
struct CompatParameters<'a> {
    target_chromosome: &'a str,
    target_sites: usize,
    target_samples: usize,
}

/// Restrict `input` to sites the target has at the same position with the same
/// allele set, and to samples the target does not already contain.
///
/// Site and sample order follow `input`; no sites are introduced. Applying the
/// filter to its own output against the same target changes nothing.
pub fn make_compatible(
    input: &SampleData,
    target: &SampleData,
    sources: &[InputDigest],
) -> Result<CompatibleSubset> {
    input.validate()?;
    target.validate()?;
    check_chromosomes([target, input])?;

    let mut sites_absent = 0;
    let mut sites_allele_mismatch = 0;
    let mut keep_rows = Vec::with_capacity(input.num_sites());
    for (row, site) in input.sites.iter().enumerate() {
        match target.site_index(site.position) {
            None => sites_absent += 1,
            Some(t) if !target.sites[t].same_alleles(site) => sites_allele_mismatch += 1,
            Some(_) => keep_rows.push(row),
        }
    }

    let target_ids = target.sample_ids();
    let mut samples_dropped = Vec::new();
    let mut keep_cols = Vec::with_capacity(input.num_samples());
    for (col, sample) in input.samples.iter().enumerate() {
        if target_ids.contains(sample.id.as_str()) {
            samples_dropped.push(sample.id.clone());
        } else {
            keep_cols.push(col);
        }
    }

    let mut data = input.select(&keep_rows, &keep_cols);
    let parameters = CompatParameters {
        target_chromosome: &target.chromosome,
        target_sites: target.num_sites(),
        target_samples: target.num_samples(),
    };
    data.add_provenance(ProvenanceRecord::new(
        "make-compatible",
        serde_json::to_value(&parameters).unwrap_or_default(),
        source_digests(sources, 2),
    ));

    info!(
        kept_sites = keep_rows.len(),
        sites_absent,
        sites_allele_mismatch,
        kept_samples = keep_cols.len(),
        samples_dropped = samples_dropped.len(),
        "made collection compatible with target"
    );
    Ok(CompatibleSubset {
        data,
        sites_absent,
        sites_allele_mismatch,
        samples_dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::sampledata::{Sample, Site};

    fn site(position: u64, alleles: &[&str]) -> Site {
        Site::new(position, alleles.iter().map(|a| a.to_string()).collect())
    }

    fn target() -> SampleData {
        SampleData::from_parts(
            "chr20",
            1000.0,
            vec![site(100, &["A", "G"]), site(200, &["C", "T", "G"]), site(300, &["G", "A"])],
            vec![Sample::new("HG00096"), Sample::new("HG00097")],
            vec![vec![0, 1], vec![1, 2], vec![0, 0]],
        )
        .unwrap()
    }

    fn archaic() -> SampleData {
        SampleData::from_parts(
            "chr20",
            1000.0,
            vec![
                site(50, &["T", "C"]),
                site(100, &["A", "G"]),
                site(200, &["C", "G", "T"]),
                site(300, &["A", "G"]),
            ],
            vec![Sample::new("Altai"), Sample::new("HG00097"), Sample::new("Vindija")],
            vec![vec![0, 1, 1], vec![1, 1, 0], vec![2, 0, 1], vec![0, 1, 0]],
        )
        .unwrap()
    }

    #[test]
    fn keeps_matching_sites_and_new_samples() {
        let subset = make_compatible(&archaic(), &target(), &[]).unwrap();
        assert_eq!(subset.data.site_positions().collect::<Vec<_>>(), vec![100, 200]);
        let ids: Vec<&str> = subset.data.samples.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["Altai", "Vindija"]);
        assert_eq!(subset.data.genotypes, vec![vec![1, 0], vec![2, 1]]);
        // Allele order of the input is preserved.
        assert_eq!(subset.data.sites[1].alleles, vec!["C", "G", "T"]);
        assert_eq!(subset.sites_absent, 1);
        assert_eq!(subset.sites_allele_mismatch, 1);
        assert_eq!(subset.samples_dropped, vec!["HG00097"]);
        assert_eq!(subset.data.provenances.last().unwrap().command, "make-compatible");
    }

    #[test]
    fn is_idempotent() {
        let once = make_compatible(&archaic(), &target(), &[]).unwrap().data;
        let twice = make_compatible(&once, &target(), &[]).unwrap().data;
        assert_eq!(once.sites, twice.sites);
        assert_eq!(once.samples, twice.samples);
        assert_eq!(once.genotypes, twice.genotypes);
    }

    #[test]
    fn self_subset_keeps_all_sites_and_no_samples() {
        let t = target();
        let subset = make_compatible(&t, &t, &[]).unwrap();
        assert_eq!(subset.data.sites, t.sites);
        assert_eq!(subset.data.num_samples(), 0);
        assert_eq!(subset.data.genotypes, vec![Vec::<i8>::new(); 3]);
    }

    #[test]
    fn chromosome_mismatch_is_fatal() {
        let mut input = archaic();
        input.chromosome = "chr21".into();
        assert!(matches!(
            make_compatible(&input, &target(), &[]).unwrap_err(),
            Error::SchemaMismatch { .. }
        ));
    }
}
