pub mod io;
pub mod provenance;
pub mod types;
mod validation;

pub use provenance::{InputDigest, ProvenanceRecord, Software};
pub use types::{Genotype, Sample, Site, TimeBound, MISSING_DATA};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

pub const FORMAT_NAME: &str = "sampledata-tools.samples";
pub const FORMAT_VERSION: (u32, u32) = (1, 0);

fn default_format_name() -> String {
    FORMAT_NAME.to_string()
}

fn default_format_version() -> (u32, u32) {
    FORMAT_VERSION
}

/// A sites x samples genotype matrix with per-site and per-sample metadata
/// and a provenance log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SampleData {
    #[serde(default = "default_format_name")]
    pub format_name: String,
    #[serde(default = "default_format_version")]
    pub format_version: (u32, u32),
    pub chromosome: String,
    pub sequence_length: f64,
    pub sites: Vec<Site>,
    pub samples: Vec<Sample>,
    /// One row per site, one column per sample.
    pub genotypes: Vec<Vec<Genotype>>,
    #[serde(default)]
    pub provenances: Vec<ProvenanceRecord>,
}

/// Counts describing a collection, printed by `info`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Summary {
    pub chromosome: String,
    pub sequence_length: f64,
    pub num_sites: usize,
    pub num_samples: usize,
    pub num_individuals: usize,
    pub missing_fraction: f64,
    pub dated_samples: usize,
    pub dated_sites: usize,
    pub provenance_records: usize,
}

impl SampleData {
    /// An empty collection for a chromosome of the given length.
    pub fn new(chromosome: impl Into<String>, sequence_length: f64) -> Self {
        SampleData {
            format_name: FORMAT_NAME.to_string(),
            format_version: FORMAT_VERSION,
            chromosome: chromosome.into(),
            sequence_length,
            sites: Vec::new(),
            samples: Vec::new(),
            genotypes: Vec::new(),
            provenances: Vec::new(),
        }
    }

    /// Build a collection from parts and check its invariants.
    pub fn from_parts(
        chromosome: impl Into<String>,
        sequence_length: f64,
        sites: Vec<Site>,
        samples: Vec<Sample>,
        genotypes: Vec<Vec<Genotype>>,
    ) -> Result<Self> {
        let data = SampleData {
            sites,
            samples,
            genotypes,
            ..SampleData::new(chromosome, sequence_length)
        };
        data.validate()?;
        Ok(data)
    }

    pub fn num_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn site_positions(&self) -> impl Iterator<Item = u64> + '_ {
        self.sites.iter().map(|s| s.position)
    }

    /// Index of the site at `position`, if any. Positions are sorted so this is a binary search.
    pub fn site_index(&self, position: u64) -> Option<usize> {
        self.sites.binary_search_by_key(&position, |s| s.position).ok()
    }

    pub fn sample_ids(&self) -> HashSet<&str> {
        self.samples.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn genotype(&self, site: usize, sample: usize) -> Genotype {
        self.genotypes[site][sample]
    }

    /// The allele string called at a cell, or `None` for missing data.
    pub fn allele(&self, site: usize, sample: usize) -> Option<&str> {
        let g = self.genotype(site, sample);
        if g == MISSING_DATA {
            None
        } else {
            self.sites[site].alleles.get(g as usize).map(String::as_str)
        }
    }

    /// Check every structural invariant of the collection.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Restrict the collection to the given samples (in collection order) and
    /// to sites whose position lies in `positions`.
    pub fn subset(&self, samples: Option<&[String]>, positions: Option<Range<u64>>) -> Result<Self> {
        let sample_cols: Vec<usize> = match samples {
            Some(ids) => {
                let by_id: HashMap<&str, usize> = self
                    .samples
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (s.id.as_str(), i))
                    .collect();
                let mut wanted = HashSet::new();
                for id in ids {
                    let col = by_id
                        .get(id.as_str())
                        .ok_or_else(|| Error::UnknownSample(id.clone()))?;
                    wanted.insert(*col);
                }
                (0..self.samples.len()).filter(|i| wanted.contains(i)).collect()
            }
            None => (0..self.samples.len()).collect(),
        };
        let site_rows: Vec<usize> = self
            .sites
            .iter()
            .enumerate()
            .filter(|(_, s)| positions.as_ref().map_or(true, |r| r.contains(&s.position)))
            .map(|(i, _)| i)
            .collect();
        Ok(self.select(&site_rows, &sample_cols))
    }

    /// Copy out the given site rows and sample columns, keeping metadata and provenance.
    pub(crate) fn select(&self, site_rows: &[usize], sample_cols: &[usize]) -> Self {
        SampleData {
            format_name: self.format_name.clone(),
            format_version: self.format_version,
            chromosome: self.chromosome.clone(),
            sequence_length: self.sequence_length,
            sites: site_rows.iter().map(|&i| self.sites[i].clone()).collect(),
            samples: sample_cols.iter().map(|&j| self.samples[j].clone()).collect(),
            genotypes: site_rows
                .iter()
                .map(|&i| sample_cols.iter().map(|&j| self.genotypes[i][j]).collect())
                .collect(),
            provenances: self.provenances.clone(),
        }
    }

    pub fn add_provenance(&mut self, record: ProvenanceRecord) {
        self.provenances.push(record);
    }

    pub fn summary(&self) -> Summary {
        let cells = self.num_sites() * self.num_samples();
        let missing = self
            .genotypes
            .iter()
            .flatten()
            .filter(|&&g| g == MISSING_DATA)
            .count();
        let individuals: HashSet<&str> = self
            .samples
            .iter()
            .map(|s| s.individual.as_deref().unwrap_or(s.id.as_str()))
            .collect();
        Summary {
            chromosome: self.chromosome.clone(),
            sequence_length: self.sequence_length,
            num_sites: self.num_sites(),
            num_samples: self.num_samples(),
            num_individuals: individuals.len(),
            missing_fraction: if cells > 0 {
                missing as f64 / cells as f64
            } else {
                0.0
            },
            dated_samples: self.samples.iter().filter(|s| s.time.is_some()).count(),
            dated_sites: self.sites.iter().filter(|s| s.time.is_some()).count(),
            provenance_records: self.provenances.len(),
        }
    }
}

/// Compare contig names, treating a leading `chr` as optional and `M`/`MT` as the same contig.
pub fn same_chromosome(a: &str, b: &str) -> bool {
    fn canonical(name: &str) -> &str {
        let bare = name.strip_prefix("chr").unwrap_or(name);
        if bare == "M" {
            "MT"
        } else {
            bare
        }
    }
    canonical(a) == canonical(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alleles(a: &[&str]) -> Vec<String> {
        a.iter().map(|s| s.to_string()).collect()
    }

    fn example() -> SampleData {
        SampleData::from_parts(
            "chr20",
            1000.0,
            vec![
                Site::new(100, alleles(&["A", "G"])),
                Site::new(200, alleles(&["C", "T"])),
                Site::new(300, alleles(&["G", "A", "T"])),
            ],
            vec![
                Sample::new("s1").with_individual("ind1"),
                Sample::new("s2").with_individual("ind1"),
                Sample::new("s3"),
            ],
            vec![vec![0, 1, MISSING_DATA], vec![1, 1, 0], vec![2, 0, 1]],
        )
        .unwrap()
    }

    #[test]
    fn subset_keeps_collection_order() {
        let data = example();
        let sub = data
            .subset(Some(&["s3".to_string(), "s1".to_string()]), Some(150..301))
            .unwrap();
        assert_eq!(sub.samples[0].id, "s1");
        assert_eq!(sub.samples[1].id, "s3");
        assert_eq!(sub.site_positions().collect::<Vec<_>>(), vec![200, 300]);
        assert_eq!(sub.genotypes, vec![vec![1, 0], vec![2, 1]]);
    }

    #[test]
    fn subset_rejects_unknown_sample() {
        let err = example().subset(Some(&["nope".to_string()]), None).unwrap_err();
        assert!(matches!(err, Error::UnknownSample(id) if id == "nope"));
    }

    #[test]
    fn summary_counts() {
        let summary = example().summary();
        assert_eq!(summary.num_sites, 3);
        assert_eq!(summary.num_samples, 3);
        assert_eq!(summary.num_individuals, 2);
        assert!((summary.missing_fraction - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn allele_lookup() {
        let data = example();
        assert_eq!(data.allele(2, 0), Some("T"));
        assert_eq!(data.allele(0, 2), None);
    }

    #[test]
    fn chromosome_aliases() {
        assert!(same_chromosome("chr20", "20"));
        assert!(same_chromosome("chrM", "MT"));
        assert!(!same_chromosome("chr2", "chr20"));
    }
}
