use super::{check_chromosomes, ConflictPolicy};
use crate::error::{Error, Result};
use crate::report::Diagnostic;
use crate::sampledata::{Genotype, SampleData, Site};
use tracing::{debug, warn};

/// Where one input's data for an aligned site lives, and how its allele
/// indices translate into the aligned allele list.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSource {
    pub row: usize,
    pub allele_map: Vec<Genotype>,
}

impl SiteSource {
    /// Translate a genotype of the source row into the aligned allele indexing.
    pub fn remap(&self, genotype: Genotype) -> Genotype {
        if genotype < 0 {
            genotype
        } else {
            self.allele_map[genotype as usize]
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSite {
    pub site: Site,
    /// One entry per input, `None` where the input lacks the site.
    pub sources: Vec<Option<SiteSource>>,
}

#[derive(Debug, Default)]
pub struct SiteAlignment {
    pub sites: Vec<AlignedSite>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SiteAlignment {
    pub fn positions(&self) -> Vec<u64> {
        self.sites.iter().map(|s| s.site.position).collect()
    }
}

/// Align the sites of several collections over one chromosome into their
/// ordered union. The ancestral allele comes from the first input defining a
/// position; derived alleles are unioned in first-seen order.
pub fn align_sites(inputs: &[&SampleData], policy: ConflictPolicy) -> Result<SiteAlignment> {
    if inputs.is_empty() {
        return Err(Error::EmptyInput);
    }
    for data in inputs {
        data.validate()?;
    }
    check_chromosomes(inputs.iter().copied())?;

    let mut alignment = SiteAlignment::default();
    let mut cursors = vec![0usize; inputs.len()];

    // Every input is sorted by position, so a k-way merge yields the sorted union.
    while let Some(position) = inputs
        .iter()
        .zip(&cursors)
        .filter_map(|(data, &c)| data.sites.get(c).map(|s| s.position))
        .min()
    {
        let defining: Vec<Option<usize>> = inputs
            .iter()
            .zip(&cursors)
            .map(|(data, &c)| match data.sites.get(c) {
                Some(site) if site.position == position => Some(c),
                _ => None,
            })
            .collect();
        for (cursor, row) in cursors.iter_mut().zip(&defining) {
            if row.is_some() {
                *cursor += 1;
            }
        }

        match align_one(inputs, position, &defining)? {
            Some(aligned) => alignment.sites.push(aligned),
            None => {
                let ancestral_alleles = inputs
                    .iter()
                    .zip(&defining)
                    .map(|(data, row)| row.map(|r| data.sites[r].ancestral().to_string()))
                    .collect::<Vec<_>>();
                match policy {
                    ConflictPolicy::Strict => {
                        return Err(Error::SiteConflict {
                            position,
                            alleles: ancestral_alleles.into_iter().flatten().collect(),
                        })
                    }
                    ConflictPolicy::Drop => {
                        debug!(position, ?ancestral_alleles, "dropping conflicting site");
                        alignment.diagnostics.push(Diagnostic::SiteConflict {
                            position,
                            ancestral_alleles,
                        });
                    }
                }
            }
        }
    }

    if !alignment.diagnostics.is_empty() {
        warn!(
            conflicts = alignment.diagnostics.len(),
            "dropped sites with conflicting ancestral alleles"
        );
    }
    Ok(alignment)
}

/// Build the aligned site for `position`, or `None` if the inputs disagree on
/// the ancestral allele.
fn align_one(
    inputs: &[&SampleData],
    position: u64,
    defining: &[Option<usize>],
) -> Result<Option<AlignedSite>> {
    let mut merged: Option<Site> = None;
    for (data, row) in inputs.iter().zip(defining) {
        let Some(row) = row else { continue };
        let site = &data.sites[*row];
        match merged.as_mut() {
            None => merged = Some(site.clone()),
            Some(m) => {
                if m.ancestral() != site.ancestral() {
                    return Ok(None);
                }
                for allele in site.derived() {
                    if !m.alleles.contains(allele) {
                        m.alleles.push(allele.clone());
                    }
                }
                if m.time.is_none() {
                    m.time = site.time;
                }
            }
        }
    }
    let Some(site) = merged else {
        return Ok(None);
    };
    if site.alleles.len() > Genotype::MAX as usize + 1 {
        return Err(Error::InvalidCollection(format!(
            "site {} would have {} alleles after merging",
            position,
            site.alleles.len()
        )));
    }

    let sources = inputs
        .iter()
        .zip(defining)
        .map(|(data, row)| {
            row.map(|r| SiteSource {
                row: r,
                allele_map: data.sites[r]
                    .alleles
                    .iter()
                    .map(|a| {
                        site.alleles
                            .iter()
                            .position(|m| m == a)
                            .map_or(crate::sampledata::MISSING_DATA, |i| i as Genotype)
                    })
                    .collect(),
            })
        })
        .collect();
    Ok(Some(AlignedSite { site, sources }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampledata::Sample;
    use test_case::test_case;

    fn collection(sites: &[(u64, &[&str])]) -> SampleData {
        SampleData::from_parts(
            "chr1",
            10_000.0,
            sites
                .iter()
                .map(|(p, a)| Site::new(*p, a.iter().map(|s| s.to_string()).collect()))
                .collect(),
            vec![Sample::new(format!("s{}", sites.len()))],
            sites.iter().map(|_| vec![0]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn union_is_sorted_and_unique() {
        let a = collection(&[(100, &["A", "G"]), (200, &["C", "T"])]);
        let b = collection(&[(50, &["T", "A"]), (200, &["C", "T"]), (300, &["G", "C"])]);
        let alignment = align_sites(&[&a, &b], ConflictPolicy::Drop).unwrap();
        assert_eq!(alignment.positions(), vec![50, 100, 200, 300]);
        let at_200 = &alignment.sites[2];
        assert_eq!(at_200.sources[0].as_ref().unwrap().row, 1);
        assert_eq!(at_200.sources[1].as_ref().unwrap().row, 1);
        assert!(alignment.sites[0].sources[0].is_none());
    }

    #[test]
    fn derived_alleles_are_unioned_and_remapped() {
        let a = collection(&[(100, &["A", "G"])]);
        let b = collection(&[(100, &["A", "T", "G"])]);
        let alignment = align_sites(&[&a, &b], ConflictPolicy::Drop).unwrap();
        let site = &alignment.sites[0];
        assert_eq!(site.site.alleles, vec!["A", "G", "T"]);
        let from_b = site.sources[1].as_ref().unwrap();
        assert_eq!(from_b.allele_map, vec![0, 2, 1]);
        assert_eq!(from_b.remap(1), 2);
        assert_eq!(from_b.remap(crate::sampledata::MISSING_DATA), -1);
    }

    #[test_case(ConflictPolicy::Drop, true ; "drop policy removes the site")]
    #[test_case(ConflictPolicy::Strict, false ; "strict policy fails")]
    fn ancestral_conflict(policy: ConflictPolicy, succeeds: bool) {
        let a = collection(&[(100, &["A", "G"]), (200, &["C", "T"])]);
        let b = collection(&[(200, &["T", "C"])]);
        let result = align_sites(&[&a, &b], policy);
        if succeeds {
            let alignment = result.unwrap();
            assert_eq!(alignment.positions(), vec![100]);
            assert_eq!(
                alignment.diagnostics,
                vec![Diagnostic::SiteConflict {
                    position: 200,
                    ancestral_alleles: vec![Some("C".into()), Some("T".into())],
                }]
            );
        } else {
            assert!(matches!(
                result.unwrap_err(),
                Error::SiteConflict { position: 200, .. }
            ));
        }
    }

    #[test]
    fn chromosome_mismatch_is_fatal() {
        let a = collection(&[(100, &["A", "G"])]);
        let mut b = collection(&[(100, &["A", "G"])]);
        b.chromosome = "chr2".into();
        assert!(matches!(
            align_sites(&[&a, &b], ConflictPolicy::Drop).unwrap_err(),
            Error::SchemaMismatch { .. }
        ));
    }

    #[test]
    fn site_time_taken_from_first_dated_input() {
        let a = collection(&[(100, &["A", "G"])]);
        let mut b = collection(&[(100, &["A", "G"])]);
        b.sites[0].time = Some(42.0);
        let alignment = align_sites(&[&a, &b], ConflictPolicy::Drop).unwrap();
        assert_eq!(alignment.sites[0].site.time, Some(42.0));
    }
}
