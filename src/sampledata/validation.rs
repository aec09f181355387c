use super::{Genotype, SampleData, Site, FORMAT_NAME, FORMAT_VERSION, MISSING_DATA};
use crate::error::{Error, Result};
use std::collections::HashSet;

pub(super) fn validate(data: &SampleData) -> Result<()> {
    if data.format_name != FORMAT_NAME {
        return Err(Error::InvalidCollection(format!(
            "unexpected format '{}'",
            data.format_name
        )));
    }
    if data.format_version.0 != FORMAT_VERSION.0 {
        return Err(Error::InvalidCollection(format!(
            "unsupported format version {}.{}",
            data.format_version.0, data.format_version.1
        )));
    }
    if data.sequence_length.is_nan() || data.sequence_length < 0.0 {
        return Err(Error::InvalidCollection(format!(
            "bad sequence length {}",
            data.sequence_length
        )));
    }

    let mut previous: Option<u64> = None;
    for site in &data.sites {
        if let Some(prev) = previous {
            if site.position <= prev {
                return Err(Error::InvalidCollection(format!(
                    "site positions not strictly increasing ({} after {})",
                    site.position, prev
                )));
            }
        }
        if data.sequence_length > 0.0 && site.position as f64 >= data.sequence_length {
            return Err(Error::InvalidCollection(format!(
                "site {} beyond sequence length {}",
                site.position, data.sequence_length
            )));
        }
        previous = Some(site.position);
    }

    let mut ids = HashSet::with_capacity(data.samples.len());
    for sample in &data.samples {
        if !ids.insert(sample.id.as_str()) {
            return Err(Error::InvalidCollection(format!(
                "sample identifier '{}' is not unique",
                sample.id
            )));
        }
        if let Some(bound) = sample.time {
            if !bound.is_valid() {
                return Err(Error::InvalidCollection(format!(
                    "sample '{}' has invalid time bound [{}, {}]",
                    sample.id, bound.lower, bound.upper
                )));
            }
        }
    }

    if data.genotypes.len() != data.sites.len() {
        return Err(Error::InvalidCollection(format!(
            "{} genotype rows for {} sites",
            data.genotypes.len(),
            data.sites.len()
        )));
    }
    for (site, row) in data.sites.iter().zip(&data.genotypes) {
        if row.len() != data.samples.len() {
            return Err(Error::InvalidCollection(format!(
                "site {} has {} genotypes for {} samples",
                site.position,
                row.len(),
                data.samples.len()
            )));
        }
        check_row(site, row)?;
    }
    Ok(())
}

/// Alleles must be present and distinct, genotypes must index into them.
fn check_row(site: &Site, row: &[Genotype]) -> Result<()> {
    if site.alleles.is_empty() {
        return Err(Error::InvalidCollection(format!(
            "site {} has no alleles",
            site.position
        )));
    }
    let distinct: HashSet<&String> = site.alleles.iter().collect();
    if distinct.len() != site.alleles.len() {
        return Err(Error::InvalidCollection(format!(
            "site {} repeats an allele: {:?}",
            site.position, site.alleles
        )));
    }
    if let Some(bad) = row
        .iter()
        .find(|&&g| g != MISSING_DATA && (g < 0 || g as usize >= site.alleles.len()))
    {
        return Err(Error::InvalidCollection(format!(
            "site {} has genotype {} but only {} alleles",
            site.position,
            bad,
            site.alleles.len()
        )));
    }
    Ok(())
}
