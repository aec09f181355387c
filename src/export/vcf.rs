use crate::error::{Error, Result};
use crate::sampledata::io::{is_gzip_path, write_atomic};
use crate::sampledata::{SampleData, MISSING_DATA};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// A VCF column: one individual and the sample columns (haplotypes) it groups.
#[derive(Debug, PartialEq)]
pub(crate) struct VcfColumn {
    pub name: String,
    pub samples: Vec<usize>,
}

/// Group samples by individual in order of first appearance. Samples without
/// an individual become their own (haploid) column and never absorb the
/// haplotypes of an individual that happens to share their identifier.
pub(crate) fn vcf_columns(data: &SampleData) -> Vec<VcfColumn> {
    let mut columns: Vec<VcfColumn> = Vec::new();
    let mut by_individual: HashMap<&str, usize> = HashMap::new();
    for (i, sample) in data.samples.iter().enumerate() {
        match sample.individual.as_deref() {
            Some(individual) => match by_individual.get(individual) {
                Some(&col) => columns[col].samples.push(i),
                None => {
                    by_individual.insert(individual, columns.len());
                    columns.push(VcfColumn {
                        name: individual.to_string(),
                        samples: vec![i],
                    });
                }
            },
            None => columns.push(VcfColumn {
                name: sample.id.clone(),
                samples: vec![i],
            }),
        }
    }
    columns
}

/// Write the collection as phased VCFv4.2. Site ages go into the `AGE` INFO field.
pub fn write_vcf(data: &SampleData, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let columns = vcf_columns(data);
    write_atomic(path, is_gzip_path(path), |out| {
        write_records(data, &columns, out).map_err(|e| Error::io(path, e))
    })
}

fn write_records(data: &SampleData, columns: &[VcfColumn], out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "##fileformat=VCFv4.2")?;
    writeln!(out, "##source={} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    writeln!(
        out,
        "##contig=<ID={},length={}>",
        data.chromosome, data.sequence_length as u64
    )?;
    writeln!(
        out,
        "##INFO=<ID=AGE,Number=1,Type=Float,Description=\"Estimated site age\">"
    )?;
    writeln!(
        out,
        "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">"
    )?;
    write!(out, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT")?;
    for column in columns {
        write!(out, "\t{}", column.name)?;
    }
    writeln!(out)?;

    for (site, row) in data.sites.iter().zip(&data.genotypes) {
        let alt = if site.derived().is_empty() {
            ".".to_string()
        } else {
            site.derived().join(",")
        };
        let info = site
            .time
            .map_or_else(|| ".".to_string(), |t| format!("AGE={}", t));
        write!(
            out,
            "{}\t{}\t.\t{}\t{}\t.\tPASS\t{}\tGT",
            data.chromosome,
            site.position,
            site.ancestral(),
            alt,
            info
        )?;
        for column in columns {
            let calls: Vec<String> = column
                .samples
                .iter()
                .map(|&j| match row[j] {
                    MISSING_DATA => ".".to_string(),
                    g => g.to_string(),
                })
                .collect();
            write!(out, "\t{}", calls.join("|"))?;
        }
        writeln!(out)?;
    }
    Ok(())
}
