use super::load_collection;
use anyhow::Result;
use std::path::PathBuf;

pub fn run(input: PathBuf, json: bool) -> Result<()> {
    let data = load_collection(&input)?;
    let summary = data.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("File:              {}", input.display());
    println!("Chromosome:        {}", summary.chromosome);
    println!("Sequence length:   {}", summary.sequence_length);
    println!("Sites:             {}", summary.num_sites);
    println!("Samples:           {}", summary.num_samples);
    println!("Individuals:       {}", summary.num_individuals);
    println!("Missing genotypes: {:.2}%", summary.missing_fraction * 100.0);
    println!("Dated samples:     {}", summary.dated_samples);
    println!("Dated sites:       {}", summary.dated_sites);
    println!("Provenance:");
    for record in &data.provenances {
        println!(
            "  {} {} ({} {})",
            record.timestamp.to_rfc3339(),
            record.command,
            record.software.name,
            record.software.version
        );
    }
    Ok(())
}
