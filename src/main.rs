use clap::Parser;
use sampledata_tools::cli::{self, Commands};
use sampledata_tools::commands::{self, Settings};
use sampledata_tools::config::Config;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

fn main() {
    let args = cli::Args::parse();
    init_logging(args.verbose);

    let settings = Settings::new(Config::load(), args.no_progress, args.no_report);

    let result = match args.command {
        Commands::Merge {
            inputs,
            output,
            conflict_policy,
            deduplicate_samples,
        } => commands::merge::run(inputs, output, conflict_policy, deduplicate_samples, &settings),
        Commands::MakeCompatible {
            input,
            target,
            output,
        } => commands::make_compatible::run(input, target, output, &settings),
        Commands::CombineDates {
            tree_sequence,
            high_coverage,
            all_samples,
            output,
            raise_site_times,
        } => commands::combine_dates::run(
            tree_sequence,
            high_coverage,
            all_samples,
            output,
            raise_site_times,
            &settings,
        ),
        Commands::Subset {
            input,
            output,
            samples,
            start,
            end,
        } => commands::subset::run(input, output, samples, start, end, &settings),
        Commands::ToVcf { input, output } => commands::to_vcf::run(input, output, &settings),
        Commands::Info { input, json } => commands::info::run(input, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
