use crate::merge::ConflictPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log debug output (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not draw progress spinners
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Do not write the `.report` file next to the output
    #[arg(long, global = true)]
    pub no_report: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge sample data collections on the union of their site positions
    Merge {
        /// Input collections, in priority order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output collection (.gz for gzip)
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// What to do with sites whose ancestral alleles disagree (default from config: drop)
        #[arg(long, value_enum)]
        conflict_policy: Option<ConflictPolicy>,

        /// Keep the first occurrence of a repeated sample id instead of failing
        #[arg(long)]
        deduplicate_samples: bool,
    },

    /// Reduce a collection to the sites and new samples compatible with a target
    MakeCompatible {
        /// Collection to filter
        input: PathBuf,

        /// Collection whose sites and alleles define compatibility
        #[arg(long)]
        target: PathBuf,

        /// Output collection
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },

    /// Attach sample dates and site ages from a dated tree sequence
    CombineDates {
        /// Dated tree sequence (JSON)
        #[arg(long)]
        tree_sequence: PathBuf,

        /// Collection the tree sequence was inferred from
        #[arg(long)]
        high_coverage: PathBuf,

        /// Superset collection that receives the dates
        #[arg(long)]
        all_samples: PathBuf,

        /// Output collection
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Raise constrained site ages to the oldest carrier
        #[arg(long)]
        raise_site_times: bool,
    },

    /// Extract samples and/or a position range from a collection
    Subset {
        /// Input collection
        input: PathBuf,

        /// Output collection
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Comma separated sample ids to keep (default: all)
        #[arg(long, value_delimiter = ',')]
        samples: Option<Vec<String>>,

        /// First position to keep (inclusive)
        #[arg(long)]
        start: Option<u64>,

        /// Last position to keep (exclusive)
        #[arg(long)]
        end: Option<u64>,
    },

    /// Export a collection as phased VCF
    ToVcf {
        /// Input collection
        input: PathBuf,

        /// Output VCF (.gz for gzip)
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },

    /// Print a summary of a collection
    Info {
        /// Input collection
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}
