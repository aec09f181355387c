pub mod cli;
pub mod commands;
pub mod config;
pub mod dating;
pub mod error;
pub mod export;
pub mod merge;
pub mod report;
pub mod sampledata;
mod utils;

pub use dating::{combine_dates, CombineOptions, TreeSequence};
pub use error::{Error, Result};
pub use merge::{align_sites, make_compatible, merge_collections, ConflictPolicy, MergeOptions};
pub use sampledata::SampleData;
