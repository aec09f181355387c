pub mod combine_dates;
pub mod info;
pub mod make_compatible;
pub mod merge;
pub mod subset;
pub mod to_vcf;

use crate::config::Config;
use crate::report::Report;
use crate::sampledata::{io, InputDigest, SampleData};
use crate::utils::progress_bar_builder::ProgressBarBuilder;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings shared by every command: the user config with command-line overrides applied.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub config: Config,
}

impl Settings {
    pub fn new(config: Config, no_progress: bool, no_report: bool) -> Self {
        let mut config = config;
        if no_progress {
            config.progress = false;
        }
        if no_report {
            config.write_reports = false;
        }
        Settings { config }
    }

    pub(crate) fn spinner(&self, message: impl Into<String>) -> Result<ProgressBar> {
        ProgressBarBuilder::new(message)
            .hidden_if(!self.config.progress)
            .build()
    }

    pub(crate) fn save(&self, data: &SampleData, output: &Path) -> Result<()> {
        io::save_with(data, output, self.config.compress_output)
            .with_context(|| format!("Failed to write {}", output.display()))
    }

    /// Write the companion report unless reports are disabled.
    pub(crate) fn finish_report(&self, report: &Report) -> Result<()> {
        for (kind, n) in report.tally() {
            warn!("{}: {}", kind, n);
        }
        if !self.config.write_reports {
            return Ok(());
        }
        let path = report
            .write()
            .with_context(|| format!("Failed to write report for {}", report.output))?;
        info!("report written to {}", path.display());
        Ok(())
    }
}

pub(crate) fn load_collection(path: &Path) -> Result<SampleData> {
    io::load(path).with_context(|| format!("Failed to load sample data from {}", path.display()))
}

/// Content digests of input files for the provenance log.
pub(crate) fn digests(paths: &[&Path]) -> Result<Vec<InputDigest>> {
    paths
        .iter()
        .map(|p| {
            InputDigest::from_path(p).with_context(|| format!("Failed to hash {}", p.display()))
        })
        .collect()
}

pub(crate) fn as_paths(paths: &[PathBuf]) -> Vec<&Path> {
    paths.iter().map(PathBuf::as_path).collect()
}
