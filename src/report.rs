use crate::error::Result;
use crate::sampledata::io::write_json;
use chrono::{DateTime, Utc};
use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A non-fatal finding produced while transforming collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Inputs disagree on the ancestral allele; the site was dropped.
    SiteConflict {
        position: u64,
        /// Ancestral allele per input, `None` where the input lacks the site.
        ancestral_alleles: Vec<Option<String>>,
    },
    /// A repeated sample identifier whose later column was discarded.
    DuplicateSampleDropped { sample_id: String, input: usize },
    /// Inputs declare different sequence lengths; the largest was kept.
    SequenceLengthMismatch { lengths: Vec<f64> },
    /// A dated sample carries a derived allele at a site estimated to be younger than the sample.
    ConstrainedVariant {
        position: u64,
        sample_id: String,
        site_time: f64,
        sample_time: f64,
    },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::SiteConflict { .. } => "site_conflict",
            Diagnostic::DuplicateSampleDropped { .. } => "duplicate_sample_dropped",
            Diagnostic::SequenceLengthMismatch { .. } => "sequence_length_mismatch",
            Diagnostic::ConstrainedVariant { .. } => "constrained_variant",
        }
    }
}

/// Companion `.report` file written next to each output collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct Report {
    pub command: String,
    pub tool_version: String,
    #[serde(serialize_with = "serialize_datetime", deserialize_with = "deserialize_datetime")]
    pub created_at: DateTime<Utc>,
    pub parameters: serde_json::Value,
    pub inputs: Vec<String>,
    pub output: String,
    pub counts: serde_json::Map<String, serde_json::Value>,
    pub diagnostics: Vec<Diagnostic>,
}

fn serialize_datetime<S>(date: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.to_rfc3339())
}

fn deserialize_datetime<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(D::Error::custom)
}

impl Report {
    pub fn new(command: impl Into<String>, output: &Path) -> Self {
        Report {
            command: command.into(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            parameters: serde_json::Value::Null,
            inputs: Vec::new(),
            output: output.display().to_string(),
            counts: serde_json::Map::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_inputs<P: AsRef<Path>>(mut self, inputs: &[P]) -> Self {
        self.inputs = inputs
            .iter()
            .map(|p| p.as_ref().display().to_string())
            .collect();
        self
    }

    pub fn count(&mut self, name: &str, value: impl Into<serde_json::Value>) {
        self.counts.insert(name.to_string(), value.into());
    }

    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    /// Number of diagnostics of each kind, in first-seen order.
    pub fn tally(&self) -> Vec<(&'static str, usize)> {
        let mut tally: Vec<(&'static str, usize)> = Vec::new();
        for d in &self.diagnostics {
            match tally.iter_mut().find(|(kind, _)| *kind == d.kind()) {
                Some((_, n)) => *n += 1,
                None => tally.push((d.kind(), 1)),
            }
        }
        tally
    }

    /// Write the report to `<output>.report` and return its path.
    pub fn write(&self) -> Result<PathBuf> {
        let path = report_path(Path::new(&self.output));
        write_json(self, &path, true, false)?;
        Ok(path)
    }
}

/// `out.samples` -> `out.samples.report`
pub fn report_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".report");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_path_appends_suffix() {
        assert_eq!(
            report_path(Path::new("out/chr20.samples")),
            PathBuf::from("out/chr20.samples.report")
        );
    }

    #[test]
    fn written_report_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("merged.samples");
        let mut report = Report::new("merge", &output)
            .with_parameters(serde_json::json!({ "conflict_policy": "drop" }))
            .with_inputs(&["a.samples", "b.samples"]);
        report.count("sites", 3);
        report.extend_diagnostics([
            Diagnostic::SiteConflict {
                position: 200,
                ancestral_alleles: vec![Some("A".into()), Some("C".into())],
            },
            Diagnostic::DuplicateSampleDropped {
                sample_id: "s1".into(),
                input: 1,
            },
            Diagnostic::SiteConflict {
                position: 300,
                ancestral_alleles: vec![Some("G".into()), Some("T".into())],
            },
        ]);
        let path = report.write().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: Report = serde_json::from_str(&text).unwrap();
        assert_eq!(back.command, "merge");
        assert_eq!(back.inputs, vec!["a.samples", "b.samples"]);
        assert_eq!(back.diagnostics, report.diagnostics);
        assert_eq!(
            report.tally(),
            vec![("site_conflict", 2), ("duplicate_sample_dropped", 1)]
        );
    }
}
