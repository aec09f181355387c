use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of the collection transforms. Non-fatal findings are
/// reported as [`crate::report::Diagnostic`] values instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("chromosome mismatch: {context} is on '{found}', expected '{expected}'")]
    SchemaMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("duplicate sample identifier '{id}' (first seen in input {first_input}, again in input {second_input})")]
    DuplicateSample {
        id: String,
        first_input: usize,
        second_input: usize,
    },

    #[error("ancestral allele conflict at position {position}: {alleles:?}")]
    SiteConflict { position: u64, alleles: Vec<String> },

    #[error("{} high-coverage sample(s) are not sample nodes of the tree sequence: {}", .missing.len(), .missing.join(", "))]
    SubsetViolation { missing: Vec<String> },

    #[error("invalid collection: {0}")]
    InvalidCollection(String),

    #[error("invalid tree sequence: {0}")]
    InvalidTreeSequence(String),

    #[error("unknown sample identifier '{0}'")]
    UnknownSample(String),

    #[error("no input collections given")]
    EmptyInput,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("compression error on {path}: {source}")]
    Compression {
        path: PathBuf,
        #[source]
        source: niffler::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}
