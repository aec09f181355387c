use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Software {
    pub name: String,
    pub version: String,
}

impl Software {
    pub fn current() -> Self {
        Software {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Identifies an input file by path and content digest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InputDigest {
    pub path: String,
    pub sha256: String,
}

impl InputDigest {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let mut reader = BufReader::new(file);
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buffer).map_err(|e| Error::io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(InputDigest {
            path: path.display().to_string(),
            sha256: format!("{:x}", hasher.finalize()),
        })
    }

    /// An input that has no backing file, e.g. a collection built in memory.
    pub fn in_memory(label: impl Into<String>) -> Self {
        InputDigest {
            path: label.into(),
            sha256: String::new(),
        }
    }
}

/// One entry of a collection's append-only provenance log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProvenanceRecord {
    pub timestamp: DateTime<Utc>,
    pub software: Software,
    pub command: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
    #[serde(default)]
    pub inputs: Vec<InputDigest>,
}

impl ProvenanceRecord {
    pub fn new(command: impl Into<String>, parameters: serde_json::Value, inputs: Vec<InputDigest>) -> Self {
        ProvenanceRecord {
            timestamp: Utc::now(),
            software: Software::current(),
            command: command.into(),
            parameters,
            inputs,
        }
    }
}

/// Concatenate provenance logs of several collections, keeping the order of
/// the first log and skipping records already present.
pub(crate) fn combine_logs<'a, I>(logs: I) -> Vec<ProvenanceRecord>
where
    I: IntoIterator<Item = &'a [ProvenanceRecord]>,
{
    let mut combined: Vec<ProvenanceRecord> = Vec::new();
    for log in logs {
        for record in log {
            if !combined.contains(record) {
                combined.push(record.clone());
            }
        }
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn digest_matches_known_sha256() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();
        let digest = InputDigest::from_path(file.path()).unwrap();
        assert_eq!(
            digest.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn combined_logs_skip_shared_records() {
        let shared = ProvenanceRecord::new("convert", serde_json::Value::Null, vec![]);
        let a = vec![shared.clone()];
        let b = vec![
            shared.clone(),
            ProvenanceRecord::new("convert-archaic", serde_json::Value::Null, vec![]),
        ];
        let combined = combine_logs([a.as_slice(), b.as_slice()]);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0], shared);
        assert_eq!(combined[1].command, "convert-archaic");
    }
}
