use serde::{Deserialize, Serialize};

/// A genotype call: an index into the site's allele list, or [`MISSING_DATA`].
pub type Genotype = i8;

/// Marks a (site, sample) cell with no call.
pub const MISSING_DATA: Genotype = -1;

/// A variable site. `alleles[0]` is the ancestral allele, the rest are derived.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Site {
    pub position: u64,
    pub alleles: Vec<String>,
    /// Estimated age of the site, if it has been dated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl Site {
    pub fn new(position: u64, alleles: Vec<String>) -> Self {
        Site {
            position,
            alleles,
            time: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn ancestral(&self) -> &str {
        self.alleles.first().map(String::as_str).unwrap_or_default()
    }

    pub fn derived(&self) -> &[String] {
        self.alleles.get(1..).unwrap_or_default()
    }

    /// Whether two sites carry the same ancestral allele and the same allele set,
    /// irrespective of the order of derived alleles.
    pub fn same_alleles(&self, other: &Site) -> bool {
        if self.ancestral() != other.ancestral() || self.alleles.len() != other.alleles.len() {
            return false;
        }
        let mut mine: Vec<&String> = self.derived().iter().collect();
        let mut theirs: Vec<&String> = other.derived().iter().collect();
        mine.sort();
        theirs.sort();
        mine == theirs
    }
}

/// Inclusive bounds on the age of a sample.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TimeBound {
    pub lower: f64,
    pub upper: f64,
}

impl TimeBound {
    /// A bound pinning the sample to exactly `time`.
    pub fn exact(time: f64) -> Self {
        TimeBound {
            lower: time,
            upper: time,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite() && self.lower >= 0.0 && self.lower <= self.upper
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sample {
    pub id: String,
    /// Individual this sample (haplotype) belongs to, used to group ploidy on export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individual: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeBound>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl Sample {
    pub fn new(id: impl Into<String>) -> Self {
        Sample {
            id: id.into(),
            individual: None,
            population: None,
            time: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_individual(mut self, individual: impl Into<String>) -> Self {
        self.individual = Some(individual.into());
        self
    }

    pub fn with_time(mut self, time: TimeBound) -> Self {
        self.time = Some(time);
        self
    }
}
