use crate::error::{Error, Result};
use crate::sampledata::io::read_json;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Bit set in [`Node::flags`] for sample nodes.
pub const NODE_IS_SAMPLE: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    pub time: f64,
    #[serde(default)]
    pub flags: u32,
    /// Collection sample identifier this node was inferred from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_id: Option<String>,
}

impl Node {
    pub fn is_sample(&self) -> bool {
        self.flags & NODE_IS_SAMPLE != 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Edge {
    pub left: f64,
    pub right: f64,
    pub parent: usize,
    pub child: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TsSite {
    pub position: f64,
    #[serde(default)]
    pub ancestral_state: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Mutation {
    pub site: usize,
    pub node: usize,
    #[serde(default)]
    pub derived_state: String,
}

/// The parts of a dated tree sequence needed to date samples and sites.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TreeSequence {
    pub sequence_length: f64,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub sites: Vec<TsSite>,
    #[serde(default)]
    pub mutations: Vec<Mutation>,
}

pub fn load_tree_sequence(path: impl AsRef<Path>) -> Result<TreeSequence> {
    let path = path.as_ref();
    let ts: TreeSequence = read_json(path)?;
    ts.validate()?;
    debug!(
        path = %path.display(),
        nodes = ts.nodes.len(),
        edges = ts.edges.len(),
        mutations = ts.mutations.len(),
        "loaded tree sequence"
    );
    Ok(ts)
}

impl TreeSequence {
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| -> Result<()> { Err(Error::InvalidTreeSequence(msg)) };
        for (i, node) in self.nodes.iter().enumerate() {
            if !node.time.is_finite() {
                return bad(format!("node {} has non-finite time", i));
            }
        }
        for (i, edge) in self.edges.iter().enumerate() {
            if edge.parent >= self.nodes.len() || edge.child >= self.nodes.len() {
                return bad(format!("edge {} references a missing node", i));
            }
            if edge.left.is_nan() || edge.right.is_nan() || edge.left >= edge.right {
                return bad(format!("edge {} has empty interval [{}, {})", i, edge.left, edge.right));
            }
            if self.nodes[edge.parent].time <= self.nodes[edge.child].time {
                return bad(format!("edge {} parent is not older than its child", i));
            }
        }
        let mut sample_ids = HashSet::new();
        for (i, node) in self.nodes.iter().enumerate().filter(|(_, n)| n.is_sample()) {
            let Some(id) = node.sample_id.as_deref() else { continue };
            if !sample_ids.insert(id) {
                return bad(format!("sample node {} repeats sample id '{}'", i, id));
            }
        }
        for (i, mutation) in self.mutations.iter().enumerate() {
            if mutation.site >= self.sites.len() {
                return bad(format!("mutation {} references missing site {}", i, mutation.site));
            }
            if mutation.node >= self.nodes.len() {
                return bad(format!("mutation {} references missing node {}", i, mutation.node));
            }
        }
        Ok(())
    }

    /// Sample identifier -> sample node. Sample nodes without an identifier are skipped.
    pub fn sample_nodes(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_sample())
            .filter_map(|(i, n)| n.sample_id.as_deref().map(|id| (id, i)))
            .collect()
    }

    /// Parent of `node` in the tree covering `position`.
    fn parent_at(&self, node: usize, position: f64) -> Option<usize> {
        self.edges
            .iter()
            .find(|e| e.child == node && e.left <= position && position < e.right)
            .map(|e| e.parent)
    }

    /// Age of each mutation: midway between its node and that node's parent in
    /// the local tree, or the node time for a mutation above a root.
    pub fn mutation_ages(&self) -> Vec<f64> {
        self.mutations
            .iter()
            .map(|m| {
                let node_time = self.nodes[m.node].time;
                match self.parent_at(m.node, self.sites[m.site].position) {
                    Some(p) => (node_time + self.nodes[p].time) / 2.0,
                    None => node_time,
                }
            })
            .collect()
    }

    /// Oldest mutation age per (rounded) site position. Recurrent mutations
    /// at one position keep the oldest age rather than the first listed, so a
    /// site is never dated younger than any of its mutations.
    pub fn site_ages(&self) -> BTreeMap<u64, f64> {
        let mut ages: BTreeMap<u64, f64> = BTreeMap::new();
        for (mutation, age) in self.mutations.iter().zip(self.mutation_ages()) {
            let position = self.sites[mutation.site].position.round() as u64;
            ages.entry(position)
                .and_modify(|a| *a = a.max(age))
                .or_insert(age);
        }
        ages
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two samples under a root at time 10; sample "a" has a mutation at 100.5
    /// and the root has a mutation at 200.
    pub(crate) fn small_tree() -> TreeSequence {
        TreeSequence {
            sequence_length: 1000.0,
            nodes: vec![
                Node { time: 0.0, flags: NODE_IS_SAMPLE, sample_id: Some("a".into()) },
                Node { time: 4.0, flags: NODE_IS_SAMPLE, sample_id: Some("b".into()) },
                Node { time: 10.0, flags: 0, sample_id: None },
            ],
            edges: vec![
                Edge { left: 0.0, right: 1000.0, parent: 2, child: 0 },
                Edge { left: 0.0, right: 1000.0, parent: 2, child: 1 },
            ],
            sites: vec![
                TsSite { position: 100.5, ancestral_state: "A".into() },
                TsSite { position: 200.0, ancestral_state: "C".into() },
            ],
            mutations: vec![
                Mutation { site: 0, node: 0, derived_state: "G".into() },
                Mutation { site: 1, node: 2, derived_state: "T".into() },
            ],
        }
    }

    #[test]
    fn mutation_age_is_edge_midpoint() {
        let ts = small_tree();
        assert_eq!(ts.mutation_ages(), vec![5.0, 10.0]);
        let ages = ts.site_ages();
        assert_eq!(ages.get(&101), Some(&5.0));
        assert_eq!(ages.get(&200), Some(&10.0));
    }

    #[test]
    fn recurrent_mutations_keep_the_oldest_age() {
        let mut ts = small_tree();
        ts.mutations.push(Mutation { site: 0, node: 1, derived_state: "G".into() });
        assert_eq!(ts.mutation_ages(), vec![5.0, 10.0, 7.0]);
        assert_eq!(ts.site_ages().get(&101), Some(&7.0));
    }

    #[test]
    fn sample_nodes_by_identifier() {
        let ts = small_tree();
        let samples = ts.sample_nodes();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples["b"], 1);
        assert_eq!(ts.parent_at(1, 999.0), Some(2));
        assert_eq!(ts.parent_at(1, 1000.0), None);
    }

    #[test]
    fn rejects_child_older_than_parent() {
        let mut ts = small_tree();
        ts.nodes[1].time = 20.0;
        assert!(matches!(ts.validate(), Err(Error::InvalidTreeSequence(_))));
    }

    #[test]
    fn rejects_repeated_sample_id() {
        let mut ts = small_tree();
        ts.nodes[1].sample_id = Some("a".into());
        ts.nodes[1].time = 5.0;
        let err = ts.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidTreeSequence(msg) if msg.contains("'a'")));
    }

    #[test]
    fn rejects_dangling_mutation() {
        let mut ts = small_tree();
        ts.mutations[0].site = 9;
        assert!(ts.validate().is_err());
    }
}
