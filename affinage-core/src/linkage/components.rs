//! Connected-component labelling of the affinity graph.

use crate::graph::AffinityGraph;

use super::union_find::DisjointSet;

/// Connected-component label for every original node.
///
/// Labels are contiguous from `0` and handed out in order of each
/// component's lowest node id, so node `0` always carries label `0`.
///
/// # Examples
/// ```
/// use affinage_core::{AffinityEdge, AffinityGraph, connected_components};
///
/// let graph = AffinityGraph::new(3, vec![AffinityEdge::new(2, 1, 1.0)]);
/// let components = connected_components(&graph);
/// assert_eq!(components.labels(), &[0, 1, 1]);
/// assert_eq!(components.count(), 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentLabels {
    labels: Vec<usize>,
    count: usize,
}

impl ComponentLabels {
    /// Label per node id.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of distinct components.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Label of `node`, or `None` when out of range.
    #[must_use]
    pub fn label(&self, node: usize) -> Option<usize> {
        self.labels.get(node).copied()
    }
}

/// Partitions the nodes of `graph` by edge reachability, ignoring direction.
#[must_use]
pub fn connected_components(graph: &AffinityGraph) -> ComponentLabels {
    let node_count = graph.node_count();
    let mut set = DisjointSet::new(node_count);
    for edge in graph.edges() {
        set.union(edge.source(), edge.target());
    }

    let mut root_label = vec![None; node_count];
    let mut labels = Vec::with_capacity(node_count);
    let mut count = 0;
    for node in 0..node_count {
        let root = set.find(node);
        let label = *root_label[root].get_or_insert_with(|| {
            count += 1;
            count - 1
        });
        labels.push(label);
    }
    ComponentLabels { labels, count }
}
