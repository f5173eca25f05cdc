//! Binary merge forest produced by average-link clustering.
//!
//! Nodes `0..leaf_count` are the original items; nodes from `leaf_count`
//! upwards are merges in the order they happened. A node whose parent is
//! itself is a root, one per connected component.

use std::io::{self, Write};

/// Layout of the dendrogram file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DendrogramFormat {
    /// `parent child0 child1` per node.
    #[default]
    Classic,
    /// `parent child0 child1 height` per node.
    WithHeights,
}

/// One node of the merge forest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DendrogramNode {
    pub(crate) parent: usize,
    pub(crate) children: [Option<usize>; 2],
    pub(crate) height: f64,
    pub(crate) population: usize,
}

impl DendrogramNode {
    /// Parent node id; equal to the node's own id for roots.
    #[must_use]
    pub const fn parent(&self) -> usize {
        self.parent
    }

    /// Child node ids, `[None, None]` for leaves.
    #[must_use]
    pub const fn children(&self) -> [Option<usize>; 2] {
        self.children
    }

    /// Merge affinity at which the node was formed. Leaves carry the
    /// placeholder height described on [`Dendrogram`].
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Number of original items below the node.
    #[must_use]
    pub const fn population(&self) -> usize {
        self.population
    }

    /// Returns `true` for original items.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.children[0].is_none() && self.children[1].is_none()
    }
}

/// Rooted binary forest over `2 * leaf_count - component_count` nodes.
///
/// Heights are affinities, so higher nodes were merged earlier. Nodes that
/// were never formed by a merge (every leaf) carry a placeholder height one
/// above the first merge, or `1` when no merge happened.
#[derive(Clone, Debug, PartialEq)]
pub struct Dendrogram {
    leaf_count: usize,
    component_count: usize,
    nodes: Vec<DendrogramNode>,
}

impl Dendrogram {
    pub(crate) fn new(
        leaf_count: usize,
        component_count: usize,
        nodes: Vec<DendrogramNode>,
    ) -> Self {
        Self {
            leaf_count,
            component_count,
            nodes,
        }
    }

    /// Total number of nodes, leaves and merges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` when the forest has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of original items.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of connected components, which is also the number of roots.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Number of merges performed.
    #[must_use]
    pub fn merge_count(&self) -> usize {
        self.nodes.len() - self.leaf_count
    }

    /// Node `id`, or `None` when out of range.
    #[must_use]
    pub fn node(&self, id: usize) -> Option<&DendrogramNode> {
        self.nodes.get(id)
    }

    /// All nodes in id order.
    #[must_use]
    pub fn nodes(&self) -> &[DendrogramNode] {
        &self.nodes
    }

    /// Ids of the roots in increasing order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| (node.parent == id).then_some(id))
    }

    /// Writes the forest: the node count, then one line per node with `-1`
    /// standing in for absent children.
    ///
    /// # Errors
    /// Returns any [`io::Error`] raised by `writer`.
    ///
    /// # Examples
    /// ```
    /// use affinage_core::{AffinityEdge, AffinityGraph, DendrogramFormat, average_link};
    ///
    /// let graph = AffinityGraph::new(2, vec![AffinityEdge::new(0, 1, 0.5), AffinityEdge::new(1, 0, 0.5)]);
    /// let tree = average_link(&graph)?;
    /// let mut out = Vec::new();
    /// tree.write_to(&mut out, DendrogramFormat::Classic)?;
    /// assert_eq!(String::from_utf8(out)?, "3\n2 -1 -1\n2 -1 -1\n2 0 1\n");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn write_to(&self, mut writer: impl Write, format: DendrogramFormat) -> io::Result<()> {
        writeln!(writer, "{}", self.nodes.len())?;
        for node in &self.nodes {
            let [first, second] = node.children.map(ChildId);
            match format {
                DendrogramFormat::Classic => {
                    writeln!(writer, "{} {first} {second}", node.parent)?;
                }
                DendrogramFormat::WithHeights => {
                    writeln!(writer, "{} {first} {second} {}", node.parent, node.height)?;
                }
            }
        }
        Ok(())
    }
}

struct ChildId(Option<usize>);

impl std::fmt::Display for ChildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{id}"),
            None => f.write_str("-1"),
        }
    }
}
