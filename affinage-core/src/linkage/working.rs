//! Mutable working state of the average-link merge loop.
//!
//! Edges live in a single vector in file order. Retired edges are tombstoned
//! during a merge and compacted away at its end; compaction keeps the
//! relative order of the survivors, so the lowest-index tie-break is stable
//! across merges.

use crate::{
    dendrogram::{Dendrogram, DendrogramNode},
    error::LinkageError,
    graph::AffinityGraph,
};

/// Height of a node that has not been formed by a merge.
const UNMERGED: f64 = f64::INFINITY;

#[derive(Clone, Copy, Debug, PartialEq)]
struct LiveEdge {
    left: usize,
    right: usize,
    weight: f64,
}

#[derive(Clone, Copy, Debug)]
enum Anchor {
    Left,
    Right,
}

/// Outcome of a single merge step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Merge {
    pub(super) node: usize,
    pub(super) left: usize,
    pub(super) right: usize,
    pub(super) height: f64,
}

#[derive(Debug)]
pub(super) struct WorkingGraph {
    leaf_count: usize,
    edges: Vec<Option<LiveEdge>>,
    population: Vec<usize>,
    height: Vec<f64>,
    parent: Vec<usize>,
}

impl WorkingGraph {
    pub(super) fn load(graph: &AffinityGraph) -> Result<Self, LinkageError> {
        let leaf_count = graph.node_count();
        let capacity = leaf_count
            .checked_mul(2)
            .filter(|&total| i64::try_from(total).is_ok())
            .ok_or(LinkageError::CapacityOverflow {
                node_count: leaf_count,
            })?;
        let edges = graph
            .edges()
            .iter()
            .enumerate()
            .map(|(index, edge)| {
                let (left, right) = (edge.source(), edge.target());
                if left == right || left >= leaf_count || right >= leaf_count {
                    return Err(LinkageError::InvalidEdge {
                        index,
                        start: left,
                        end: right,
                        node_count: leaf_count,
                    });
                }
                Ok(Some(LiveEdge {
                    left,
                    right,
                    weight: edge.weight(),
                }))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            leaf_count,
            edges,
            population: vec![1; capacity],
            height: vec![UNMERGED; capacity],
            parent: (0..capacity).collect(),
        })
    }

    /// Live edge with the largest weight; the lowest index wins ties.
    fn heaviest(&self) -> Option<LiveEdge> {
        let mut best: Option<LiveEdge> = None;
        for edge in self.edges.iter().flatten() {
            if best.is_none_or(|current| edge.weight > current.weight) {
                best = Some(*edge);
            }
        }
        best
    }

    /// Performs merge number `step`, creating node `leaf_count + step`.
    ///
    /// Returns `None` when no live edge is left to merge along.
    pub(super) fn merge(&mut self, step: usize) -> Option<Merge> {
        let chosen = self.heaviest()?;
        let (i, j) = (chosen.left, chosen.right);
        let k = self.leaf_count + step;

        self.height[k] = chosen.weight;
        self.parent[i] = k;
        self.parent[j] = k;
        self.population[k] = self.population[i] + self.population[j];

        self.retire_between(i, j);
        let share_i = self.population[i] as f64 / self.population[k] as f64;
        self.relabel(i, j, k, share_i, 1.0 - share_i);
        self.consolidate(k, Anchor::Left);
        self.consolidate(k, Anchor::Right);
        self.edges.retain(Option::is_some);

        Some(Merge {
            node: k,
            left: i,
            right: j,
            height: chosen.weight,
        })
    }

    /// Retires every edge joining `i` and `j`, in either direction.
    fn retire_between(&mut self, i: usize, j: usize) {
        for slot in &mut self.edges {
            if slot.is_some_and(|edge| {
                (edge.left == i && edge.right == j) || (edge.left == j && edge.right == i)
            }) {
                *slot = None;
            }
        }
    }

    /// Moves every edge incident to `i` or `j` onto `k`, scaling it by the
    /// share of `k`'s population that its old endpoint contributed.
    fn relabel(&mut self, i: usize, j: usize, k: usize, share_i: f64, share_j: f64) {
        for edge in self.edges.iter_mut().flatten() {
            for end in [&mut edge.left, &mut edge.right] {
                if *end == i {
                    *end = k;
                    edge.weight *= share_i;
                } else if *end == j {
                    *end = k;
                    edge.weight *= share_j;
                }
            }
        }
    }

    /// Folds edges that now join `k` to the same neighbour into the one with
    /// the lowest index by summing their weights.
    fn consolidate(&mut self, k: usize, anchor: Anchor) {
        let mut anchored: Vec<(usize, usize)> = self
            .edges
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let edge = slot.as_ref()?;
                match anchor {
                    Anchor::Left => (edge.left == k).then_some((edge.right, index)),
                    Anchor::Right => (edge.right == k).then_some((edge.left, index)),
                }
            })
            .collect();
        anchored.sort_unstable();

        for run in anchored.chunk_by(|a, b| a.0 == b.0) {
            let [(_, keep), rest @ ..] = run else {
                continue;
            };
            for &(_, index) in rest {
                let Some(removed) = self.edges[index].take() else {
                    continue;
                };
                if let Some(kept) = self.edges[*keep].as_mut() {
                    kept.weight += removed.weight;
                }
            }
        }
    }

    /// Finalises heights and materialises the first `total` nodes as a forest.
    pub(super) fn into_dendrogram(mut self, component_count: usize) -> Dendrogram {
        let total = 2 * self.leaf_count - component_count;
        let merged = total > self.leaf_count;
        let placeholder = if merged {
            self.height[self.leaf_count] + 1.0
        } else {
            1.0
        };

        for height in self.height.iter_mut().take(total) {
            if *height < 0.0 {
                *height = 0.0;
            }
            if *height == UNMERGED {
                *height = placeholder;
            }
        }

        let mut nodes: Vec<DendrogramNode> = (0..total)
            .map(|id| DendrogramNode {
                parent: self.parent[id],
                children: [None, None],
                height: self.height[id],
                population: self.population[id],
            })
            .collect();

        for id in 0..total {
            let parent = self.parent[id];
            if parent == id {
                continue;
            }
            let children = &mut nodes[parent].children;
            let slot = if children[0].is_none() { 0 } else { 1 };
            children[slot] = Some(id);
        }

        Dendrogram::new(self.leaf_count, component_count, nodes)
    }
}
