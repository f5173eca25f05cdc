//! Average-link agglomerative clustering of an affinity graph.
//!
//! The engine repeatedly merges the two clusters joined by the heaviest
//! surviving edge. After each merge the new cluster's affinity to any
//! neighbour is the population-weighted mean of its two parts' affinities,
//! with a missing edge counting as zero. Clusters in different connected
//! components never merge, so the result is a forest with one tree per
//! component.
//!
//! Selection is a linear scan over live edges and relabelling is a linear
//! pass per merge, giving `O(V * E)` overall. Ties between equal weights go
//! to the edge that appears first in the input, which makes runs
//! reproducible but is not a canonical choice among equals.

mod components;
mod union_find;
mod working;

use tracing::{Span, debug, field, info, instrument};

use crate::{dendrogram::Dendrogram, error::LinkageError, graph::AffinityGraph};

pub use self::components::{ComponentLabels, connected_components};

use self::working::WorkingGraph;

/// Clusters `graph` into a dendrogram with average linkage.
///
/// The forest holds `2 * N - C` nodes for `N` graph nodes in `C` connected
/// components; merge node `N + q` is created by the `q`-th merge.
///
/// # Errors
/// Returns [`LinkageError::CapacityOverflow`] when the node ids would not fit
/// the output format, [`LinkageError::InvalidEdge`] for a self loop or an
/// endpoint outside the graph, and [`LinkageError::EdgesExhausted`] if the edge set
/// runs dry before every component is fully merged.
///
/// # Examples
/// ```
/// use affinage_core::{AffinityEdge, AffinityGraph, average_link};
///
/// let graph = AffinityGraph::new(3, vec![AffinityEdge::new(0, 1, 0.9), AffinityEdge::new(1, 0, 0.9)]);
/// let tree = average_link(&graph)?;
/// assert_eq!(tree.len(), 4);
/// assert_eq!(tree.roots().collect::<Vec<_>>(), vec![2, 3]);
/// # Ok::<(), affinage_core::LinkageError>(())
/// ```
#[instrument(
    name = "linkage.average_link",
    err,
    skip(graph),
    fields(nodes = graph.node_count(), edges = graph.edge_count(), components = field::Empty),
)]
pub fn average_link(graph: &AffinityGraph) -> Result<Dendrogram, LinkageError> {
    let mut working = WorkingGraph::load(graph)?;
    let components = connected_components(graph).count();
    Span::current().record("components", components);

    let expected = graph.node_count() - components;
    for step in 0..expected {
        let merge = working
            .merge(step)
            .ok_or(LinkageError::EdgesExhausted {
                merge: step,
                expected,
            })?;
        debug!(
            step,
            node = merge.node,
            left = merge.left,
            right = merge.right,
            height = merge.height,
            "merged clusters"
        );
    }

    let dendrogram = working.into_dendrogram(components);
    info!(
        components,
        merges = expected,
        total_nodes = dendrogram.len(),
        "average-link clustering completed"
    );
    Ok(dendrogram)
}
