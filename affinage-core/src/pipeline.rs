//! File-level entry points for the two pipeline stages.
//!
//! Inputs are read and processed in full before the output file is created,
//! so a malformed input never leaves an output behind. A failure while
//! writing may leave the output truncated.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use tracing::{Span, field, info, instrument};

use crate::{
    affinity::AffinityKernel,
    dendrogram::DendrogramFormat,
    error::{AffinageError, Result},
    graph::AffinityGraph,
    linkage::average_link,
    matrix::DistanceMatrix,
};

/// Totals of a written affinity graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphSummary {
    /// Number of nodes, one per matrix row.
    pub node_count: usize,
    /// Number of directed edges, always even.
    pub edge_count: usize,
}

/// Totals of a written dendrogram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterSummary {
    /// Number of original nodes.
    pub node_count: usize,
    /// Number of connected components, which is also the number of roots.
    pub component_count: usize,
    /// Number of merges performed.
    pub merges: usize,
    /// Number of forest nodes written, leaves and merges together.
    pub total_nodes: usize,
}

/// Reads the distance matrix at `matrix_path`, thresholds it with `kernel` and
/// writes the affinity graph to `graph_path`.
///
/// # Errors
/// Returns [`AffinageError::Io`] when a file cannot be opened, created or
/// written, and [`AffinageError::Matrix`] when the matrix is malformed.
#[instrument(
    name = "pipeline.build_affinity_file",
    err,
    skip(kernel),
    fields(
        matrix = %matrix_path.display(),
        graph = %graph_path.display(),
        nodes = field::Empty,
        edges = field::Empty,
    ),
)]
pub fn build_affinity_file(
    matrix_path: &Path,
    graph_path: &Path,
    kernel: &AffinityKernel,
) -> Result<GraphSummary> {
    let matrix = DistanceMatrix::from_reader(open(matrix_path)?)?;
    let graph = kernel.build_graph(&matrix);
    drop(matrix);

    let summary = GraphSummary {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
    };
    let span = Span::current();
    span.record("nodes", summary.node_count);
    span.record("edges", summary.edge_count);

    write_with(graph_path, |writer| graph.write_to(writer))?;
    info!(
        nodes = summary.node_count,
        edges = summary.edge_count,
        "affinity graph written"
    );
    Ok(summary)
}

/// Reads the affinity graph at `graph_path`, clusters it and writes the
/// dendrogram to `dendrogram_path` in `format`.
///
/// # Errors
/// Returns [`AffinageError::Io`] when a file cannot be opened, created or
/// written, [`AffinageError::GraphFile`] when the graph is malformed and
/// [`AffinageError::Linkage`] when clustering fails.
#[instrument(
    name = "pipeline.cluster_file",
    err,
    fields(
        graph = %graph_path.display(),
        dendrogram = %dendrogram_path.display(),
        total_nodes = field::Empty,
    ),
)]
pub fn cluster_file(
    graph_path: &Path,
    dendrogram_path: &Path,
    format: DendrogramFormat,
) -> Result<ClusterSummary> {
    let graph = AffinityGraph::from_reader(open(graph_path)?)?;
    let tree = average_link(&graph)?;
    drop(graph);

    let summary = ClusterSummary {
        node_count: tree.leaf_count(),
        component_count: tree.component_count(),
        merges: tree.merge_count(),
        total_nodes: tree.len(),
    };
    Span::current().record("total_nodes", summary.total_nodes);

    write_with(dendrogram_path, |writer| tree.write_to(writer, format))?;
    info!(
        components = summary.component_count,
        total_nodes = summary.total_nodes,
        "dendrogram written"
    );
    Ok(summary)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| AffinageError::io(path, source))?;
    Ok(BufReader::new(file))
}

fn write_with(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
) -> Result<()> {
    let file = File::create(path).map_err(|source| AffinageError::io(path, source))?;
    let mut writer = BufWriter::new(file);
    body(&mut writer)
        .and_then(|()| writer.flush())
        .map_err(|source| AffinageError::io(path, source))
}
