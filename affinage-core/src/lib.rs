//! Affinage core library.
//!
//! Two stages, run leaves first:
//!
//! 1. [`AffinityKernel::build_graph`] turns a dense [`DistanceMatrix`] into a
//!    thresholded Gaussian-kernel [`AffinityGraph`].
//! 2. [`average_link`] clusters that graph into a [`Dendrogram`].
//!
//! [`build_affinity_file`] and [`cluster_file`] wrap the stages with the
//! text file formats they exchange.

mod affinity;
mod dendrogram;
mod error;
mod graph;
mod linkage;
mod matrix;
mod pipeline;

#[cfg(test)]
mod test_utils;

pub use crate::{
    affinity::{AffinityBuilder, AffinityKernel, DEFAULT_VARIANCE},
    dendrogram::{Dendrogram, DendrogramFormat, DendrogramNode},
    error::{
        AffinageError, AffinageErrorCode, ConfigError, ConfigErrorCode, GraphFileError,
        GraphFileErrorCode, LinkageError, LinkageErrorCode, MatrixError, MatrixErrorCode, Result,
    },
    graph::{AffinityEdge, AffinityGraph},
    linkage::{ComponentLabels, average_link, connected_components},
    matrix::DistanceMatrix,
    pipeline::{ClusterSummary, GraphSummary, build_affinity_file, cluster_file},
};
