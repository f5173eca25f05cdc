//! Affinity graph construction from a dense distance matrix.
//!
//! Distances at or below a threshold become Gaussian-kernel affinities
//! `exp(-d² / variance)`; every accepted unordered pair is emitted as two
//! directed edges with the same weight.

use tracing::{Span, debug, field, instrument};

use crate::{
    error::ConfigError,
    graph::{AffinityEdge, AffinityGraph},
    matrix::DistanceMatrix,
};

/// Kernel variance used when none is configured.
pub const DEFAULT_VARIANCE: f64 = 3600.0;

/// Configures and validates an [`AffinityKernel`].
///
/// # Examples
/// ```
/// use affinage_core::AffinityBuilder;
///
/// let kernel = AffinityBuilder::new(50.0)
///     .with_variance(100.0)
///     .build()
///     .expect("configuration is valid");
/// assert_eq!(kernel.max_distance(), 50.0);
/// assert_eq!(kernel.variance(), 100.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AffinityBuilder {
    max_distance: f64,
    variance: f64,
}

impl AffinityBuilder {
    /// Creates a builder accepting pairs at distance `<= max_distance`, using
    /// [`DEFAULT_VARIANCE`].
    #[must_use]
    pub fn new(max_distance: f64) -> Self {
        Self {
            max_distance,
            variance: DEFAULT_VARIANCE,
        }
    }

    /// Overrides the kernel variance.
    #[must_use]
    pub fn with_variance(mut self, variance: f64) -> Self {
        self.variance = variance;
        self
    }

    /// Returns the configured distance threshold.
    #[must_use]
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Returns the configured kernel variance.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Validates the configuration and constructs the kernel.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidMaxDistance`] when the threshold is NaN
    /// and [`ConfigError::InvalidVariance`] when the variance is not finite
    /// and strictly positive.
    pub fn build(self) -> Result<AffinityKernel, ConfigError> {
        if self.max_distance.is_nan() {
            return Err(ConfigError::InvalidMaxDistance {
                got: self.max_distance,
            });
        }
        if !self.variance.is_finite() || self.variance <= 0.0 {
            return Err(ConfigError::InvalidVariance { got: self.variance });
        }
        Ok(AffinityKernel {
            max_distance: self.max_distance,
            variance: self.variance,
        })
    }
}

/// A validated thresholded Gaussian kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffinityKernel {
    max_distance: f64,
    variance: f64,
}

impl AffinityKernel {
    /// Distance threshold; pairs further apart produce no edge.
    #[must_use]
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Kernel variance.
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Whether a pair at `distance` yields an edge. Infinite distances never
    /// do, even under an infinite threshold.
    #[must_use]
    pub fn accepts(&self, distance: f64) -> bool {
        distance.is_finite() && distance <= self.max_distance
    }

    /// Affinity for `distance`, in `(0, 1]` for finite distances.
    ///
    /// # Examples
    /// ```
    /// use affinage_core::AffinityBuilder;
    ///
    /// let kernel = AffinityBuilder::new(10.0).build().expect("valid");
    /// assert_eq!(kernel.affinity(0.0), 1.0);
    /// assert!(kernel.affinity(1.0) > kernel.affinity(2.0));
    /// ```
    #[must_use]
    pub fn affinity(&self, distance: f64) -> f64 {
        (-(distance * distance) / self.variance).exp()
    }

    /// Builds the directed-duplicated affinity graph for `matrix`.
    ///
    /// Pairs are visited over the strict lower triangle, row by row; for an
    /// accepted pair `(p1, p2)` with `p2 < p1` the edges `(p2, p1, w)` and
    /// `(p1, p2, w)` are appended in that order. Every row is a node, whether
    /// or not it gains an edge.
    #[instrument(
        name = "affinity.build_graph",
        skip(self, matrix),
        fields(nodes = matrix.len(), max_distance = self.max_distance, edges = field::Empty),
    )]
    pub fn build_graph(&self, matrix: &DistanceMatrix) -> AffinityGraph {
        let mut edges = Vec::new();
        for (p1, p2, distance) in matrix.lower_triangle() {
            if !self.accepts(distance) {
                continue;
            }
            let weight = self.affinity(distance);
            edges.push(AffinityEdge::new(p2, p1, weight));
            edges.push(AffinityEdge::new(p1, p2, weight));
        }
        Span::current().record("edges", edges.len());
        debug!(pairs = edges.len() / 2, "thresholded distance matrix");
        AffinityGraph::new(matrix.len(), edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use rstest::rstest;

    fn kernel(max_distance: f64) -> AffinityKernel {
        AffinityBuilder::new(max_distance)
            .build()
            .expect("kernel configuration is valid")
    }

    fn three_points() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 100.0],
            vec![1.0, 0.0, 100.0],
            vec![100.0, 100.0, 0.0],
        ])
        .expect("matrix is square")
    }

    #[test]
    fn builder_defaults_to_reference_variance() {
        let builder = AffinityBuilder::new(5.0);
        assert_eq!(builder.variance(), DEFAULT_VARIANCE);
        assert_eq!(builder.max_distance(), 5.0);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-1.0)]
    #[case::infinite(f64::INFINITY)]
    #[case::nan(f64::NAN)]
    fn builder_rejects_invalid_variance(#[case] variance: f64) {
        let err = AffinityBuilder::new(1.0)
            .with_variance(variance)
            .build()
            .expect_err("variance must be rejected");
        assert!(matches!(err, ConfigError::InvalidVariance { .. }));
    }

    #[test]
    fn builder_rejects_nan_threshold() {
        let err = AffinityBuilder::new(f64::NAN)
            .build()
            .expect_err("NaN threshold must be rejected");
        assert!(matches!(err, ConfigError::InvalidMaxDistance { .. }));
    }

    #[test]
    fn emits_both_directions_for_accepted_pair() {
        let graph = kernel(50.0).build_graph(&three_points());
        let expected = (-1.0_f64 / 3600.0).exp();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(
            graph.edges(),
            &[
                AffinityEdge::new(0, 1, expected),
                AffinityEdge::new(1, 0, expected),
            ]
        );
    }

    #[test]
    fn zero_threshold_keeps_nodes_and_drops_edges() {
        let graph = kernel(0.0).build_graph(&three_points());
        assert_eq!(graph.node_count(), 3);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        let graph = kernel(1.0).build_graph(&three_points());
        assert_eq!(graph.edge_count(), 2);
    }

    #[rstest]
    #[case::finite_threshold(50.0)]
    #[case::infinite_threshold(f64::INFINITY)]
    fn infinite_distances_never_become_edges(#[case] max_distance: f64) {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, f64::INFINITY, 2.0],
            vec![f64::INFINITY, 0.0, f64::INFINITY],
            vec![2.0, f64::INFINITY, 0.0],
        ])
        .expect("matrix is square");
        let kernel = kernel(max_distance);
        assert!(!kernel.accepts(f64::INFINITY));
        let graph = kernel.build_graph(&matrix);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.edges().iter().all(|edge| edge.weight() > 0.0));
    }

    #[test]
    fn edges_follow_row_major_lower_triangle_order() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 2.0],
            vec![1.0, 0.0, 3.0],
            vec![2.0, 3.0, 0.0],
        ])
        .expect("matrix is square");
        let graph = kernel(10.0).build_graph(&matrix);
        let pairs: Vec<_> = graph
            .edges()
            .iter()
            .map(|edge| (edge.source(), edge.target()))
            .collect();
        assert_eq!(pairs, vec![(0, 1), (1, 0), (0, 2), (2, 0), (1, 2), (2, 1)]);
    }

    proptest! {
        #[test]
        fn affinity_is_bounded_and_strictly_decreasing(
            near in 0.0_f64..500.0,
            gap in 0.01_f64..500.0,
        ) {
            let kernel = kernel(1_000.0);
            let close = kernel.affinity(near);
            let far = kernel.affinity(near + gap);
            prop_assert!(close > 0.0 && close <= 1.0);
            prop_assert!(far > 0.0 && far <= 1.0);
            prop_assert!(far < close);
        }
    }
}
