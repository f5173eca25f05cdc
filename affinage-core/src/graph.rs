//! Affinity graph representation and its edge-list file format.
//!
//! ```text
//! <nodeCount> <edgeCount>
//! <src> <dst> <weight>
//! ...
//! ```
//!
//! Node ids are 0-based and contiguous. The undirected graph is stored
//! directed-duplicated: each accepted pair appears once per direction.

use std::io::{self, BufRead, Write};

use crate::error::GraphFileError;

/// Upper bound on edges reserved up front from an untrusted header.
const MAX_PREALLOCATED_EDGES: usize = 1 << 20;

/// A directed weighted edge between two node ids.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffinityEdge {
    source: usize,
    target: usize,
    weight: f64,
}

impl AffinityEdge {
    /// Creates an edge from `source` to `target` with affinity `weight`.
    #[must_use]
    pub const fn new(source: usize, target: usize, weight: f64) -> Self {
        Self {
            source,
            target,
            weight,
        }
    }

    /// Tail node id.
    #[must_use]
    pub const fn source(&self) -> usize {
        self.source
    }

    /// Head node id.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Affinity carried by the edge.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

/// Edge-list graph over nodes `0..node_count`.
///
/// # Examples
/// ```
/// use affinage_core::{AffinityEdge, AffinityGraph};
///
/// let graph = AffinityGraph::new(3, vec![AffinityEdge::new(0, 1, 0.5), AffinityEdge::new(1, 0, 0.5)]);
/// let mut out = Vec::new();
/// graph.write_to(&mut out)?;
/// assert_eq!(String::from_utf8(out)?, "3 2\n0 1 0.5\n1 0 0.5\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AffinityGraph {
    node_count: usize,
    edges: Vec<AffinityEdge>,
}

impl AffinityGraph {
    /// Creates a graph from its node count and directed edges.
    ///
    /// Endpoints are not checked here. [`crate::average_link`] rejects self
    /// loops and out-of-range ids with [`crate::LinkageError::InvalidEdge`].
    #[must_use]
    pub fn new(node_count: usize, edges: Vec<AffinityEdge>) -> Self {
        Self { node_count, edges }
    }

    /// Number of nodes, including isolated ones.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of directed edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Directed edges in file order.
    #[must_use]
    pub fn edges(&self) -> &[AffinityEdge] {
        &self.edges
    }

    /// Writes the graph in edge-list format.
    ///
    /// The header is derived from the in-memory totals, so it always agrees
    /// with the body that follows.
    ///
    /// # Errors
    /// Returns any [`io::Error`] raised by `writer`.
    pub fn write_to(&self, mut writer: impl Write) -> io::Result<()> {
        writeln!(writer, "{} {}", self.node_count, self.edges.len())?;
        for edge in &self.edges {
            writeln!(writer, "{} {} {}", edge.source, edge.target, edge.weight)?;
        }
        Ok(())
    }

    /// Reads a graph in edge-list format.
    ///
    /// Blank lines are ignored. Exactly as many edge lines as the header
    /// declares must follow it.
    ///
    /// # Errors
    /// Returns a [`GraphFileError`] describing the first malformed line, a
    /// count mismatch between header and body, or a read failure.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, GraphFileError> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(index, line)| line.map(|text| (index + 1, text)))
            .filter(|item| !matches!(item, Ok((_, text)) if text.trim().is_empty()));

        let (header_line, header) = lines.next().ok_or(GraphFileError::MissingHeader)??;
        let [node_count, declared] = parse_header(header_line, &header)?;

        let mut edges = Vec::with_capacity(declared.min(MAX_PREALLOCATED_EDGES));
        let mut actual = 0;
        for item in lines {
            let (line, text) = item?;
            actual += 1;
            // Lines past the declared count are only counted.
            if actual <= declared {
                edges.push(parse_edge(line, &text, node_count)?);
            }
        }

        if actual != declared {
            return Err(GraphFileError::EdgeCountMismatch { declared, actual });
        }
        Ok(Self { node_count, edges })
    }
}

fn fields<const N: usize>(line: usize, text: &str) -> Result<[&str; N], GraphFileError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let actual = tokens.len();
    tokens.try_into().map_err(|_| GraphFileError::FieldCount {
        line,
        expected: N,
        actual,
    })
}

fn parse_index(line: usize, token: &str) -> Result<usize, GraphFileError> {
    token
        .parse::<usize>()
        .map_err(|_| GraphFileError::InvalidInteger {
            line,
            token: token.to_owned(),
        })
}

fn parse_header(line: usize, text: &str) -> Result<[usize; 2], GraphFileError> {
    let [nodes, edges] = fields::<2>(line, text)?;
    Ok([parse_index(line, nodes)?, parse_index(line, edges)?])
}

fn parse_edge(line: usize, text: &str, node_count: usize) -> Result<AffinityEdge, GraphFileError> {
    let [source, target, weight] = fields::<3>(line, text)?;
    let source = parse_index(line, source)?;
    let target = parse_index(line, target)?;
    for node in [source, target] {
        if node >= node_count {
            return Err(GraphFileError::NodeOutOfRange {
                line,
                node,
                node_count,
            });
        }
    }
    if source == target {
        return Err(GraphFileError::SelfLoop { line, node: source });
    }
    let weight = weight
        .parse::<f64>()
        .map_err(|_| GraphFileError::InvalidWeight {
            line,
            token: weight.to_owned(),
        })?;
    if !weight.is_finite() {
        return Err(GraphFileError::NonFiniteWeight { line, weight });
    }
    Ok(AffinityEdge::new(source, target, weight))
}
