//! Error types for the affinage core library.
//!
//! Each stage owns its error enum. [`AffinageError`] wraps them together with
//! path-aware I/O failures for the file-level pipeline, and every enum exposes
//! a stable machine-readable code for logging surfaces.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Invalid kernel or engine configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The distance threshold was NaN.
    #[error("max_distance must be a number (got {got})")]
    InvalidMaxDistance {
        /// The rejected threshold.
        got: f64,
    },
    /// The kernel variance must be finite and strictly positive.
    #[error("variance must be finite and greater than zero (got {got})")]
    InvalidVariance {
        /// The rejected variance.
        got: f64,
    },
}

define_error_codes! {
    /// Stable codes describing [`ConfigError`] variants.
    enum ConfigErrorCode for ConfigError {
        /// The distance threshold was NaN.
        InvalidMaxDistance => InvalidMaxDistance { .. } => "CONFIG_INVALID_MAX_DISTANCE",
        /// The kernel variance was not finite and positive.
        InvalidVariance => InvalidVariance { .. } => "CONFIG_INVALID_VARIANCE",
    }
}

/// Malformed distance matrix input.
///
/// Rows and columns are reported 0-based, matching the node ids they would
/// have become.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MatrixError {
    /// A token could not be parsed as a floating-point distance.
    #[error("row {row}, column {column}: `{token}` is not a number")]
    InvalidToken {
        /// Row containing the token.
        row: usize,
        /// Column of the token within the row.
        column: usize,
        /// Raw token text.
        token: String,
    },
    /// A distance was negative or NaN.
    #[error("row {row}, column {column}: invalid distance {value}")]
    InvalidDistance {
        /// Row containing the value.
        row: usize,
        /// Column of the value within the row.
        column: usize,
        /// Rejected value.
        value: f64,
    },
    /// A row did not contain one value per matrix row.
    #[error("row {row} has {actual} values but the matrix has {expected} rows")]
    RowLength {
        /// Offending row.
        row: usize,
        /// Number of rows in the matrix.
        expected: usize,
        /// Values found in the row.
        actual: usize,
    },
    /// Reading the underlying stream failed.
    #[error("failed to read distance matrix: {0}")]
    Io(#[from] io::Error),
}

define_error_codes! {
    /// Stable codes describing [`MatrixError`] variants.
    enum MatrixErrorCode for MatrixError {
        /// A token could not be parsed as a floating-point distance.
        InvalidToken => InvalidToken { .. } => "MATRIX_INVALID_TOKEN",
        /// A distance was negative or NaN.
        InvalidDistance => InvalidDistance { .. } => "MATRIX_INVALID_DISTANCE",
        /// A row did not contain one value per matrix row.
        RowLength => RowLength { .. } => "MATRIX_ROW_LENGTH",
        /// Reading the underlying stream failed.
        Io => Io(..) => "MATRIX_IO",
    }
}

/// Malformed affinity graph file.
///
/// Line numbers are 1-based positions within the file.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GraphFileError {
    /// The file did not contain a header line.
    #[error("graph file is missing the `<nodeCount> <edgeCount>` header")]
    MissingHeader,
    /// A line held the wrong number of tokens.
    #[error("line {line}: expected {expected} fields but found {actual}")]
    FieldCount {
        /// Offending line.
        line: usize,
        /// Number of fields required on that line.
        expected: usize,
        /// Number of fields present.
        actual: usize,
    },
    /// A node id or count was not a non-negative integer.
    #[error("line {line}: `{token}` is not a valid non-negative integer")]
    InvalidInteger {
        /// Offending line.
        line: usize,
        /// Raw token text.
        token: String,
    },
    /// A weight was not a number.
    #[error("line {line}: `{token}` is not a valid weight")]
    InvalidWeight {
        /// Offending line.
        line: usize,
        /// Raw token text.
        token: String,
    },
    /// A weight parsed but was NaN or infinite.
    #[error("line {line}: weight {weight} is not finite")]
    NonFiniteWeight {
        /// Offending line.
        line: usize,
        /// Rejected weight.
        weight: f64,
    },
    /// An edge endpoint was not below the declared node count.
    #[error("line {line}: node {node} is out of range for {node_count} nodes")]
    NodeOutOfRange {
        /// Offending line.
        line: usize,
        /// Out-of-range endpoint.
        node: usize,
        /// Declared node count.
        node_count: usize,
    },
    /// An edge joined a node to itself.
    #[error("line {line}: self loop on node {node}")]
    SelfLoop {
        /// Offending line.
        line: usize,
        /// Node on both ends of the edge.
        node: usize,
    },
    /// The body did not hold exactly as many edges as the header declared.
    #[error("header declares {declared} edges but the body holds {actual}")]
    EdgeCountMismatch {
        /// Edge count from the header.
        declared: usize,
        /// Non-blank edge lines actually present.
        actual: usize,
    },
    /// Reading the underlying stream failed.
    #[error("failed to read graph file: {0}")]
    Io(#[from] io::Error),
}

define_error_codes! {
    /// Stable codes describing [`GraphFileError`] variants.
    enum GraphFileErrorCode for GraphFileError {
        /// The file did not contain a header line.
        MissingHeader => MissingHeader => "GRAPH_MISSING_HEADER",
        /// A line held the wrong number of tokens.
        FieldCount => FieldCount { .. } => "GRAPH_FIELD_COUNT",
        /// A node id or count was not a non-negative integer.
        InvalidInteger => InvalidInteger { .. } => "GRAPH_INVALID_INTEGER",
        /// A weight was not a number.
        InvalidWeight => InvalidWeight { .. } => "GRAPH_INVALID_WEIGHT",
        /// A weight parsed but was NaN or infinite.
        NonFiniteWeight => NonFiniteWeight { .. } => "GRAPH_NON_FINITE_WEIGHT",
        /// An edge endpoint was not below the declared node count.
        NodeOutOfRange => NodeOutOfRange { .. } => "GRAPH_NODE_OUT_OF_RANGE",
        /// An edge joined a node to itself.
        SelfLoop => SelfLoop { .. } => "GRAPH_SELF_LOOP",
        /// The body did not hold exactly as many edges as the header declared.
        EdgeCountMismatch => EdgeCountMismatch { .. } => "GRAPH_EDGE_COUNT_MISMATCH",
        /// Reading the underlying stream failed.
        Io => Io(..) => "GRAPH_IO",
    }
}

/// Failures raised by the average-link engine.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LinkageError {
    /// The dendrogram would need more node ids than the output format can hold.
    #[error("graph with {node_count} nodes exceeds dendrogram capacity")]
    CapacityOverflow {
        /// Number of original nodes in the graph.
        node_count: usize,
    },
    /// An edge joined a node to itself or named a node outside the graph.
    #[error("edge {index} ({start} -> {end}) is invalid for {node_count} nodes")]
    InvalidEdge {
        /// Position of the edge in the graph's edge list.
        index: usize,
        /// Source endpoint.
        start: usize,
        /// Target endpoint.
        end: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// The merge loop ran out of live edges before finishing.
    #[error("no live edge left for merge {merge} of {expected}")]
    EdgesExhausted {
        /// Zero-based merge that found no candidate.
        merge: usize,
        /// Total merges the component count requires.
        expected: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`LinkageError`] variants.
    enum LinkageErrorCode for LinkageError {
        /// The dendrogram would need more node ids than the output format can hold.
        CapacityOverflow => CapacityOverflow { .. } => "LINKAGE_CAPACITY_OVERFLOW",
        /// An edge joined a node to itself or named a node outside the graph.
        InvalidEdge => InvalidEdge { .. } => "LINKAGE_INVALID_EDGE",
        /// The merge loop ran out of live edges before finishing.
        EdgesExhausted => EdgesExhausted { .. } => "LINKAGE_EDGES_EXHAUSTED",
    }
}

/// Error type produced by the file-level pipeline.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AffinageError {
    /// Opening, creating or writing a file failed.
    #[error("i/o failure on `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The distance matrix was malformed.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    /// The affinity graph file was malformed.
    #[error(transparent)]
    GraphFile(#[from] GraphFileError),
    /// The clustering engine failed.
    #[error(transparent)]
    Linkage(#[from] LinkageError),
}

define_error_codes! {
    /// Stable codes describing [`AffinageError`] variants.
    enum AffinageErrorCode for AffinageError {
        /// Opening, creating or writing a file failed.
        Io => Io { .. } => "AFFINAGE_IO",
        /// Configuration was rejected.
        Config => Config(..) => "AFFINAGE_CONFIG",
        /// The distance matrix was malformed.
        Matrix => Matrix(..) => "AFFINAGE_MALFORMED_MATRIX",
        /// The affinity graph file was malformed.
        GraphFile => GraphFile(..) => "AFFINAGE_MALFORMED_GRAPH",
        /// The clustering engine failed.
        Linkage => Linkage(..) => "AFFINAGE_LINKAGE_FAILURE",
    }
}

impl AffinageError {
    /// Retrieve the stage-specific code of the wrapped error, if any.
    #[must_use]
    pub const fn detail_code(&self) -> Option<&'static str> {
        match self {
            Self::Io { .. } => None,
            Self::Config(error) => Some(error.code().as_str()),
            Self::Matrix(error) => Some(error.code().as_str()),
            Self::GraphFile(error) => Some(error.code().as_str()),
            Self::Linkage(error) => Some(error.code().as_str()),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenient alias for results returned by the file pipeline.
pub type Result<T> = core::result::Result<T, AffinageError>;
