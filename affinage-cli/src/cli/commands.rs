//! Command implementations and argument parsing for the affinage CLI.

use std::io::{self, Write};
use std::path::PathBuf;

use affinage_core::{
    AffinageError, AffinityBuilder, ClusterSummary, ConfigError, DendrogramFormat, GraphSummary,
    build_affinity_file, cluster_file,
};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "affinage",
    version,
    about = "Build affinity graphs from distance matrices and cluster them with average linkage."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Threshold a distance matrix into a Gaussian-kernel affinity graph.
    Affinity(AffinityArgs),
    /// Cluster an affinity graph into an average-link dendrogram.
    Cluster(ClusterArgs),
}

/// Options accepted by the `affinity` command.
#[derive(Debug, Args, Clone)]
pub struct AffinityArgs {
    /// Whitespace-separated square distance matrix, one row per line.
    pub matrix: PathBuf,

    /// Destination of the affinity graph.
    pub graph: PathBuf,

    /// Largest distance that still produces an edge.
    #[arg(long = "max-distance", allow_negative_numbers = true)]
    pub max_distance: f64,

    /// Kernel variance (defaults to 3600).
    #[arg(long)]
    pub variance: Option<f64>,
}

/// Options accepted by the `cluster` command.
#[derive(Debug, Args, Clone)]
pub struct ClusterArgs {
    /// Affinity graph produced by `affinity`.
    pub graph: PathBuf,

    /// Destination of the dendrogram.
    pub dendrogram: PathBuf,

    /// Append each node's merge height as a fourth column.
    #[arg(long)]
    pub heights: bool,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Kernel options were rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A pipeline stage failed.
    #[error(transparent)]
    Core(#[from] AffinageError),
}

impl CliError {
    /// Stable top-level code for logging.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "AFFINAGE_CONFIG",
            Self::Core(error) => error.code().as_str(),
        }
    }

    /// Stage-specific code of the underlying failure, if any.
    #[must_use]
    pub const fn detail_code(&self) -> Option<&'static str> {
        match self {
            Self::Config(error) => Some(error.code().as_str()),
            Self::Core(error) => error.detail_code(),
        }
    }
}

/// Outcome of a successful command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionSummary {
    /// Totals of the written affinity graph.
    Affinity(GraphSummary),
    /// Totals of the written dendrogram.
    Cluster(ClusterSummary),
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when configuration is invalid or a stage fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use affinage_cli::cli::{AffinityArgs, Cli, Command, ExecutionSummary, run_cli};
/// # use tempfile::TempDir;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = TempDir::new()?;
/// let matrix = dir.path().join("matrix.txt");
/// std::fs::write(&matrix, "0 1\n1 0\n")?;
/// let cli = Cli {
///     command: Command::Affinity(AffinityArgs {
///         matrix,
///         graph: dir.path().join("graph.txt"),
///         max_distance: 2.0,
///         variance: None,
///     }),
/// };
/// let ExecutionSummary::Affinity(summary) = run_cli(cli)? else {
///     unreachable!("affinity command yields a graph summary");
/// };
/// assert_eq!(summary.edge_count, 2);
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    let summary = match cli.command {
        Command::Affinity(args) => {
            span.record("command", field::display("affinity"));
            ExecutionSummary::Affinity(run_affinity(args)?)
        }
        Command::Cluster(args) => {
            span.record("command", field::display("cluster"));
            ExecutionSummary::Cluster(run_cluster(args)?)
        }
    };
    info!("command completed");
    Ok(summary)
}

#[instrument(
    name = "cli.affinity",
    err,
    skip(args),
    fields(max_distance = args.max_distance, variance = field::Empty),
)]
pub(super) fn run_affinity(args: AffinityArgs) -> Result<GraphSummary, CliError> {
    let AffinityArgs {
        matrix,
        graph,
        max_distance,
        variance,
    } = args;
    let mut builder = AffinityBuilder::new(max_distance);
    if let Some(variance) = variance {
        builder = builder.with_variance(variance);
    }
    let kernel = builder.build()?;
    Span::current().record("variance", kernel.variance());
    Ok(build_affinity_file(&matrix, &graph, &kernel)?)
}

#[instrument(name = "cli.cluster", err, skip(args), fields(heights = args.heights))]
pub(super) fn run_cluster(args: ClusterArgs) -> Result<ClusterSummary, CliError> {
    let format = if args.heights {
        DendrogramFormat::WithHeights
    } else {
        DendrogramFormat::Classic
    };
    Ok(cluster_file(&args.graph, &args.dendrogram, format)?)
}

/// Renders `summary` to `writer` as `key: value` lines.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use affinage_cli::cli::{ExecutionSummary, render_summary};
/// # use affinage_core::GraphSummary;
/// let summary = ExecutionSummary::Affinity(GraphSummary {
///     node_count: 3,
///     edge_count: 2,
/// });
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// assert_eq!(String::from_utf8_lossy(&buffer), "nodes: 3\nedges: 2\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary {
        ExecutionSummary::Affinity(graph) => {
            writeln!(writer, "nodes: {}", graph.node_count)?;
            writeln!(writer, "edges: {}", graph.edge_count)?;
        }
        ExecutionSummary::Cluster(tree) => {
            writeln!(writer, "nodes: {}", tree.node_count)?;
            writeln!(writer, "components: {}", tree.component_count)?;
            writeln!(writer, "merges: {}", tree.merges)?;
            writeln!(writer, "total nodes: {}", tree.total_nodes)?;
        }
    }
    Ok(())
}
