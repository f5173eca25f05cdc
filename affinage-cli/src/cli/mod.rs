//! Command-line interface for the two pipeline stages.
//!
//! `affinity` turns a distance matrix into an affinity graph file and
//! `cluster` turns an affinity graph file into a dendrogram.

mod commands;

pub use commands::{
    AffinityArgs, Cli, CliError, ClusterArgs, Command, ExecutionSummary, render_summary, run_cli,
};

#[cfg(test)]
mod tests;
