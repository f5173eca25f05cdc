//! Unit tests for argument parsing and command execution.

use super::commands::{run_affinity, run_cluster};
use super::{
    AffinityArgs, Cli, CliError, ClusterArgs, Command, ExecutionSummary, render_summary, run_cli,
};

use std::path::Path;

use affinage_core::{AffinageError, ClusterSummary, GraphSummary};
use affinage_test_support::fixtures::{Workspace, line_matrix, read};
use affinage_test_support::tracing::RecordingLayer;
use clap::Parser;
use rstest::rstest;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn affinity_args(workspace: &Workspace, max_distance: f64, variance: Option<f64>) -> AffinityArgs {
    AffinityArgs {
        matrix: workspace.path("matrix.txt"),
        graph: workspace.path("graph.txt"),
        max_distance,
        variance,
    }
}

fn cluster_args(workspace: &Workspace, heights: bool) -> ClusterArgs {
    ClusterArgs {
        graph: workspace.path("graph.txt"),
        dendrogram: workspace.path("dendrogram.txt"),
        heights,
    }
}

fn three_points(workspace: &Workspace) -> TestResult {
    workspace.write_matrix(
        "matrix.txt",
        &[
            vec![0.0, 1.0, 100.0],
            vec![1.0, 0.0, 100.0],
            vec![100.0, 100.0, 0.0],
        ],
    )?;
    Ok(())
}

#[test]
fn clap_parses_affinity_command() {
    let cli = Cli::try_parse_from([
        "affinage",
        "affinity",
        "m.txt",
        "g.txt",
        "--max-distance",
        "-1",
        "--variance",
        "2.5",
    ])
    .expect("arguments must parse");
    match cli.command {
        Command::Affinity(args) => {
            assert_eq!(args.matrix, Path::new("m.txt"));
            assert_eq!(args.graph, Path::new("g.txt"));
            assert_eq!(args.max_distance, -1.0);
            assert_eq!(args.variance, Some(2.5));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[rstest]
#[case::classic(&["affinage", "cluster", "g.txt", "d.txt"], false)]
#[case::heights(&["affinage", "cluster", "g.txt", "d.txt", "--heights"], true)]
fn clap_parses_cluster_command(#[case] argv: &[&str], #[case] heights: bool) {
    let cli = Cli::try_parse_from(argv).expect("arguments must parse");
    match cli.command {
        Command::Cluster(args) => {
            assert_eq!(args.graph, Path::new("g.txt"));
            assert_eq!(args.dendrogram, Path::new("d.txt"));
            assert_eq!(args.heights, heights);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[rstest]
#[case::missing_threshold(&["affinage", "affinity", "m.txt", "g.txt"])]
#[case::non_numeric_threshold(&["affinage", "affinity", "m.txt", "g.txt", "--max-distance", "far"])]
#[case::missing_output(&["affinage", "cluster", "g.txt"])]
#[case::unknown_command(&["affinage", "prune", "g.txt"])]
fn clap_rejects_invalid_usage(#[case] argv: &[&str]) {
    assert!(Cli::try_parse_from(argv).is_err());
}

#[test]
fn affinity_then_cluster_round_trip() -> TestResult {
    let workspace = Workspace::new()?;
    three_points(&workspace)?;

    let graph = run_cli(Cli {
        command: Command::Affinity(affinity_args(&workspace, 50.0, None)),
    })?;
    assert_eq!(
        graph,
        ExecutionSummary::Affinity(GraphSummary {
            node_count: 3,
            edge_count: 2,
        })
    );

    let tree = run_cli(Cli {
        command: Command::Cluster(cluster_args(&workspace, false)),
    })?;
    assert_eq!(
        tree,
        ExecutionSummary::Cluster(ClusterSummary {
            node_count: 3,
            component_count: 2,
            merges: 1,
            total_nodes: 4,
        })
    );
    assert_eq!(
        read(&workspace.path("dendrogram.txt"))?,
        "4\n3 -1 -1\n3 -1 -1\n2 -1 -1\n3 0 1\n"
    );
    Ok(())
}

#[test]
fn heights_flag_adds_a_fourth_column() -> TestResult {
    let workspace = Workspace::new()?;
    workspace.write_matrix("matrix.txt", &line_matrix(&[0.0, 1.0, 3.0]))?;
    run_affinity(affinity_args(&workspace, 10.0, None))?;
    run_cluster(cluster_args(&workspace, true))?;

    let text = read(&workspace.path("dendrogram.txt"))?;
    assert!(
        text.lines()
            .skip(1)
            .all(|line| line.split_whitespace().count() == 4)
    );
    Ok(())
}

#[rstest]
#[case::zero(0.0)]
#[case::negative(-4.0)]
#[case::nan(f64::NAN)]
fn invalid_variance_is_a_config_error(#[case] variance: f64) -> TestResult {
    let workspace = Workspace::new()?;
    three_points(&workspace)?;

    let err = run_affinity(affinity_args(&workspace, 50.0, Some(variance)))
        .expect_err("variance must be rejected");
    assert!(matches!(err, CliError::Config(_)));
    assert_eq!(err.code(), "AFFINAGE_CONFIG");
    assert_eq!(err.detail_code(), Some("CONFIG_INVALID_VARIANCE"));
    assert!(!workspace.path("graph.txt").exists());
    Ok(())
}

#[test]
fn missing_graph_is_an_io_error() -> TestResult {
    let workspace = Workspace::new()?;
    let err = run_cluster(cluster_args(&workspace, false)).expect_err("graph is missing");
    assert!(matches!(err, CliError::Core(AffinageError::Io { .. })));
    assert_eq!(err.code(), "AFFINAGE_IO");
    assert_eq!(err.detail_code(), None);
    assert!(!workspace.path("dendrogram.txt").exists());
    Ok(())
}

#[test]
fn malformed_graph_reports_stage_code() -> TestResult {
    let workspace = Workspace::new()?;
    workspace.write("graph.txt", "2 1\n0 0 0.5\n")?;
    let err = run_cluster(cluster_args(&workspace, false)).expect_err("self loop is rejected");
    assert_eq!(err.code(), "AFFINAGE_MALFORMED_GRAPH");
    assert_eq!(err.detail_code(), Some("GRAPH_SELF_LOOP"));
    Ok(())
}

#[rstest]
#[case::affinity(
    ExecutionSummary::Affinity(GraphSummary { node_count: 3, edge_count: 2 }),
    "nodes: 3\nedges: 2\n"
)]
#[case::cluster(
    ExecutionSummary::Cluster(ClusterSummary {
        node_count: 3,
        component_count: 2,
        merges: 1,
        total_nodes: 4,
    }),
    "nodes: 3\ncomponents: 2\nmerges: 1\ntotal nodes: 4\n"
)]
fn render_summary_writes_key_value_lines(
    #[case] summary: ExecutionSummary,
    #[case] expected: &str,
) -> TestResult {
    let mut buffer = Vec::new();
    render_summary(&summary, &mut buffer)?;
    assert_eq!(String::from_utf8(buffer)?, expected);
    Ok(())
}

#[test]
fn run_cli_emits_tracing_fields() -> TestResult {
    let workspace = Workspace::new()?;
    three_points(&workspace)?;
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    let cli = Cli {
        command: Command::Affinity(affinity_args(&workspace, 50.0, Some(12.5))),
    };
    tracing::subscriber::with_default(subscriber, || run_cli(cli))?;

    let run = layer.span("cli.run").expect("cli.run span must exist");
    assert_eq!(run.fields.get("command"), Some(&"affinity".to_owned()));

    let affinity = layer
        .span("cli.affinity")
        .expect("cli.affinity span must exist");
    assert_eq!(affinity.fields.get("max_distance"), Some(&"50".to_owned()));
    assert_eq!(affinity.fields.get("variance"), Some(&"12.5".to_owned()));

    let stage = layer
        .span("pipeline.build_affinity_file")
        .expect("pipeline span must exist");
    assert_eq!(stage.fields.get("edges"), Some(&"2".to_owned()));

    assert!(layer.events().iter().any(|event| {
        event.level == Level::INFO && event.message() == Some("command completed")
    }));
    Ok(())
}

#[test]
fn failing_command_closes_span_without_completion_event() -> TestResult {
    let workspace = Workspace::new()?;
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    let cli = Cli {
        command: Command::Cluster(cluster_args(&workspace, true)),
    };
    let err = tracing::subscriber::with_default(subscriber, || run_cli(cli))
        .expect_err("graph is missing");
    assert_eq!(err.code(), "AFFINAGE_IO");

    let cluster = layer
        .span("cli.cluster")
        .expect("cli.cluster span must exist");
    assert_eq!(cluster.fields.get("heights"), Some(&"true".to_owned()));
    assert!(!layer.has_event("command completed"));
    Ok(())
}
