use super::*;
use crate::primitives::OutputFormat;

#[test]
fn test_graph_defaults() {
    let cli = Cli::try_parse_from(["lockgraph", "graph"]).unwrap();
    match cli.command {
        Commands::Graph { project } => {
            assert_eq!(project.manifest, PathBuf::from("Pipfile"));
            assert_eq!(project.lock, PathBuf::from("Pipfile.lock"));
            assert!(!project.dev);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "lockgraph",
        "metrics",
        "--lock",
        "app.lock",
        "--root",
        "flask",
        "--root",
        "requests",
        "-j",
        "2",
        "-o",
        "json-compact",
    ])
    .unwrap();

    assert_eq!(cli.config.jobs, 2);
    assert_eq!(cli.config.output, OutputFormat::JsonCompact);
    match cli.command {
        Commands::Metrics { project, roots } => {
            assert_eq!(project.lock, PathBuf::from("app.lock"));
            assert_eq!(roots, vec!["flask", "requests"]);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_diff_requires_both_lockfiles() {
    assert!(Cli::try_parse_from(["lockgraph", "diff", "--old-lock", "a.lock"]).is_err());

    let cli = Cli::try_parse_from([
        "lockgraph",
        "diff",
        "--old-lock",
        "a.lock",
        "--new-lock",
        "b.lock",
        "--show-removed",
    ])
    .unwrap();
    assert_eq!(cli.command.name(), "diff");
    assert!(matches!(
        cli.command,
        Commands::Diff {
            show_removed: true,
            dev: false,
            ..
        }
    ));
}

#[test]
fn test_why_requires_a_package() {
    assert!(Cli::try_parse_from(["lockgraph", "why"]).is_err());
    let cli = Cli::try_parse_from(["lockgraph", "why", "urllib3"]).unwrap();
    assert!(matches!(cli.command, Commands::Why { ref packages, .. } if packages == &["urllib3"]));
}

#[test]
fn test_missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["lockgraph"]).is_err());
}
