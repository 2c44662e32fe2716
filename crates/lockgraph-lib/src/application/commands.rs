//! Command execution handlers
//!
//! Handlers produce a JSON document; [`execute_command`] prints it in the
//! configured output format.

use crate::api::dependency_graph::{DependencyGraph, DependencyGraphError};
use crate::api::diff::GraphDiffer;
use crate::api::metrics::MetricsAggregator;
use crate::api::thoth::MetadataSource;
use crate::application::session::CommandSession;
use crate::application::{AppConfig, Commands, ProjectArgs};
use crate::primitives::OutputFormat;
use crate::stack::package::canonical_id;
use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::path::Path;
use tracing::{debug, info};

/// Execute a CLI command against the live services and print its result
pub async fn execute_command(command: Commands, config: AppConfig) -> Result<()> {
    let output = config.output;
    let session = CommandSession::live(config)?;

    let document = execute_command_with_session(command, &session).await?;
    println!("{}", render(&document, output)?);
    Ok(())
}

/// Execute a specific command with a provided session (for testing)
pub async fn execute_command_with_session<S>(
    command: Commands,
    session: &CommandSession<S>,
) -> Result<Value>
where
    S: MetadataSource + 'static,
{
    info!("Running {} command", command.name());

    match command {
        Commands::Graph { project } => handle_graph(session, &project).await,
        Commands::Diff {
            manifest,
            old_lock,
            new_lock,
            dev,
            show_removed,
        } => handle_diff(session, &manifest, &old_lock, &new_lock, dev, show_removed).await,
        Commands::Metrics { project, roots } => handle_metrics(session, &project, &roots).await,
        Commands::Why { project, packages } => handle_why(session, &project, &packages).await,
    }
}

/// Serialize a command result
pub fn render(document: &Value, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)?,
        OutputFormat::JsonCompact => serde_json::to_string(document)?,
    };
    Ok(rendered)
}

async fn load_project<S>(session: &CommandSession<S>, project: &ProjectArgs) -> Result<DependencyGraph>
where
    S: MetadataSource + 'static,
{
    let graph = session
        .load_graph(&project.manifest, &project.lock, project.dev)
        .await?;
    ensure_packages(&graph, &project.lock)?;
    Ok(graph)
}

fn ensure_packages(graph: &DependencyGraph, lock: &Path) -> Result<()> {
    if !graph.has_packages() {
        bail!("no packages found in {}", lock.display());
    }
    Ok(())
}

async fn handle_graph<S>(session: &CommandSession<S>, project: &ProjectArgs) -> Result<Value>
where
    S: MetadataSource + 'static,
{
    let graph = load_project(session, project).await?;
    Ok(serde_json::to_value(graph.view())?)
}

async fn handle_diff<S>(
    session: &CommandSession<S>,
    manifest: &Path,
    old_lock: &Path,
    new_lock: &Path,
    dev: bool,
    show_removed: bool,
) -> Result<Value>
where
    S: MetadataSource + 'static,
{
    let old = session.load_graph(manifest, old_lock, dev).await?;
    // packages pinned identically in both lockfiles come from the cache
    let new = session.load_graph(manifest, new_lock, dev).await?;

    if !old.has_packages() && !new.has_packages() {
        bail!(
            "no packages found in {} or {}",
            old_lock.display(),
            new_lock.display()
        );
    }

    let result = GraphDiffer::default().diff(&old, &new);
    let summary = result.summary();
    debug!("Diff summary: {:?}", summary);

    Ok(json!({
        "entries": result.view(show_removed),
        "edges": result.edges,
        "summary": summary,
    }))
}

async fn handle_metrics<S>(
    session: &CommandSession<S>,
    project: &ProjectArgs,
    roots: &[String],
) -> Result<Value>
where
    S: MetadataSource + 'static,
{
    let graph = load_project(session, project).await?;

    let roots: Vec<String> = roots.iter().map(|root| canonical_id(root)).collect();
    if let Some(missing) = roots.iter().find(|root| !graph.contains(root)) {
        return Err(DependencyGraphError::NodeNotFound {
            id: missing.clone(),
        })
        .context("Metrics root is not part of the dependency graph");
    }

    let registry = session.license_registry().await;
    let aggregator = MetricsAggregator::new(&registry);
    let metrics = if roots.is_empty() {
        aggregator.aggregate_default(&graph)
    } else {
        aggregator.aggregate(&graph, &roots)
    };

    Ok(serde_json::to_value(metrics)?)
}

async fn handle_why<S>(
    session: &CommandSession<S>,
    project: &ProjectArgs,
    packages: &[String],
) -> Result<Value>
where
    S: MetadataSource + 'static,
{
    let graph = load_project(session, project).await?;

    let ids: Vec<String> = packages.iter().map(|name| canonical_id(name)).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

    let paths = graph
        .paths_to_root(&id_refs)
        .context("Package is not part of the dependency graph")?;
    Ok(serde_json::to_value(paths)?)
}

#[cfg(test)]
mod tests {
    include!("commands.test.rs");
}
