//! Load a built graph into Neo4j.
//!
//! Administrative path: there is no fallback here. Any failure stops the
//! deploy and reports the target URI and the step that failed.

use std::fmt;
use std::path::Path;

use astrokg_common::{FilteredGraph, GraphConfig};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::artifacts::load_filtered_graph;
use crate::neo4j_repository::{GraphCounts, Neo4jGraphStore};
use crate::repository::{GraphStore, GraphStoreError};

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployStep {
    LoadingArtifacts,
    Connecting,
    Clearing,
    CreatingConstraints,
    LoadingEntities,
    LoadingRelations,
    Verifying,
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeployStep::LoadingArtifacts => "loading artifacts",
            DeployStep::Connecting => "connecting",
            DeployStep::Clearing => "clearing the database",
            DeployStep::CreatingConstraints => "creating constraints",
            DeployStep::LoadingEntities => "loading entities",
            DeployStep::LoadingRelations => "loading relations",
            DeployStep::Verifying => "verifying",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
#[error("Deploy to {uri} failed while {step}: {source}")]
pub struct DeployError {
    pub uri: String,
    pub step: DeployStep,
    #[source]
    pub source: GraphStoreError,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeployReport {
    pub entities_loaded: usize,
    pub relations_loaded: usize,
    pub counts: GraphCounts,
}

pub struct DeployOptions {
    /// Delete everything in the target database first.
    pub clear: bool,
}

/// Read the filtered artifacts from `graph_dir` and deploy them.
pub async fn deploy_from_dir(
    config: &GraphConfig,
    graph_dir: &Path,
    options: &DeployOptions,
) -> Result<DeployReport, DeployError> {
    let uri = config.uri.clone().unwrap_or_default();
    let graph = load_filtered_graph(graph_dir).map_err(|e| DeployError {
        uri: uri.clone(),
        step: DeployStep::LoadingArtifacts,
        source: e.into(),
    })?;
    let store = Neo4jGraphStore::connect(config).await.map_err(|source| DeployError {
        uri,
        step: DeployStep::Connecting,
        source,
    })?;
    deploy_graph(&store, &graph, options).await
}

pub async fn deploy_graph(
    store: &Neo4jGraphStore,
    graph: &FilteredGraph,
    options: &DeployOptions,
) -> Result<DeployReport, DeployError> {
    let fail = |step: DeployStep| {
        let uri = store.uri().to_string();
        move |source: GraphStoreError| DeployError { uri, step, source }
    };

    if options.clear {
        store.clear_database().await.map_err(fail(DeployStep::Clearing))?;
    }
    store.create_constraints().await.map_err(fail(DeployStep::CreatingConstraints))?;

    for (i, entity) in graph.entities.iter().enumerate() {
        store.upsert_entity(entity).await.map_err(fail(DeployStep::LoadingEntities))?;
        if (i + 1) % PROGRESS_EVERY == 0 {
            info!("Loaded {}/{} entities", i + 1, graph.entities.len());
        }
    }
    info!("Loaded {} entities", graph.entities.len());

    for (i, relation) in graph.relations.iter().enumerate() {
        store.create_relation(relation).await.map_err(fail(DeployStep::LoadingRelations))?;
        if (i + 1) % PROGRESS_EVERY == 0 {
            info!("Loaded {}/{} relations", i + 1, graph.relations.len());
        }
    }
    info!("Loaded {} relations", graph.relations.len());

    let counts = store.counts().await.map_err(fail(DeployStep::Verifying))?;
    info!(
        "Neo4j at {} now holds {} nodes and {} relationships",
        store.uri(),
        counts.nodes,
        counts.relationships
    );
    for (name, score) in &counts.top_entities {
        info!("  {} ({:.1})", name, score);
    }

    Ok(DeployReport {
        entities_loaded: graph.entities.len(),
        relations_loaded: graph.relations.len(),
        counts,
    })
}
