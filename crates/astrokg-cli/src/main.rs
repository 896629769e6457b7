//! astrokg: command-line entry point.

mod cli;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use astrokg_common::AppConfig;
use astrokg_db::{connect_paper_store, load_directory};
use astrokg_kg::{connect_graph_store, deploy_from_dir, BuildPipeline, DeployOptions};
use astrokg_query::{example_queries, GraphQueryTranslator, QueryEngine};
use astrokg_web::AppState;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            let mut config = AppConfig::from_path(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => AppConfig::load().context("failed to load astrokg.toml"),
    }
}

async fn engine(config: &AppConfig) -> anyhow::Result<QueryEngine> {
    let graph = connect_graph_store(&config.graph).await;
    let papers = connect_paper_store(&config.database)
        .await
        .with_context(|| format!("failed to open paper store {}", config.database.url))?;
    info!("Graph backend: {}, paper backend: {}", graph.backend_name(), papers.backend_name());
    Ok(QueryEngine::new(graph, papers)?)
}

async fn shutdown(engine: &QueryEngine) {
    if let Err(e) = engine.graph().close().await {
        warn!("Graph store did not close cleanly: {}", e);
    }
    engine.papers().close().await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "astrokg=debug,info" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Build { input, output, threshold } => {
            if let Some(input) = input {
                config.build.input_dir = input;
            }
            if let Some(output) = output {
                config.build.output_dir = output;
            }
            if let Some(threshold) = threshold {
                config.build.importance_threshold = threshold;
            }
            let input_dir = config.build.input_dir.clone();
            let summary = tokio::task::spawn_blocking(move || BuildPipeline::new(config.build).run())
                .await
                .context("build task panicked")?
                .with_context(|| format!("build failed for {}", input_dir.display()))?;
            info!(
                "Built graph from {} papers: {} entities, {} relations ({} / {} after filtering) in {}",
                summary.papers,
                summary.entities,
                summary.relations,
                summary.filtered_entities,
                summary.filtered_relations,
                summary.output_dir.display()
            );
        }

        Commands::LoadDb { input, outputs } => {
            let input = input.unwrap_or_else(|| config.build.input_dir.clone());
            let outputs: PathBuf = outputs.unwrap_or_else(|| input.join("outputs"));
            let store = connect_paper_store(&config.database)
                .await
                .with_context(|| format!("failed to open paper store {}", config.database.url))?;
            let report = load_directory(store.as_ref(), &input, &outputs)
                .await
                .with_context(|| format!("failed to load {}", input.display()))?;
            info!(
                "Loaded {} papers, {} summaries, {} clusters, {} assignments, {} keywords ({} rows skipped)",
                report.papers,
                report.summaries,
                report.clusters,
                report.assignments,
                report.keywords,
                report.skipped
            );
            store.close().await;
        }

        Commands::Deploy { graph_dir, clear } => {
            if config.graph.uri.is_none() {
                bail!("deploy needs a Neo4j URI: set graph.uri or NEO4J_URI");
            }
            let graph_dir = graph_dir.unwrap_or_else(|| config.graph.graph_dir.clone());
            let report = deploy_from_dir(&config.graph, &graph_dir, &DeployOptions { clear }).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Query { query } => {
            let engine = engine(&config).await?;
            let result = engine.run_query(&query).await;
            shutdown(&engine).await;
            println!("{}", serde_json::to_string_pretty(&result?)?);
        }

        Commands::Translate { question } => {
            let translator = GraphQueryTranslator::new()?;
            let Some(question) = question else {
                for q in example_queries() {
                    println!("{}", q);
                }
                return Ok(());
            };
            match translator.translate(&question) {
                Some(translated) => {
                    println!("{}", translated.description);
                    println!("{}", translated.cypher());
                    for (name, value) in translated.params() {
                        println!("  ${} = {:?}", name, value);
                    }
                }
                None => bail!("no translation rule matches '{}'", question),
            }
        }

        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let engine = engine(&config).await?;
            let (graph, papers) = (engine.graph().clone(), engine.papers().clone());
            let served = astrokg_web::serve(&config.server, AppState::new(engine)).await;
            if let Err(e) = graph.close().await {
                warn!("Graph store did not close cleanly: {}", e);
            }
            papers.close().await;
            served.context("HTTP server failed")?;
        }
    }

    Ok(())
}
