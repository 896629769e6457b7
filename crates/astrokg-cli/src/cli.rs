use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "astrokg")]
#[command(about = "astrokg - space biology knowledge graph builder and hybrid query service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./astrokg.toml, or $ASTROKG_CONFIG)
    #[arg(short = 'C', long, global = true, env = "ASTROKG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract, aggregate, score and filter the graph from a paper corpus
    Build {
        /// Directory holding papers.csv and the optional JSONL inputs
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory the graph artifacts are written to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Importance threshold for entity filtering
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Load papers, summaries, clusters and keywords into the relational store
    LoadDb {
        /// Directory holding papers.csv
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory holding the summary, cluster and keyword CSVs
        /// (defaults to <input>/outputs)
        #[arg(long)]
        outputs: Option<PathBuf>,
    },

    /// Push the filtered graph artifacts into Neo4j
    Deploy {
        /// Directory holding filtered_entities.json and filtered_relations.json
        #[arg(short, long)]
        graph_dir: Option<PathBuf>,

        /// Delete every node and relationship first
        #[arg(long)]
        clear: bool,
    },

    /// Answer one free-text query and print the JSON result
    Query {
        query: String,
    },

    /// Show the structured graph query for a question without running it
    Translate {
        /// Question to translate; lists the example questions when omitted
        question: Option<String>,
    },

    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
}
