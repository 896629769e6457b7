//! Configuration loading for astrokg.
//! Reads astrokg.toml (or .yaml / .json) from the current directory or the path
//! in the ASTROKG_CONFIG env var. A missing file yields the defaults, which
//! serve the canned demo graph without any external service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{AstroError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from disk, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var("ASTROKG_CONFIG").unwrap_or_else(|_| "astrokg.toml".to_string());
        let mut config = if Path::new(&path).exists() {
            Self::from_path(&path)?
        } else {
            info!("Config file {} not found, using defaults", path);
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a config file, choosing the format from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Self::from_toml(&content),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AstroError::Config(e.to_string()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| AstroError::Config(e.to_string()))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(uri) = get("NEO4J_URI") {
            self.graph.uri = Some(uri);
        }
        if let Some(user) = get("NEO4J_USER") {
            self.graph.user = user;
        }
        if let Some(password) = get("NEO4J_PASSWORD") {
            self.graph.password = Some(password);
        }
        if let Some(kind) = get("ASTROKG_GRAPH_BACKEND").and_then(|k| GraphBackendKind::parse(&k)) {
            self.graph.backend = kind;
        }
        if let Some(url) = get("ASTROKG_SQLITE_URL") {
            self.database.url = url;
        }
    }
}

// ── Build ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Entities scoring below this are dropped from the filtered graph.
    #[serde(default = "default_importance_threshold")]
    pub importance_threshold: f64,
    /// Names scoring above this (0-100) are merged into an existing entity.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Character distance around a relation cue that still links a mention.
    #[serde(default = "default_pattern_window")]
    pub pattern_window: usize,
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
    #[serde(default = "default_synonyms")]
    pub synonyms: BTreeMap<String, String>,
    #[serde(default = "default_space_conditions")]
    pub space_conditions: Vec<String>,
}

fn default_input_dir() -> PathBuf { PathBuf::from("data") }
fn default_output_dir() -> PathBuf { PathBuf::from("graph_data") }
fn default_importance_threshold() -> f64 { 20.0 }
fn default_similarity_threshold() -> f64 { 85.0 }
fn default_pattern_window() -> usize { 50 }
fn default_parallel_threshold() -> usize { 16 }

fn default_synonyms() -> BTreeMap<String, String> {
    [
        ("space flight", "spaceflight"),
        ("space-flight", "spaceflight"),
        ("micro-gravity", "microgravity"),
        ("micro gravity", "microgravity"),
        ("zero gravity", "microgravity"),
        ("weightlessness", "microgravity"),
        ("rnaseq", "rna-seq"),
        ("rna seq", "rna-seq"),
        ("reactive oxygen species", "ros"),
        ("international space station", "iss"),
        ("hind limb unloading", "hindlimb unloading"),
        ("hind-limb unloading", "hindlimb unloading"),
        ("mice", "mouse"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_space_conditions() -> Vec<String> {
    [
        "microgravity",
        "simulated microgravity",
        "spaceflight",
        "space flight",
        "weightlessness",
        "hypergravity",
        "radiation",
        "space radiation",
        "cosmic radiation",
        "ionizing radiation",
        "galactic cosmic rays",
        "hindlimb unloading",
        "hindlimb suspension",
        "bed rest",
        "isolation",
        "confinement",
        "hypoxia",
        "space environment",
        "low earth orbit",
        "international space station",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            importance_threshold: default_importance_threshold(),
            similarity_threshold: default_similarity_threshold(),
            pattern_window: default_pattern_window(),
            parallel_threshold: default_parallel_threshold(),
            synonyms: default_synonyms(),
            space_conditions: default_space_conditions(),
        }
    }
}

// ── Graph backend ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphBackendKind {
    /// Remote Neo4j database.
    Neo4j,
    /// Filtered graph loaded from build artifacts.
    Memory,
    /// Fixed canned data.
    Demo,
}

impl GraphBackendKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "neo4j" => Some(Self::Neo4j),
            "memory" => Some(Self::Memory),
            "demo" | "placeholder" => Some(Self::Demo),
            _ => None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_backend")]
    pub backend: GraphBackendKind,
    pub uri: Option<String>,
    #[serde(default = "default_neo4j_user")]
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub database: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Directory holding filtered_entities.json / filtered_relations.json.
    #[serde(default = "default_output_dir")]
    pub graph_dir: PathBuf,
    #[serde(default = "default_related_papers_cache")]
    pub related_papers_cache: usize,
    #[serde(default = "default_entity_name_cache")]
    pub entity_name_cache: usize,
}

fn default_backend() -> GraphBackendKind { GraphBackendKind::Demo }
fn default_neo4j_user() -> String { "neo4j".to_string() }
fn default_timeout_secs() -> u64 { 5 }
fn default_related_papers_cache() -> usize { 100 }
fn default_entity_name_cache() -> usize { 50 }

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            uri: None,
            user: default_neo4j_user(),
            password: None,
            database: None,
            timeout_secs: default_timeout_secs(),
            graph_dir: default_output_dir(),
            related_papers_cache: default_related_papers_cache(),
            entity_name_cache: default_entity_name_cache(),
        }
    }
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("backend", &self.backend)
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("timeout_secs", &self.timeout_secs)
            .field("graph_dir", &self.graph_dir)
            .finish()
    }
}

// ── Relational store ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String { "sqlite://astrokg.db".to_string() }
fn default_max_connections() -> u32 { 5 }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

// ── Server ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 3001 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
