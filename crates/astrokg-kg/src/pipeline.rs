//! The batch build: papers in, graph artifacts out.
//!
//! ```text
//! papers.csv ─┬─ rule mentions ─┐
//! mentions.jsonl ───────────────┴─ resolve ─ extract ─ aggregate ─ filter ─ analyze
//! parses.jsonl ──────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use astrokg_common::{BuildConfig, RawMention, RelationCandidate};
use astrokg_ner::{AnnotatorMention, EntityResolver, RuleExtractor};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregation::aggregate_relations;
use crate::analysis::analyze_graph;
use crate::artifacts::{self, read_jsonl_lenient, write_json, write_jsonl};
use crate::extraction::{PaperInput, RelationExtractor};
use crate::parse::ParsedPaper;
use crate::scoring::{filter_graph, FilteringReport};
use crate::{BuildError, Result};

const REQUIRED_COLUMNS: [&str; 3] = ["paper_id", "title", "abstract"];

/// One row of papers.csv. Extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaperRecord {
    pub paper_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
}

impl PaperRecord {
    pub fn text(&self) -> String {
        match (self.title.trim(), self.abstract_text.trim()) {
            ("", a) => a.to_string(),
            (t, "") => t.to_string(),
            (t, a) => format!("{}. {}", t.trim_end_matches('.'), a),
        }
    }
}

#[derive(Serialize)]
struct PaperMentions<'a> {
    paper_id: &'a str,
    entity_count: usize,
    entities: &'a [RawMention],
}

#[derive(Serialize)]
struct PaperRelations<'a> {
    paper_id: &'a str,
    relation_count: usize,
    relations: &'a [RelationCandidate],
}

#[derive(Serialize)]
struct ReportFile<'a> {
    generated_at: String,
    #[serde(flatten)]
    report: &'a FilteringReport,
}

/// Counts from one build, logged by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildSummary {
    pub papers: usize,
    pub mentions: usize,
    pub entities: usize,
    pub relation_candidates: usize,
    pub relations: usize,
    pub filtered_entities: usize,
    pub filtered_relations: usize,
    pub output_dir: PathBuf,
}

pub struct BuildPipeline {
    config: BuildConfig,
}

impl BuildPipeline {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Build from `config.input_dir` into `config.output_dir`.
    pub fn run(&self) -> Result<BuildSummary> {
        self.run_in(&self.config.input_dir, &self.config.output_dir)
    }

    pub fn run_in(&self, input_dir: &Path, output_dir: &Path) -> Result<BuildSummary> {
        let papers = read_papers(&input_dir.join(artifacts::PAPERS_CSV))?;
        info!("Loaded {} papers from {}", papers.len(), input_dir.display());

        let annotated: Vec<AnnotatorMention> = read_jsonl_lenient(&input_dir.join(artifacts::MENTIONS_JSONL))?;
        let parses: Vec<ParsedPaper> = read_jsonl_lenient(&input_dir.join(artifacts::PARSES_JSONL))?;
        info!("Loaded {} annotator mentions and {} parses", annotated.len(), parses.len());

        fs::create_dir_all(output_dir).map_err(|e| BuildError::Io {
            path: output_dir.display().to_string(),
            source: e,
        })?;

        let texts: Vec<String> = papers.iter().map(PaperRecord::text).collect();

        // Mentions
        let known: HashSet<&str> = papers.iter().map(|p| p.paper_id.as_str()).collect();
        let mut by_paper: BTreeMap<&str, Vec<RawMention>> = BTreeMap::new();
        for mention in annotated {
            let raw = mention.into_raw();
            match known.get(raw.paper_id.as_str()) {
                Some(&paper_id) => by_paper.entry(paper_id).or_default().push(raw),
                None => warn!("Mention for unknown paper {} skipped", raw.paper_id),
            }
        }
        let rules = RuleExtractor::new(&self.config.space_conditions)?;
        let paper_texts: Vec<(&str, &str)> = papers
            .iter()
            .zip(&texts)
            .map(|(paper, text)| (paper.paper_id.as_str(), text.as_str()))
            .collect();
        let rule_mentions = rules.extract_batch(&paper_texts, self.config.parallel_threshold);
        for (paper, found) in papers.iter().zip(rule_mentions) {
            by_paper.entry(paper.paper_id.as_str()).or_default().extend(found);
        }

        let grouped: Vec<PaperMentions<'_>> = by_paper
            .iter()
            .map(|(paper_id, mentions)| PaperMentions { paper_id, entity_count: mentions.len(), entities: mentions })
            .collect();
        write_jsonl(&output_dir.join(artifacts::RAW_ENTITIES_PER_PAPER), &grouped)?;

        let all_mentions: Vec<RawMention> = by_paper.values().flatten().cloned().collect();
        info!("Collected {} mentions across {} papers", all_mentions.len(), by_paper.len());

        // Resolution
        let resolver = EntityResolver::new(self.config.synonyms.clone(), self.config.similarity_threshold);
        let resolution = resolver.resolve(&all_mentions);
        write_json(&output_dir.join(artifacts::ENTITIES), &resolution.entities)?;
        write_json(&output_dir.join(artifacts::PAPER_ENTITIES), &resolution.paper_entities)?;

        // Relation candidates
        let parse_index: HashMap<&str, &ParsedPaper> = parses.iter().map(|p| (p.paper_id.as_str(), p)).collect();
        let extractor = RelationExtractor::new(&resolution.entities, self.config.pattern_window)?;
        let inputs: Vec<PaperInput<'_>> = papers
            .iter()
            .zip(&texts)
            .filter_map(|(paper, text)| {
                let entities = resolution.paper_entities.get(&paper.paper_id)?;
                Some(PaperInput {
                    paper_id: &paper.paper_id,
                    text,
                    entities,
                    parse: parse_index.get(paper.paper_id.as_str()).copied(),
                })
            })
            .collect();
        let per_paper = extractor.extract_corpus(&inputs, self.config.parallel_threshold);

        let raw_relations: Vec<PaperRelations<'_>> = inputs
            .iter()
            .zip(&per_paper)
            .map(|(input, candidates)| PaperRelations {
                paper_id: input.paper_id,
                relation_count: candidates.len(),
                relations: candidates,
            })
            .collect();
        write_jsonl(&output_dir.join(artifacts::RAW_RELATIONS), &raw_relations)?;

        let candidates: Vec<RelationCandidate> = per_paper.into_iter().flatten().collect();

        // Aggregate, filter, analyze
        let relations = aggregate_relations(&candidates);
        write_json(&output_dir.join(artifacts::RELATIONS), &relations)?;

        let (filtered, report) = filter_graph(&resolution.entities, &relations, self.config.importance_threshold);
        write_json(&output_dir.join(artifacts::FILTERED_ENTITIES), &filtered.entities)?;
        write_json(&output_dir.join(artifacts::FILTERED_RELATIONS), &filtered.relations)?;
        write_json(
            &output_dir.join(artifacts::FILTERING_REPORT),
            &ReportFile { generated_at: Utc::now().to_rfc3339(), report: &report },
        )?;

        let analysis = analyze_graph(&filtered);
        write_json(&output_dir.join(artifacts::GRAPH_ANALYSIS), &analysis)?;

        let summary = BuildSummary {
            papers: papers.len(),
            mentions: all_mentions.len(),
            entities: resolution.entities.len(),
            relation_candidates: candidates.len(),
            relations: relations.len(),
            filtered_entities: filtered.entities.len(),
            filtered_relations: filtered.relations.len(),
            output_dir: output_dir.to_path_buf(),
        };
        info!(
            "Build complete: {} entities, {} relations ({} / {} after filtering) in {}",
            summary.entities,
            summary.relations,
            summary.filtered_entities,
            summary.filtered_relations,
            output_dir.display()
        );
        Ok(summary)
    }
}

/// Read papers.csv, failing on a missing file or required column.
pub fn read_papers(path: &Path) -> Result<Vec<PaperRecord>> {
    if !path.is_file() {
        return Err(BuildError::MissingInput(path.display().to_string()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(BuildError::MissingInput(format!("column '{}' in {}", column, path.display())));
        }
    }

    let mut papers = Vec::new();
    for (row, record) in reader.deserialize::<PaperRecord>().enumerate() {
        match record {
            Ok(paper) if !paper.paper_id.trim().is_empty() => papers.push(paper),
            Ok(_) => warn!("Row {} of {} has no paper_id, skipped", row + 1, path.display()),
            Err(e) => warn!("Row {} of {} is malformed, skipped: {}", row + 1, path.display(), e),
        }
    }
    Ok(papers)
}
