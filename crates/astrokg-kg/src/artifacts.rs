//! On-disk build artifacts: file names and JSON / JSONL helpers.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use astrokg_common::{Entity, FilteredGraph, Relation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{BuildError, Result};

pub const PAPERS_CSV: &str = "papers.csv";
pub const MENTIONS_JSONL: &str = "mentions.jsonl";
pub const PARSES_JSONL: &str = "parses.jsonl";

pub const RAW_ENTITIES_PER_PAPER: &str = "raw_entities_per_paper.jsonl";
pub const ENTITIES: &str = "entities.json";
pub const PAPER_ENTITIES: &str = "paper_entities.json";
pub const RAW_RELATIONS: &str = "raw_relations.jsonl";
pub const RELATIONS: &str = "relations.json";
pub const FILTERED_ENTITIES: &str = "filtered_entities.json";
pub const FILTERED_RELATIONS: &str = "filtered_relations.json";
pub const FILTERING_REPORT: &str = "filtering_report.json";
pub const GRAPH_ANALYSIS: &str = "graph_analysis.json";

fn io_error(path: &Path, source: std::io::Error) -> BuildError {
    BuildError::Io { path: path.display().to_string(), source }
}

/// Pretty-printed JSON document.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| io_error(path, e))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// One JSON object per line.
pub fn write_jsonl<'a, T, I>(path: &Path, records: I) -> Result<usize>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut count = 0;
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n").map_err(|e| io_error(path, e))?;
        count += 1;
    }
    writer.flush().map_err(|e| io_error(path, e))?;
    debug!("Wrote {} records to {}", count, path.display());
    Ok(count)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(BuildError::MissingInput(path.display().to_string()));
    }
    let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a JSONL file. Blank lines are ignored; malformed lines are logged and
/// skipped. A missing file yields an empty list.
pub fn read_jsonl_lenient<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        debug!("Optional input {} not present", path.display());
        return Ok(Vec::new());
    }
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut records = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| io_error(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping malformed line {} in {}: {}", line_no + 1, path.display(), e),
        }
    }
    Ok(records)
}

/// Load the filtered graph written by a build.
pub fn load_filtered_graph(dir: &Path) -> Result<FilteredGraph> {
    let entities: Vec<Entity> = read_json(&dir.join(FILTERED_ENTITIES))?;
    let relations: Vec<Relation> = read_json(&dir.join(FILTERED_RELATIONS))?;
    Ok(FilteredGraph { entities, relations })
}

/// True when both filtered artifacts exist in `dir`.
pub fn has_filtered_graph(dir: &Path) -> bool {
    dir.join(FILTERED_ENTITIES).is_file() && dir.join(FILTERED_RELATIONS).is_file()
}
