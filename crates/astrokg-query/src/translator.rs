//! Natural-language questions to structured graph queries.
//!
//! A fixed, ordered rule list; the first rule whose pattern matches the
//! lowercased query wins. Captured text becomes a bound parameter of the
//! resulting [`GraphQuery`]. A query no rule matches yields `None`.

use astrokg_common::{EntityType, RelationType};
use astrokg_kg::graph_query::DEFAULT_TOP_ENTITIES;
use astrokg_kg::{GraphIntent, GraphQuery};
use regex::{Captures, Regex};
use tracing::debug;

use crate::Result;

const INFLUENCE: [RelationType; 4] = [
    RelationType::Affects,
    RelationType::Increases,
    RelationType::Decreases,
    RelationType::Induces,
];

const CAUSAL: [RelationType; 2] = [RelationType::Causes, RelationType::Induces];

type Build = fn(&Captures<'_>) -> Option<GraphQuery>;

struct Rule {
    pattern: Regex,
    build: Build,
}

/// Group `i`, trimmed and without trailing `?`, `.` or `!`.
fn capture(caps: &Captures<'_>, i: usize) -> Option<String> {
    let text = caps.get(i)?.as_str().trim().trim_end_matches(['?', '.', '!']).trim_end();
    (!text.is_empty()).then(|| text.to_string())
}

/// Singular type name for a captured word: a known type's canonical name,
/// otherwise the word with one trailing "s" removed.
fn type_name(word: &str) -> String {
    match EntityType::from_word(word) {
        Some(t) => t.as_str().to_string(),
        None => word.strip_suffix('s').unwrap_or(word).to_string(),
    }
}

fn affects(c: &Captures<'_>) -> Option<GraphQuery> {
    let entity = capture(c, 1)?;
    let description = format!("Finding what affects {}", entity);
    Some(GraphQuery::new(GraphIntent::IncomingEdges { entity, relations: INFLUENCE.to_vec() }, description))
}

fn affected_by(c: &Captures<'_>) -> Option<GraphQuery> {
    let entity = capture(c, 1)?;
    let description = format!("Finding what is affected by {}", entity);
    Some(GraphQuery::new(GraphIntent::OutgoingEdges { entity, relations: INFLUENCE.to_vec() }, description))
}

fn causes(c: &Captures<'_>) -> Option<GraphQuery> {
    let entity = capture(c, 1)?;
    let description = format!("Finding what causes {}", entity);
    Some(GraphQuery::new(GraphIntent::IncomingEdges { entity, relations: CAUSAL.to_vec() }, description))
}

fn single_relation(c: &Captures<'_>) -> Option<GraphQuery> {
    let verb = capture(c, 1)?;
    let relation = verb.parse::<RelationType>().ok()?;
    let entity = capture(c, 2)?;
    let description = format!("Finding what {} {}", verb, entity);
    Some(GraphQuery::new(GraphIntent::IncomingEdges { entity, relations: vec![relation] }, description))
}

fn all_edges(c: &Captures<'_>) -> Option<GraphQuery> {
    let entity = capture(c, 1)?;
    let description = format!("Finding all relationships for {}", entity);
    Some(GraphQuery::new(GraphIntent::AllEdges { entity }, description))
}

fn typed_neighbours(c: &Captures<'_>) -> Option<GraphQuery> {
    let entity_type = type_name(&capture(c, 1)?);
    let entity = capture(c, 2)?;
    let description = format!("Finding {} related to {}", entity_type, entity);
    Some(GraphQuery::new(GraphIntent::TypedNeighbours { entity, entity_type }, description))
}

fn top_entities(c: &Captures<'_>) -> Option<GraphQuery> {
    let limit = match c.get(1) {
        Some(n) => n.as_str().parse().ok()?,
        None => DEFAULT_TOP_ENTITIES,
    };
    let description = format!("Finding top {} entities", limit);
    Some(GraphQuery::new(GraphIntent::TopEntities { limit }, description))
}

fn entities_of_type(c: &Captures<'_>) -> Option<GraphQuery> {
    let entity_type = type_name(&capture(c, 1)?);
    let description = format!("Finding all {} entities", entity_type);
    Some(GraphQuery::new(GraphIntent::EntitiesOfType { entity_type }, description))
}

fn shortest_path(c: &Captures<'_>) -> Option<GraphQuery> {
    let from = capture(c, 1)?;
    let to = capture(c, 2)?;
    let description = format!("Finding path between {} and {}", from, to);
    Some(GraphQuery::new(GraphIntent::ShortestPath { from, to }, description))
}

fn papers_about(c: &Captures<'_>) -> Option<GraphQuery> {
    let entity = capture(c, 1)?;
    let description = format!("Finding papers about {}", entity);
    Some(GraphQuery::new(GraphIntent::PapersAbout { entity }, description))
}

/// Rules in priority order.
static RULES: &[(&str, Build)] = &[
    (r"\bwhat (?:affects|impacts|influences) (.+)", affects),
    (r"\bwhat (?:is )?affected by (.+)", affected_by),
    (r"\bwhat causes (.+)", causes),
    (r"\bwhat (increases|decreases) (.+)", single_relation),
    (r"\b(?:show|find|get) (?:relationships|relations|connections) (?:for|of) (.+)", all_edges),
    (r"\b(?:find|show|get) (\w+) (?:related to|associated with) (.+)", typed_neighbours),
    (r"\btop (\d+)? ?entities", top_entities),
    (r"\b(?:show|find|get|list) (?:all )?(\w+)", entities_of_type),
    (r"\b(?:path|connection) between (.+) and (.+)", shortest_path),
    (r"\b(?:papers|studies|research) (?:about|on|for) (.+)", papers_about),
];

/// One canonical question per rule, in rule order.
pub fn example_queries() -> Vec<&'static str> {
    vec![
        "What affects bone?",
        "What is affected by spaceflight?",
        "What causes radiation damage?",
        "What increases myc?",
        "Show relationships for microgravity",
        "Find genes related to spaceflight",
        "Show top 10 entities",
        "Show all conditions",
        "Path between spaceflight and bone",
        "Papers about radiation",
    ]
}

pub struct GraphQueryTranslator {
    rules: Vec<Rule>,
}

impl GraphQueryTranslator {
    pub fn new() -> Result<Self> {
        let rules = RULES
            .iter()
            .map(|(pattern, build)| Ok(Rule { pattern: Regex::new(pattern)?, build: *build }))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Translate a question, or `None` when no rule matches.
    pub fn translate(&self, query: &str) -> Option<GraphQuery> {
        let q = query.trim().to_lowercase();
        for (i, rule) in self.rules.iter().enumerate() {
            if let Some(caps) = rule.pattern.captures(&q) {
                if let Some(translated) = (rule.build)(&caps) {
                    debug!("'{}' matched translation rule {}", q, i + 1);
                    return Some(translated);
                }
            }
        }
        debug!("No translation rule matched '{}'", q);
        None
    }
}
