use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub type PaperId = String;

const LABEL_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Paper {
    pub doi: PaperId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, alias = "journal")]
    pub venue: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub citation_count: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub reference_count: u64,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSummary {
    pub doi: PaperId,
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub venue: String,
    pub citation_count: u64,
}

/// Display category of a node inside a citation neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum NodeGroup {
    Root,
    Citation,
    Reference,
    Related,
    ExpandedCitation,
    MostRelevant,
    #[default]
    Other,
}

impl NodeGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Citation => "citation",
            Self::Reference => "reference",
            Self::Related => "related",
            Self::ExpandedCitation => "expanded_citation",
            Self::MostRelevant => "most_relevant",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "root" => Self::Root,
            "citation" => Self::Citation,
            "reference" => Self::Reference,
            "related" => Self::Related,
            "expanded" | "expanded_citation" => Self::ExpandedCitation,
            "most_relevant" => Self::MostRelevant,
            _ => Self::Other,
        }
    }
}

impl From<String> for NodeGroup {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String")]
pub enum EdgeArrows {
    #[default]
    #[serde(rename = "to")]
    To,
    #[serde(rename = "none")]
    Hidden,
}

impl EdgeArrows {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::To => "to",
            Self::Hidden => "none",
        }
    }
}

impl From<String> for EdgeArrows {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "false" | "" => Self::Hidden,
            _ => Self::To,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: PaperId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub citation_count: u64,
    #[serde(default)]
    pub group: NodeGroup,
    #[serde(default, alias = "journal", skip_serializing_if = "String::is_empty")]
    pub venue: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
}

impl GraphNode {
    pub fn from_paper(paper: &Paper, group: NodeGroup, label_max_chars: usize) -> Self {
        Self {
            id: paper.doi.clone(),
            label: truncate_label(&paper.title, label_max_chars),
            title: paper.title.clone(),
            year: paper.year,
            citation_count: paper.citation_count,
            group,
            venue: paper.venue.clone(),
            keywords: paper.keywords.clone(),
            relevance_score: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: PaperId,
    pub to: PaperId,
    #[serde(default)]
    pub arrows: EdgeArrows,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub dashes: bool,
}

impl GraphEdge {
    pub fn cites(from: impl Into<PaperId>, to: impl Into<PaperId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            arrows: EdgeArrows::To,
            color: None,
            dashes: false,
        }
    }
}

/// Node/edge record batch exchanged with ingestion and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub root_doi: Option<PaperId>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordBatch {
    pub data: GraphData,
    pub skipped_nodes: usize,
    pub skipped_edges: usize,
}

impl GraphData {
    /// Parses a record batch one record at a time. Records that fail to
    /// deserialize or carry a blank id/endpoint are counted and skipped.
    pub fn from_json_lenient(raw: &str) -> Result<RecordBatch, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value_lenient(value)
    }

    pub fn from_value_lenient(value: Value) -> Result<RecordBatch, serde_json::Error> {
        let Value::Object(mut object) = value else {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "record batch must be a JSON object",
            ));
        };

        let mut batch = RecordBatch::default();
        batch.data.root_doi = object
            .remove("root_doi")
            .and_then(|value| value.as_str().map(str::trim).map(str::to_owned))
            .filter(|value| !value.is_empty());

        for item in take_array(&mut object, "nodes") {
            match serde_json::from_value::<GraphNode>(item) {
                Ok(mut node) if !node.id.trim().is_empty() => {
                    node.id = node.id.trim().to_owned();
                    batch.data.nodes.push(node);
                }
                _ => batch.skipped_nodes += 1,
            }
        }

        for item in take_array(&mut object, "edges") {
            match serde_json::from_value::<GraphEdge>(item) {
                Ok(mut edge) if !edge.from.trim().is_empty() && !edge.to.trim().is_empty() => {
                    edge.from = edge.from.trim().to_owned();
                    edge.to = edge.to.trim().to_owned();
                    batch.data.edges.push(edge);
                }
                _ => batch.skipped_edges += 1,
            }
        }

        Ok(batch)
    }
}

fn take_array(object: &mut serde_json::Map<String, Value>, key: &str) -> Vec<Value> {
    match object.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

pub fn truncate_label(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_owned();
    }

    let mut label = title.chars().take(max_chars).collect::<String>();
    label.push_str(LABEL_ELLIPSIS);
    label
}

pub fn normalize_doi(doi: &str) -> String {
    doi.trim().to_owned()
}

/// Trims keywords, drops blanks and removes case-insensitive duplicates,
/// keeping the first spelling seen.
pub fn normalize_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    keywords
        .into_iter()
        .map(|keyword| keyword.as_ref().trim().to_owned())
        .filter(|keyword| !keyword.is_empty())
        .filter(|keyword| seen.insert(keyword.to_lowercase()))
        .collect()
}
