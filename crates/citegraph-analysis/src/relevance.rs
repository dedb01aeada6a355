use chrono::Datelike;
use citegraph_config::RelevanceConfig;
use citegraph_core::{GraphData, GraphNode, NodeGroup, Paper, PaperId};
use serde::{Deserialize, Serialize};

pub const CITATION_WEIGHT: f64 = 40.0;
pub const RECENCY_WEIGHT: f64 = 30.0;
pub const KEYWORD_WEIGHT: f64 = 10.0;
pub const TIER_ONE_SCORE: f64 = 20.0;
pub const TIER_TWO_SCORE: f64 = 18.0;
pub const TIER_THREE_SCORE: f64 = 15.0;
pub const DEFAULT_VENUE_SCORE: f64 = 10.0;
/// Ranked non-root nodes regrouped as `most_relevant` on a graph.
pub const MOST_RELEVANT_HIGHLIGHT: usize = 5;
pub const MOST_RELEVANT_LABEL_PREFIX: &str = "\u{2b50} ";

const CITATION_SATURATION: f64 = 100.0;
const RECENCY_SPAN_YEARS: f64 = 50.0;
const UNKNOWN_YEAR: i32 = 2000;

/// Fields the scorer reads from a paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RelevanceCandidate {
    pub doi: PaperId,
    pub title: String,
    pub year: Option<i32>,
    pub venue: String,
    pub citation_count: u64,
    pub keywords: Vec<String>,
}

impl From<&Paper> for RelevanceCandidate {
    fn from(paper: &Paper) -> Self {
        Self {
            doi: paper.doi.clone(),
            title: paper.title.clone(),
            year: paper.year,
            venue: paper.venue.clone(),
            citation_count: paper.citation_count,
            keywords: paper.keywords.clone(),
        }
    }
}

impl From<&GraphNode> for RelevanceCandidate {
    fn from(node: &GraphNode) -> Self {
        Self {
            doi: node.id.clone(),
            title: node.title.clone(),
            year: node.year,
            venue: node.venue.clone(),
            citation_count: node.citation_count,
            keywords: node.keywords.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub citation: f64,
    pub recency: f64,
    pub venue: f64,
    pub keyword: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.citation + self.recency + self.venue + self.keyword
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPaper {
    pub doi: PaperId,
    pub title: String,
    pub year: Option<i32>,
    pub venue: String,
    pub citation_count: u64,
    pub relevance_score: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    current_year: i32,
    top_n: usize,
    tier_one: Vec<String>,
    tier_two: Vec<String>,
    tier_three: Vec<String>,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new(&RelevanceConfig::default())
    }
}

impl RelevanceScorer {
    /// Uses the pinned `current_year` when configured, else the clock year.
    pub fn new(config: &RelevanceConfig) -> Self {
        Self {
            current_year: config
                .current_year
                .unwrap_or_else(|| chrono::Local::now().year()),
            top_n: config.top_n,
            tier_one: lowercased(&config.tier_one),
            tier_two: lowercased(&config.tier_two),
            tier_three: lowercased(&config.tier_three),
        }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn breakdown(
        &self,
        candidate: &RelevanceCandidate,
        reference_keywords: &[String],
    ) -> ScoreBreakdown {
        ScoreBreakdown {
            citation: self.citation_score(candidate.citation_count),
            recency: self.recency_score(candidate.year),
            venue: self.venue_score(&candidate.venue),
            keyword: keyword_score(&candidate.keywords, reference_keywords),
        }
    }

    /// Rounded total in `[0, 100]`.
    pub fn score(&self, candidate: &RelevanceCandidate, reference_keywords: &[String]) -> f64 {
        round2(self.breakdown(candidate, reference_keywords).total())
    }

    /// Scores every candidate, sorts stably by rounded score descending and
    /// keeps the top N.
    pub fn rank(
        &self,
        candidates: &[RelevanceCandidate],
        reference_keywords: &[String],
    ) -> Vec<RankedPaper> {
        let mut ranked = candidates
            .iter()
            .map(|candidate| {
                let breakdown = self.breakdown(candidate, reference_keywords);
                RankedPaper {
                    doi: candidate.doi.clone(),
                    title: candidate.title.clone(),
                    year: candidate.year,
                    venue: candidate.venue.clone(),
                    citation_count: candidate.citation_count,
                    relevance_score: round2(breakdown.total()),
                    breakdown,
                }
            })
            .collect::<Vec<_>>();

        ranked.sort_by(|left, right| right.relevance_score.total_cmp(&left.relevance_score));
        ranked.truncate(self.top_n);
        ranked
    }

    fn citation_score(&self, citation_count: u64) -> f64 {
        (citation_count as f64 / CITATION_SATURATION).min(1.0) * CITATION_WEIGHT
    }

    /// Older papers score higher; the ratio is clamped to `[0, 1]`.
    fn recency_score(&self, year: Option<i32>) -> f64 {
        let age = f64::from(self.current_year) - f64::from(year.unwrap_or(UNKNOWN_YEAR));
        (age / RECENCY_SPAN_YEARS).clamp(0.0, 1.0) * RECENCY_WEIGHT
    }

    fn venue_score(&self, venue: &str) -> f64 {
        let venue = venue.to_lowercase();
        let matches =
            |tier: &[String]| tier.iter().any(|keyword| venue.contains(keyword.as_str()));
        if matches(&self.tier_one) {
            TIER_ONE_SCORE
        } else if matches(&self.tier_two) {
            TIER_TWO_SCORE
        } else if matches(&self.tier_three) {
            TIER_THREE_SCORE
        } else {
            DEFAULT_VENUE_SCORE
        }
    }
}

fn keyword_score(paper_keywords: &[String], reference_keywords: &[String]) -> f64 {
    if paper_keywords.is_empty() || reference_keywords.is_empty() {
        return 0.0;
    }

    let paper_keywords = lowercased(paper_keywords);
    let matches = reference_keywords
        .iter()
        .map(|keyword| keyword.to_lowercase())
        .filter(|keyword| {
            paper_keywords.iter().any(|candidate| {
                candidate.contains(keyword.as_str()) || keyword.contains(candidate.as_str())
            })
        })
        .count();

    (matches as f64 / reference_keywords.len() as f64).min(1.0) * KEYWORD_WEIGHT
}

/// Writes scores onto matching nodes and regroups the `highlight`
/// best-ranked non-root nodes as `most_relevant`, starring their labels.
pub fn annotate_graph_relevance(
    data: &mut GraphData,
    ranked: &[RankedPaper],
    highlight: usize,
) {
    let root = data.root_doi.clone();
    for node in &mut data.nodes {
        if let Some(entry) = ranked.iter().find(|entry| entry.doi == node.id) {
            node.relevance_score = Some(entry.relevance_score);
        }
    }

    let highlighted = ranked
        .iter()
        .filter(|entry| root.as_deref() != Some(entry.doi.as_str()))
        .take(highlight);
    for entry in highlighted {
        if let Some(node) = data.nodes.iter_mut().find(|node| node.id == entry.doi) {
            node.group = NodeGroup::MostRelevant;
            if !node.label.starts_with(MOST_RELEVANT_LABEL_PREFIX) {
                node.label.insert_str(0, MOST_RELEVANT_LABEL_PREFIX);
            }
        }
    }
}

fn lowercased(values: &[String]) -> Vec<String> {
    values.iter().map(|value| value.to_lowercase()).collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
