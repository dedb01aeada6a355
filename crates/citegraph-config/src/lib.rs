use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CITEGRAPH_DIR_NAME: &str = ".citegraph";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DATABASE_FILE_NAME: &str = "citegraph.sqlite";

pub const DEFAULT_PAGERANK_DAMPING: f64 = 0.85;
pub const DEFAULT_PAGERANK_MAX_ITERATIONS: u32 = 100;
pub const DEFAULT_PAGERANK_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_LABEL_PROPAGATION_MAX_ITERATIONS: u32 = 100;
pub const DEFAULT_RELEVANCE_TOP_N: usize = 15;
pub const DEFAULT_MAX_NODES: usize = 5_000;
pub const DEFAULT_REFERENCE_LIMIT: usize = 15;
pub const DEFAULT_CITATION_LIMIT: usize = 15;
pub const DEFAULT_RELATED_LIMIT: usize = 10;
pub const DEFAULT_LABEL_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunityStrategyKind {
    #[default]
    Louvain,
    LabelPropagation,
}

impl CommunityStrategyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Louvain => "louvain",
            Self::LabelPropagation => "label_propagation",
        }
    }
}

impl std::str::FromStr for CommunityStrategyKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "louvain" => Ok(Self::Louvain),
            "label_propagation" => Ok(Self::LabelPropagation),
            other => Err(format!(
                "invalid community strategy '{other}', expected one of: louvain, label_propagation"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CitegraphConfig {
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub relevance: RelevanceConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_pagerank_damping")]
    pub pagerank_damping: f64,
    #[serde(default = "default_pagerank_max_iterations")]
    pub pagerank_max_iterations: u32,
    #[serde(default = "default_pagerank_tolerance")]
    pub pagerank_tolerance: f64,
    #[serde(default)]
    pub community_strategy: CommunityStrategyKind,
    #[serde(default = "default_label_propagation_max_iterations")]
    pub label_propagation_max_iterations: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            pagerank_damping: DEFAULT_PAGERANK_DAMPING,
            pagerank_max_iterations: DEFAULT_PAGERANK_MAX_ITERATIONS,
            pagerank_tolerance: DEFAULT_PAGERANK_TOLERANCE,
            community_strategy: CommunityStrategyKind::Louvain,
            label_propagation_max_iterations: DEFAULT_LABEL_PROPAGATION_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_year: Option<i32>,
    #[serde(default = "default_relevance_top_n")]
    pub top_n: usize,
    #[serde(default = "default_tier_one")]
    pub tier_one: Vec<String>,
    #[serde(default = "default_tier_two")]
    pub tier_two: Vec<String>,
    #[serde(default = "default_tier_three")]
    pub tier_three: Vec<String>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            current_year: None,
            top_n: DEFAULT_RELEVANCE_TOP_N,
            tier_one: default_tier_one(),
            tier_two: default_tier_two(),
            tier_three: default_tier_three(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Upper bound on nodes admitted into one analysis; 0 disables the cap.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    #[serde(default = "default_reference_limit")]
    pub reference_limit: usize,
    #[serde(default = "default_citation_limit")]
    pub citation_limit: usize,
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
    #[serde(default = "default_label_max_chars")]
    pub label_max_chars: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            reference_limit: DEFAULT_REFERENCE_LIMIT,
            citation_limit: DEFAULT_CITATION_LIMIT,
            related_limit: DEFAULT_RELATED_LIMIT,
            label_max_chars: DEFAULT_LABEL_MAX_CHARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub fn citegraph_dir(workspace_root: impl AsRef<Path>) -> PathBuf {
    workspace_root.as_ref().join(CITEGRAPH_DIR_NAME)
}

pub fn config_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    citegraph_dir(workspace_root).join(CONFIG_FILE_NAME)
}

pub fn database_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    citegraph_dir(workspace_root).join(DATABASE_FILE_NAME)
}

pub fn load_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<CitegraphConfig, ConfigError> {
    let path = config_path(workspace_root);
    if !path.exists() {
        return Ok(CitegraphConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<CitegraphConfig, ConfigError> {
    let parsed: CitegraphConfig = toml::from_str(raw)?;
    Ok(normalize_config(parsed))
}

pub fn ensure_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<CitegraphConfig, ConfigError> {
    let workspace_root = workspace_root.as_ref();
    fs::create_dir_all(citegraph_dir(workspace_root))?;

    let path = config_path(workspace_root);
    if path.exists() {
        return load_workspace_config(workspace_root);
    }

    let config = CitegraphConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(path, content)?;

    Ok(config)
}

/// Reports settings that are accepted but likely unintended.
pub fn validate_config(config: &CitegraphConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if let Some(year) = config.relevance.current_year {
        warnings.push(ConfigWarning {
            code: "relevance_current_year_pinned",
            message: format!(
                "relevance.current_year is pinned to {year}; recency scores will not follow the clock"
            ),
        });
    }

    if config.graph.max_nodes == 0 {
        warnings.push(ConfigWarning {
            code: "graph_max_nodes_unbounded",
            message: "graph.max_nodes = 0 disables the analysis size cap".to_owned(),
        });
    }

    let mut tiers_by_keyword = HashMap::<&str, Vec<&'static str>>::new();
    for (tier, keywords) in [
        ("tier_one", &config.relevance.tier_one),
        ("tier_two", &config.relevance.tier_two),
        ("tier_three", &config.relevance.tier_three),
    ] {
        for keyword in keywords {
            tiers_by_keyword.entry(keyword.as_str()).or_default().push(tier);
        }
    }
    let mut overlapping = tiers_by_keyword
        .into_iter()
        .filter(|(_, tiers)| tiers.len() > 1)
        .collect::<Vec<_>>();
    overlapping.sort_by(|left, right| left.0.cmp(right.0));
    for (keyword, tiers) in overlapping {
        warnings.push(ConfigWarning {
            code: "relevance_tier_overlap",
            message: format!(
                "venue keyword '{keyword}' appears in {}; the highest tier wins",
                tiers.join(", ")
            ),
        });
    }

    warnings
}

fn default_pagerank_damping() -> f64 {
    DEFAULT_PAGERANK_DAMPING
}

fn default_pagerank_max_iterations() -> u32 {
    DEFAULT_PAGERANK_MAX_ITERATIONS
}

fn default_pagerank_tolerance() -> f64 {
    DEFAULT_PAGERANK_TOLERANCE
}

fn default_label_propagation_max_iterations() -> u32 {
    DEFAULT_LABEL_PROPAGATION_MAX_ITERATIONS
}

fn default_relevance_top_n() -> usize {
    DEFAULT_RELEVANCE_TOP_N
}

fn default_tier_one() -> Vec<String> {
    vec!["nature".to_owned(), "science".to_owned()]
}

fn default_tier_two() -> Vec<String> {
    vec!["cell".to_owned(), "lancet".to_owned()]
}

fn default_tier_three() -> Vec<String> {
    vec!["pnas".to_owned(), "jama".to_owned()]
}

fn default_max_nodes() -> usize {
    DEFAULT_MAX_NODES
}

fn default_reference_limit() -> usize {
    DEFAULT_REFERENCE_LIMIT
}

fn default_citation_limit() -> usize {
    DEFAULT_CITATION_LIMIT
}

fn default_related_limit() -> usize {
    DEFAULT_RELATED_LIMIT
}

fn default_label_max_chars() -> usize {
    DEFAULT_LABEL_MAX_CHARS
}

fn normalize_keywords(input: Vec<String>) -> Vec<String> {
    let mut keywords = Vec::with_capacity(input.len());
    for keyword in input {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    keywords
}

fn normalize_config(mut config: CitegraphConfig) -> CitegraphConfig {
    let analytics = &mut config.analytics;
    if !(analytics.pagerank_damping > 0.0 && analytics.pagerank_damping < 1.0) {
        analytics.pagerank_damping = DEFAULT_PAGERANK_DAMPING;
    }
    if analytics.pagerank_max_iterations == 0 {
        analytics.pagerank_max_iterations = DEFAULT_PAGERANK_MAX_ITERATIONS;
    }
    if !(analytics.pagerank_tolerance.is_finite() && analytics.pagerank_tolerance > 0.0) {
        analytics.pagerank_tolerance = DEFAULT_PAGERANK_TOLERANCE;
    }
    if analytics.label_propagation_max_iterations == 0 {
        analytics.label_propagation_max_iterations = DEFAULT_LABEL_PROPAGATION_MAX_ITERATIONS;
    }

    let relevance = &mut config.relevance;
    if relevance.top_n == 0 {
        relevance.top_n = DEFAULT_RELEVANCE_TOP_N;
    }
    relevance.tier_one = normalize_keywords(std::mem::take(&mut relevance.tier_one));
    relevance.tier_two = normalize_keywords(std::mem::take(&mut relevance.tier_two));
    relevance.tier_three = normalize_keywords(std::mem::take(&mut relevance.tier_three));

    if config.graph.label_max_chars == 0 {
        config.graph.label_max_chars = DEFAULT_LABEL_MAX_CHARS;
    }

    config
}
