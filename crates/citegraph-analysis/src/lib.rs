use thiserror::Error;

mod analytics;
mod builder;
mod export;
mod relevance;
mod report;

pub use analytics::{
    CentralityMeasures, CommunityPartition, GraphAnalytics, GraphStatistics, community_strategy,
};
pub use builder::{BuildSummary, CitationGraph};
pub use export::{ExportFormat, export_graph, export_graph_data};
pub use relevance::{
    MOST_RELEVANT_HIGHLIGHT, MOST_RELEVANT_LABEL_PREFIX, RankedPaper, RelevanceCandidate,
    RelevanceScorer, ScoreBreakdown, annotate_graph_relevance,
};
pub use report::{GraphReport, NeighborhoodAnalyzer, NeighborhoodReport};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("config error: {0}")]
    Config(#[from] citegraph_config::ConfigError),
    #[error("store error: {0}")]
    Store(#[from] citegraph_store::StoreError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported export format {0}")]
    UnsupportedFormat(String),
    #[error("paper not found: {0}")]
    NotFound(String),
}
