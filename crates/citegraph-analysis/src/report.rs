use std::path::{Path, PathBuf};

use citegraph_config::{CitegraphConfig, load_workspace_config};
use citegraph_core::{GraphData, PaperId};
use citegraph_store::{
    NeighborhoodLimits, RelatedPapers, SqliteStore, Store, citation_graph_data,
};
use serde::{Deserialize, Serialize};

use crate::AnalysisError;
use crate::analytics::{CentralityMeasures, CommunityPartition, GraphAnalytics, GraphStatistics};
use crate::builder::CitationGraph;
use crate::relevance::{
    MOST_RELEVANT_HIGHLIGHT, RankedPaper, RelevanceCandidate, RelevanceScorer,
    annotate_graph_relevance,
};

/// Analytics over one built graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphReport {
    pub statistics: GraphStatistics,
    pub centrality: CentralityMeasures,
    pub communities: CommunityPartition,
    pub relevance: Vec<RankedPaper>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodReport {
    pub root_doi: PaperId,
    pub statistics: GraphStatistics,
    pub centrality: CentralityMeasures,
    pub communities: CommunityPartition,
    pub relevance: Vec<RankedPaper>,
    pub related: RelatedPapers,
    /// Neighborhood with relevance scores and `most_relevant` groups applied.
    pub graph: GraphData,
}

pub struct NeighborhoodAnalyzer {
    workspace: PathBuf,
    config: CitegraphConfig,
}

impl NeighborhoodAnalyzer {
    pub fn new(workspace: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let workspace = workspace.as_ref().to_path_buf();
        let config = load_workspace_config(&workspace)?;
        Ok(Self { workspace, config })
    }

    pub fn with_config(workspace: impl AsRef<Path>, config: CitegraphConfig) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn config(&self) -> &CitegraphConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Stored neighborhood of `root`, capped at `graph.max_nodes`.
    pub fn neighborhood(&self, root: &str) -> Result<GraphData, AnalysisError> {
        let store = SqliteStore::open(&self.workspace)?;
        let mut data = citation_graph_data(
            &store,
            root,
            NeighborhoodLimits::from(&self.config.graph),
        )?;
        if data.nodes.is_empty() {
            return Err(AnalysisError::NotFound(root.trim().to_owned()));
        }

        self.apply_node_cap(&mut data);
        Ok(data)
    }

    pub fn report(&self, root: &str) -> Result<NeighborhoodReport, AnalysisError> {
        let root = root.trim();
        let mut data = self.neighborhood(root)?;

        let store = SqliteStore::open(&self.workspace)?;
        let mut candidates = Vec::with_capacity(data.nodes.len());
        for node in &data.nodes {
            let candidate = match store.get_paper(&node.id)? {
                Some(paper) => RelevanceCandidate::from(&paper),
                None => RelevanceCandidate::from(node),
            };
            candidates.push(candidate);
        }
        let reference_keywords = store.get_keywords(root)?;
        let related = store.related_papers_detail(root)?;

        let graph = CitationGraph::from_graph_data(&data);
        let analysis = self.analyze(&graph, &candidates, &reference_keywords);
        annotate_graph_relevance(&mut data, &analysis.relevance, MOST_RELEVANT_HIGHLIGHT);

        tracing::info!(
            root,
            nodes = analysis.statistics.total_nodes,
            edges = analysis.statistics.total_edges,
            communities = analysis.communities.count,
            "built neighborhood report"
        );

        Ok(NeighborhoodReport {
            root_doi: root.to_owned(),
            statistics: analysis.statistics,
            centrality: analysis.centrality,
            communities: analysis.communities,
            relevance: analysis.relevance,
            related,
            graph: data,
        })
    }

    /// Runs every analytics pass over `graph` and ranks `candidates`.
    pub fn analyze(
        &self,
        graph: &CitationGraph,
        candidates: &[RelevanceCandidate],
        reference_keywords: &[String],
    ) -> GraphReport {
        let analytics = GraphAnalytics::new(self.config.analytics.clone());
        let scorer = RelevanceScorer::new(&self.config.relevance);
        GraphReport {
            statistics: analytics.statistics(graph),
            centrality: analytics.centrality(graph),
            communities: analytics.communities(graph),
            relevance: scorer.rank(candidates, reference_keywords),
        }
    }

    /// Truncates `data` to the configured node cap. Edges touching removed
    /// nodes are dropped later by the graph builder.
    pub fn apply_node_cap(&self, data: &mut GraphData) {
        let cap = self.config.graph.max_nodes;
        if cap == 0 || data.nodes.len() <= cap {
            return;
        }

        tracing::warn!(
            nodes = data.nodes.len(),
            max_nodes = cap,
            "neighborhood exceeds graph.max_nodes, truncating"
        );
        data.nodes.truncate(cap);
    }
}
