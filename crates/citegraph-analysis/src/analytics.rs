use std::collections::BTreeMap;

use citegraph_config::{AnalyticsConfig, CommunityStrategyKind};
use citegraph_core::PaperId;
use citegraph_graph_algo::{
    CommunityStrategy, LabelPropagation, Louvain, PageRankOptions, average_clustering,
    betweenness_centrality, density, diameter, in_degree_centrality, out_degree_centrality,
    page_rank, strongly_connected_component_count, undirected_projection,
    weakly_connected_component_count,
};
use serde::{Deserialize, Serialize};

use crate::builder::CitationGraph;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GraphStatistics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub density: f64,
    pub diameter: usize,
    pub avg_clustering: f64,
    /// Strongly connected components of the directed graph.
    pub connected_components: usize,
    pub weak_components: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CentralityMeasures {
    pub in_degree: BTreeMap<PaperId, f64>,
    pub out_degree: BTreeMap<PaperId, f64>,
    pub betweenness: BTreeMap<PaperId, f64>,
    pub pagerank: BTreeMap<PaperId, f64>,
    pub pagerank_converged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CommunityPartition {
    pub strategy: String,
    pub assignments: BTreeMap<PaperId, usize>,
    /// Member ids per community, indexed by community id, each list sorted.
    pub groups: Vec<Vec<PaperId>>,
    pub count: usize,
}

pub fn community_strategy(config: &AnalyticsConfig) -> Box<dyn CommunityStrategy> {
    match config.community_strategy {
        CommunityStrategyKind::Louvain => Box::new(Louvain),
        CommunityStrategyKind::LabelPropagation => Box::new(LabelPropagation {
            max_iterations: config.label_propagation_max_iterations,
        }),
    }
}

/// Statistics, centrality and communities over one graph snapshot.
#[derive(Debug, Clone, Default)]
pub struct GraphAnalytics {
    config: AnalyticsConfig,
}

impl GraphAnalytics {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn statistics(&self, graph: &CitationGraph) -> GraphStatistics {
        if graph.is_empty() {
            return GraphStatistics::default();
        }

        let digraph = graph.digraph();
        let projection = undirected_projection(digraph);
        GraphStatistics {
            total_nodes: graph.node_count(),
            total_edges: graph.edge_count(),
            density: round4(density(graph.node_count(), graph.edge_count())),
            diameter: diameter(&projection),
            avg_clustering: round4(average_clustering(&projection)),
            connected_components: strongly_connected_component_count(digraph),
            weak_components: weakly_connected_component_count(digraph),
        }
    }

    pub fn centrality(&self, graph: &CitationGraph) -> CentralityMeasures {
        if graph.is_empty() {
            return CentralityMeasures {
                pagerank_converged: true,
                ..CentralityMeasures::default()
            };
        }

        let digraph = graph.digraph();
        let outcome = page_rank(
            digraph,
            PageRankOptions {
                damping: self.config.pagerank_damping,
                max_iterations: self.config.pagerank_max_iterations,
                tolerance: self.config.pagerank_tolerance,
            },
        );
        let pagerank = if outcome.converged {
            outcome.scores
        } else {
            tracing::warn!(
                nodes = graph.node_count(),
                iterations = outcome.iterations,
                "pagerank did not converge, falling back to uniform scores"
            );
            vec![1.0 / graph.node_count() as f64; graph.node_count()]
        };

        CentralityMeasures {
            in_degree: keyed_scores(graph, in_degree_centrality(digraph)),
            out_degree: keyed_scores(graph, out_degree_centrality(digraph)),
            betweenness: keyed_scores(graph, betweenness_centrality(digraph)),
            pagerank: keyed_scores(graph, pagerank),
            pagerank_converged: outcome.converged,
        }
    }

    pub fn communities(&self, graph: &CitationGraph) -> CommunityPartition {
        let strategy = community_strategy(&self.config);
        let mut partition = CommunityPartition {
            strategy: strategy.name().to_owned(),
            ..CommunityPartition::default()
        };
        if graph.is_empty() {
            return partition;
        }

        let projection = undirected_projection(graph.digraph());
        let labels = strategy.detect(&projection);
        partition.count = labels.iter().copied().max().map_or(0, |max| max + 1);
        partition.groups = vec![Vec::new(); partition.count];
        for index in graph.digraph().node_indices() {
            let id = graph.node_id(index).to_owned();
            let community = labels[index.index()];
            partition.groups[community].push(id.clone());
            partition.assignments.insert(id, community);
        }
        for members in &mut partition.groups {
            members.sort();
        }

        tracing::debug!(
            strategy = partition.strategy.as_str(),
            communities = partition.count,
            "detected communities"
        );
        partition
    }
}

fn keyed_scores(graph: &CitationGraph, scores: Vec<f64>) -> BTreeMap<PaperId, f64> {
    graph
        .digraph()
        .node_indices()
        .zip(scores)
        .map(|(index, score)| (graph.node_id(index).to_owned(), score))
        .collect()
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use citegraph_core::{GraphData, GraphEdge, GraphNode, NodeGroup};

    use super::*;

    fn node(id: &str, year: i32, citations: u64) -> GraphNode {
        GraphNode {
            id: id.to_owned(),
            label: id.to_owned(),
            title: id.to_owned(),
            year: Some(year),
            citation_count: citations,
            group: NodeGroup::Other,
            venue: String::new(),
            keywords: Vec::new(),
            relevance_score: None,
        }
    }

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> CitationGraph {
        CitationGraph::from_graph_data(&GraphData {
            nodes: nodes.iter().map(|id| node(id, 2020, 0)).collect(),
            edges: edges
                .iter()
                .map(|(from, to)| GraphEdge::cites(*from, *to))
                .collect(),
            root_doi: None,
        })
    }

    fn sample() -> CitationGraph {
        CitationGraph::from_graph_data(&GraphData {
            nodes: vec![node("A", 2020, 10), node("B", 2019, 15), node("C", 2021, 8)],
            edges: vec![GraphEdge::cites("A", "B"), GraphEdge::cites("C", "A")],
            root_doi: Some("A".to_owned()),
        })
    }

    #[test]
    fn statistics_match_the_three_paper_example() {
        let stats = GraphAnalytics::default().statistics(&sample());
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.total_edges, 2);
        assert_eq!(stats.density, 0.3333);
        assert_eq!(stats.diameter, 2);
        assert_eq!(stats.avg_clustering, 0.0);
        assert_eq!(stats.connected_components, 3);
        assert_eq!(stats.weak_components, 1);

        let split = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "a")]);
        let stats = GraphAnalytics::default().statistics(&split);
        assert_eq!(stats.connected_components, 3);
        assert_eq!(stats.weak_components, 3);
    }

    #[test]
    fn empty_graph_yields_zeros_and_empty_maps() {
        let analytics = GraphAnalytics::default();
        let empty = CitationGraph::default();
        assert_eq!(analytics.statistics(&empty), GraphStatistics::default());

        let centrality = analytics.centrality(&empty);
        assert!(centrality.pagerank.is_empty());
        assert!(centrality.in_degree.is_empty());

        let partition = analytics.communities(&empty);
        assert_eq!(partition.count, 0);
        assert!(partition.assignments.is_empty());
    }

    #[test]
    fn centrality_is_keyed_by_paper_id() {
        let centrality = GraphAnalytics::default().centrality(&sample());
        assert_eq!(centrality.in_degree.get("A"), Some(&0.5));
        assert_eq!(centrality.in_degree.get("C"), Some(&0.0));
        assert_eq!(centrality.out_degree.get("C"), Some(&0.5));
        assert!(centrality.betweenness["A"] > 0.0);

        let total = centrality.pagerank.values().sum::<f64>();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(centrality.pagerank_converged);
    }

    #[test]
    fn unconverged_pagerank_falls_back_to_uniform() {
        let config = AnalyticsConfig {
            pagerank_max_iterations: 1,
            pagerank_tolerance: 1e-15,
            ..AnalyticsConfig::default()
        };
        let centrality = GraphAnalytics::new(config).centrality(&sample());
        assert!(!centrality.pagerank_converged);
        for score in centrality.pagerank.values() {
            assert!((score - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn communities_follow_configured_strategy() {
        let graph = graph(
            &["a", "b", "c", "d", "e", "f"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("d", "e"),
                ("e", "f"),
                ("f", "d"),
                ("c", "d"),
            ],
        );

        let louvain = GraphAnalytics::default().communities(&graph);
        assert_eq!(louvain.strategy, "louvain");
        assert_eq!(louvain.count, 2);
        assert_eq!(
            louvain.groups,
            vec![
                vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
                vec!["d".to_owned(), "e".to_owned(), "f".to_owned()],
            ]
        );
        assert_eq!(louvain.assignments["a"], 0);
        assert_eq!(louvain.assignments["f"], 1);

        let config = AnalyticsConfig {
            community_strategy: CommunityStrategyKind::LabelPropagation,
            ..AnalyticsConfig::default()
        };
        let propagated = GraphAnalytics::new(config).communities(&graph);
        assert_eq!(propagated.strategy, "label_propagation");
        assert_eq!(propagated.assignments.len(), 6);
        assert_eq!(propagated.assignments["a"], 0);
    }
}
