use std::collections::HashMap;

use citegraph_core::{GraphData, GraphEdge, GraphNode, PaperId};
use petgraph::graph::{DiGraph, NodeIndex};

/// Immutable directed citation graph built from one record batch.
///
/// Node weights are paper ids; per-node attributes live in a side table
/// indexed by `NodeIndex::index()`. Every edge endpoint is an admitted node.
#[derive(Debug, Clone, Default)]
pub struct CitationGraph {
    graph: DiGraph<PaperId, ()>,
    index: HashMap<PaperId, NodeIndex>,
    attributes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    edge_slots: HashMap<(NodeIndex, NodeIndex), usize>,
    root_doi: Option<PaperId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSummary {
    pub duplicate_nodes: usize,
    pub skipped_nodes: usize,
    pub dangling_edges: usize,
    pub duplicate_edges: usize,
}

impl CitationGraph {
    pub fn from_graph_data(data: &GraphData) -> Self {
        Self::build(&data.nodes, &data.edges, data.root_doi.clone()).0
    }

    /// Builds the graph and reports what was collapsed or dropped on the way.
    pub fn build(
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        root_doi: Option<PaperId>,
    ) -> (Self, BuildSummary) {
        let mut graph = Self {
            graph: DiGraph::with_capacity(nodes.len(), edges.len()),
            root_doi,
            ..Self::default()
        };
        let mut summary = BuildSummary::default();

        for node in nodes {
            let id = node.id.trim();
            if id.is_empty() {
                summary.skipped_nodes += 1;
                continue;
            }

            let mut node = node.clone();
            node.id = id.to_owned();
            match graph.index.get(id).copied() {
                Some(existing) => {
                    summary.duplicate_nodes += 1;
                    graph.attributes[existing.index()] = node;
                }
                None => {
                    let index = graph.graph.add_node(node.id.clone());
                    graph.index.insert(node.id.clone(), index);
                    graph.attributes.push(node);
                }
            }
        }

        for edge in edges {
            let (Some(source), Some(target)) = (
                graph.index.get(edge.from.trim()).copied(),
                graph.index.get(edge.to.trim()).copied(),
            ) else {
                summary.dangling_edges += 1;
                continue;
            };

            let mut edge = edge.clone();
            edge.from = graph.graph[source].clone();
            edge.to = graph.graph[target].clone();
            match graph.edge_slots.get(&(source, target)).copied() {
                Some(slot) => {
                    summary.duplicate_edges += 1;
                    graph.edges[slot] = edge;
                }
                None => {
                    graph.graph.add_edge(source, target, ());
                    graph.edge_slots.insert((source, target), graph.edges.len());
                    graph.edges.push(edge);
                }
            }
        }

        if summary.skipped_nodes > 0 || summary.dangling_edges > 0 {
            tracing::debug!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                skipped_nodes = summary.skipped_nodes,
                dangling_edges = summary.dangling_edges,
                "dropped records while building citation graph"
            );
        }

        (graph, summary)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn digraph(&self) -> &DiGraph<PaperId, ()> {
        &self.graph
    }

    pub fn root_doi(&self) -> Option<&str> {
        self.root_doi.as_deref()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index
            .get(id)
            .map(|index| &self.attributes[index.index()])
    }

    pub fn node_id(&self, index: NodeIndex) -> &str {
        &self.graph[index]
    }

    /// Nodes in insertion order of first appearance.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.attributes.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter()
    }

    pub fn to_graph_data(&self) -> GraphData {
        GraphData {
            nodes: self.attributes.clone(),
            edges: self.edges.clone(),
            root_doi: self.root_doi.clone(),
        }
    }

    /// Keeps nodes with a known year inside `[start, end]`.
    pub fn filter_by_year(&self, start: i32, end: i32) -> Self {
        self.retain(|node| node.year.is_some_and(|year| year >= start && year <= end))
    }

    pub fn filter_by_citation_count(&self, min_citations: u64) -> Self {
        self.retain(|node| node.citation_count >= min_citations)
    }

    fn retain(&self, keep: impl Fn(&GraphNode) -> bool) -> Self {
        let nodes = self
            .attributes
            .iter()
            .filter(|node| keep(node))
            .cloned()
            .collect::<Vec<_>>();
        Self::build(&nodes, &self.edges, self.root_doi.clone()).0
    }
}
