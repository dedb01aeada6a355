use std::collections::VecDeque;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankOptions {
    pub damping: f64,
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for PageRankOptions {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageRankOutcome {
    pub scores: Vec<f64>,
    pub iterations: u32,
    pub converged: bool,
}

pub fn in_degree_centrality<N, E>(graph: &DiGraph<N, E>) -> Vec<f64> {
    degree_centrality(graph, Direction::Incoming)
}

pub fn out_degree_centrality<N, E>(graph: &DiGraph<N, E>) -> Vec<f64> {
    degree_centrality(graph, Direction::Outgoing)
}

fn degree_centrality<N, E>(graph: &DiGraph<N, E>, direction: Direction) -> Vec<f64> {
    let node_count = graph.node_count();
    if node_count <= 1 {
        return vec![1.0; node_count];
    }

    let scale = 1.0 / (node_count - 1) as f64;
    graph
        .node_indices()
        .map(|node| graph.edges_directed(node, direction).count() as f64 * scale)
        .collect()
}

/// Brandes betweenness over directed shortest paths, normalized by
/// `1 / ((n - 1) * (n - 2))` when the graph has more than two nodes.
pub fn betweenness_centrality<N, E>(graph: &DiGraph<N, E>) -> Vec<f64> {
    let node_count = graph.node_count();
    let mut betweenness = vec![0.0; node_count];

    for source in graph.node_indices() {
        let mut stack = Vec::with_capacity(node_count);
        let mut predecessors: Vec<Vec<NodeIndex>> = vec![Vec::new(); node_count];
        let mut path_counts = vec![0.0f64; node_count];
        let mut distances: Vec<Option<usize>> = vec![None; node_count];

        path_counts[source.index()] = 1.0;
        distances[source.index()] = Some(0);

        let mut queue = VecDeque::from([source]);
        while let Some(current) = queue.pop_front() {
            stack.push(current);
            let next = distances[current.index()].unwrap_or(0) + 1;
            for neighbor in graph.neighbors_directed(current, Direction::Outgoing) {
                if distances[neighbor.index()].is_none() {
                    distances[neighbor.index()] = Some(next);
                    queue.push_back(neighbor);
                }
                if distances[neighbor.index()] == Some(next) {
                    path_counts[neighbor.index()] += path_counts[current.index()];
                    predecessors[neighbor.index()].push(current);
                }
            }
        }

        let mut dependency = vec![0.0f64; node_count];
        while let Some(node) = stack.pop() {
            for predecessor in &predecessors[node.index()] {
                dependency[predecessor.index()] += path_counts[predecessor.index()]
                    / path_counts[node.index()]
                    * (1.0 + dependency[node.index()]);
            }
            if node != source {
                betweenness[node.index()] += dependency[node.index()];
            }
        }
    }

    if node_count > 2 {
        let scale = 1.0 / ((node_count - 1) * (node_count - 2)) as f64;
        for score in &mut betweenness {
            *score *= scale;
        }
    }

    betweenness
}

/// Power-iteration PageRank with uniform teleport and dangling mass spread
/// uniformly. Convergence is an L1 change below `node_count * tolerance`.
pub fn page_rank<N, E>(graph: &DiGraph<N, E>, options: PageRankOptions) -> PageRankOutcome {
    let node_count = graph.node_count();
    if node_count == 0 {
        return PageRankOutcome {
            scores: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    let uniform = 1.0 / node_count as f64;
    let damping = options.damping;
    let out_degrees = graph
        .node_indices()
        .map(|node| graph.edges_directed(node, Direction::Outgoing).count())
        .collect::<Vec<_>>();

    let mut scores = vec![uniform; node_count];
    for iteration in 1..=options.max_iterations {
        let previous = scores;
        let dangling_mass = previous
            .iter()
            .zip(&out_degrees)
            .filter(|(_, degree)| **degree == 0)
            .map(|(score, _)| *score)
            .sum::<f64>();

        let base = (damping * dangling_mass + (1.0 - damping)) * uniform;
        scores = vec![base; node_count];
        for node in graph.node_indices() {
            let degree = out_degrees[node.index()];
            if degree == 0 {
                continue;
            }
            let share = damping * previous[node.index()] / degree as f64;
            for neighbor in graph.neighbors_directed(node, Direction::Outgoing) {
                scores[neighbor.index()] += share;
            }
        }

        let change = scores
            .iter()
            .zip(&previous)
            .map(|(current, last)| (current - last).abs())
            .sum::<f64>();
        if change < node_count as f64 * options.tolerance {
            return PageRankOutcome {
                scores,
                iterations: iteration,
                converged: true,
            };
        }
    }

    PageRankOutcome {
        scores,
        iterations: options.max_iterations,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directed(node_count: usize, edges: &[(usize, usize)]) -> DiGraph<(), ()> {
        let mut graph = DiGraph::new();
        for _ in 0..node_count {
            graph.add_node(());
        }
        for (source, target) in edges {
            graph.update_edge(NodeIndex::new(*source), NodeIndex::new(*target), ());
        }
        graph
    }

    #[test]
    fn degree_centrality_normalizes_by_n_minus_one() {
        // A=0, B=1, C=2 with A->B and C->A
        let graph = directed(3, &[(0, 1), (2, 0)]);
        assert_eq!(in_degree_centrality(&graph), vec![0.5, 0.5, 0.0]);
        assert_eq!(out_degree_centrality(&graph), vec![0.5, 0.0, 0.5]);
        assert_eq!(in_degree_centrality(&directed(1, &[])), vec![1.0]);
        assert!(in_degree_centrality(&directed(0, &[])).is_empty());
    }

    #[test]
    fn betweenness_scores_the_bridge_of_a_chain() {
        let graph = directed(3, &[(0, 1), (1, 2)]);
        let scores = betweenness_centrality(&graph);
        assert_eq!(scores[0], 0.0);
        assert!((scores[1] - 0.5).abs() < 1e-12);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn betweenness_splits_credit_across_equal_paths() {
        // 0 -> {1, 2} -> 3
        let graph = directed(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let scores = betweenness_centrality(&graph);
        let scale = 1.0 / 6.0;
        assert!((scores[1] - 0.5 * scale).abs() < 1e-12);
        assert!((scores[2] - 0.5 * scale).abs() < 1e-12);
    }

    #[test]
    fn page_rank_sums_to_one_and_favors_cited_nodes() {
        let graph = directed(4, &[(0, 1), (1, 2), (3, 1)]);
        let outcome = page_rank(&graph, PageRankOptions::default());
        assert!(outcome.converged);
        let total = outcome.scores.iter().sum::<f64>();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(outcome.scores[1] > outcome.scores[0]);
        assert!(outcome.scores[1] > outcome.scores[3]);
    }

    #[test]
    fn page_rank_is_uniform_for_isolated_nodes() {
        let outcome = page_rank(&directed(4, &[]), PageRankOptions::default());
        assert!(outcome.converged);
        for score in outcome.scores {
            assert!((score - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn page_rank_reports_non_convergence() {
        let graph = directed(2, &[(0, 1), (1, 0), (0, 0)]);
        let outcome = page_rank(
            &graph,
            PageRankOptions {
                damping: 0.85,
                max_iterations: 1,
                tolerance: 1e-12,
            },
        );
        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 1);
    }
}
