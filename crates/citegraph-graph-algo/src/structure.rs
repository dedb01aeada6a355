use std::collections::{HashSet, VecDeque};

use petgraph::algo::{connected_components, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

/// Directed density `m / (n * (n - 1))`; 0 when fewer than two nodes.
pub fn density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }

    let n = node_count as f64;
    edge_count as f64 / (n * (n - 1.0))
}

/// Undirected projection sharing node indices with `graph`. Reciprocal edges
/// collapse to one and self-loops are dropped.
pub fn undirected_projection<N, E>(graph: &DiGraph<N, E>) -> UnGraph<(), ()> {
    let mut projection = UnGraph::with_capacity(graph.node_count(), graph.edge_count());
    for _ in graph.node_indices() {
        projection.add_node(());
    }

    for edge in graph.edge_references() {
        let (source, target) = (edge.source(), edge.target());
        if source == target || projection.find_edge(source, target).is_some() {
            continue;
        }
        projection.add_edge(source, target, ());
    }

    projection
}

/// Longest shortest path over the projection. A disconnected projection or
/// one with fewer than two nodes reports 0.
pub fn diameter(projection: &UnGraph<(), ()>) -> usize {
    if projection.node_count() < 2 {
        return 0;
    }

    let mut longest = 0;
    for start in projection.node_indices() {
        let distances = bfs_distances(projection, start);
        for distance in distances {
            match distance {
                Some(distance) => longest = longest.max(distance),
                None => return 0,
            }
        }
    }

    longest
}

pub fn average_clustering(projection: &UnGraph<(), ()>) -> f64 {
    let node_count = projection.node_count();
    if node_count == 0 {
        return 0.0;
    }

    let neighbor_sets = projection
        .node_indices()
        .map(|node| projection.neighbors(node).collect::<HashSet<_>>())
        .collect::<Vec<_>>();

    let mut total = 0.0;
    for neighbors in &neighbor_sets {
        let degree = neighbors.len();
        if degree < 2 {
            continue;
        }

        let neighbors = neighbors.iter().copied().collect::<Vec<_>>();
        let mut links = 0usize;
        for (offset, left) in neighbors.iter().enumerate() {
            for right in &neighbors[offset + 1..] {
                if neighbor_sets[left.index()].contains(right) {
                    links += 1;
                }
            }
        }

        total += (2 * links) as f64 / (degree * (degree - 1)) as f64;
    }

    total / node_count as f64
}

pub fn strongly_connected_component_count<N, E>(graph: &DiGraph<N, E>) -> usize {
    tarjan_scc(graph).len()
}

pub fn weakly_connected_component_count<N, E>(graph: &DiGraph<N, E>) -> usize {
    connected_components(graph)
}

fn bfs_distances(projection: &UnGraph<(), ()>, start: NodeIndex) -> Vec<Option<usize>> {
    let mut distances = vec![None; projection.node_count()];
    distances[start.index()] = Some(0);

    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        let next = distances[current.index()].unwrap_or(0) + 1;
        for neighbor in projection.neighbors(current) {
            if distances[neighbor.index()].is_none() {
                distances[neighbor.index()] = Some(next);
                queue.push_back(neighbor);
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directed(node_count: usize, edges: &[(u32, u32)]) -> DiGraph<(), ()> {
        let mut graph = DiGraph::new();
        for _ in 0..node_count {
            graph.add_node(());
        }
        for (source, target) in edges {
            graph.update_edge(NodeIndex::new(*source as usize), NodeIndex::new(*target as usize), ());
        }
        graph
    }

    #[test]
    fn density_is_zero_below_two_nodes() {
        assert_eq!(density(0, 0), 0.0);
        assert_eq!(density(1, 0), 0.0);
        assert!((density(3, 2) - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn projection_collapses_reciprocal_edges_and_self_loops() {
        let graph = directed(3, &[(0, 1), (1, 0), (1, 1), (1, 2)]);
        let projection = undirected_projection(&graph);
        assert_eq!(projection.node_count(), 3);
        assert_eq!(projection.edge_count(), 2);
    }

    #[test]
    fn diameter_follows_undirected_paths() {
        let graph = directed(3, &[(0, 1), (2, 0)]);
        assert_eq!(diameter(&undirected_projection(&graph)), 2);
    }

    #[test]
    fn diameter_degrades_to_zero_when_disconnected() {
        let graph = directed(4, &[(0, 1), (2, 3)]);
        assert_eq!(diameter(&undirected_projection(&graph)), 0);
        assert_eq!(diameter(&undirected_projection(&directed(1, &[]))), 0);
    }

    #[test]
    fn clustering_counts_closed_triangles() {
        let triangle = directed(3, &[(0, 1), (1, 2), (2, 0)]);
        assert!((average_clustering(&undirected_projection(&triangle)) - 1.0).abs() < 1e-12);

        // triangle plus a pendant node on vertex 2
        let pendant = directed(4, &[(0, 1), (1, 2), (2, 0), (2, 3)]);
        let expected = (1.0 + 1.0 + 1.0 / 3.0 + 0.0) / 4.0;
        assert!((average_clustering(&undirected_projection(&pendant)) - expected).abs() < 1e-12);

        assert_eq!(average_clustering(&UnGraph::new_undirected()), 0.0);
    }

    #[test]
    fn component_counts_distinguish_strong_and_weak() {
        let graph = directed(4, &[(0, 1), (1, 0), (1, 2)]);
        assert_eq!(strongly_connected_component_count(&graph), 3);
        assert_eq!(weakly_connected_component_count(&graph), 2);
    }
}
