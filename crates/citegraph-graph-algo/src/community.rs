use std::collections::{BTreeMap, HashMap};

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

const LOUVAIN_MAX_LEVELS: usize = 32;
const LOUVAIN_MAX_SWEEPS: usize = 100;
const GAIN_EPSILON: f64 = 1e-12;

/// Partitions an undirected projection into communities. The returned vector
/// holds one community id per node index.
pub trait CommunityStrategy {
    fn name(&self) -> &'static str;
    fn detect(&self, projection: &UnGraph<(), ()>) -> Vec<usize>;
}

/// Multi-level modularity optimization: local moving followed by
/// aggregation until no node changes community.
#[derive(Debug, Clone, Copy, Default)]
pub struct Louvain;

#[derive(Debug, Clone, Copy)]
pub struct LabelPropagation {
    pub max_iterations: u32,
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self {
            max_iterations: 100,
        }
    }
}

/// Renumbers labels to `0..k` in order of first appearance.
pub fn renumber_communities(labels: &[usize]) -> Vec<usize> {
    let mut mapping = HashMap::new();
    labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect()
}

type WeightedAdjacency = Vec<BTreeMap<usize, f64>>;

impl CommunityStrategy for Louvain {
    fn name(&self) -> &'static str {
        "louvain"
    }

    fn detect(&self, projection: &UnGraph<(), ()>) -> Vec<usize> {
        let node_count = projection.node_count();
        let mut adjacency: WeightedAdjacency = vec![BTreeMap::new(); node_count];
        for edge in projection.edge_references() {
            let (left, right) = (edge.source().index(), edge.target().index());
            *adjacency[left].entry(right).or_insert(0.0) += 1.0;
            *adjacency[right].entry(left).or_insert(0.0) += 1.0;
        }

        let mut membership = (0..node_count).collect::<Vec<_>>();
        for _ in 0..LOUVAIN_MAX_LEVELS {
            let Some(assignment) = louvain_local_moving(&adjacency) else {
                break;
            };

            let assignment = renumber_communities(&assignment);
            let community_count = assignment.iter().copied().max().map_or(0, |max| max + 1);
            for community in &mut membership {
                *community = assignment[*community];
            }
            adjacency = aggregate(&adjacency, &assignment, community_count);
        }

        renumber_communities(&membership)
    }
}

/// Returns the improved assignment, or `None` when no node moved.
fn louvain_local_moving(adjacency: &WeightedAdjacency) -> Option<Vec<usize>> {
    let node_count = adjacency.len();
    let degrees = adjacency
        .iter()
        .map(|neighbors| neighbors.values().sum::<f64>())
        .collect::<Vec<_>>();
    let total_weight = degrees.iter().sum::<f64>();
    if total_weight <= 0.0 {
        return None;
    }

    let mut community = (0..node_count).collect::<Vec<_>>();
    let mut community_totals = degrees.clone();
    let mut improved = false;

    for _ in 0..LOUVAIN_MAX_SWEEPS {
        let mut moved = false;
        for node in 0..node_count {
            let current = community[node];
            let degree = degrees[node];

            let mut links = BTreeMap::<usize, f64>::new();
            for (neighbor, weight) in &adjacency[node] {
                if *neighbor != node {
                    *links.entry(community[*neighbor]).or_insert(0.0) += weight;
                }
            }

            community_totals[current] -= degree;
            let mut best = current;
            let mut best_gain = links.get(&current).copied().unwrap_or(0.0)
                - community_totals[current] * degree / total_weight;
            for (candidate, weight) in &links {
                let gain = weight - community_totals[*candidate] * degree / total_weight;
                if gain > best_gain + GAIN_EPSILON {
                    best = *candidate;
                    best_gain = gain;
                }
            }
            community_totals[best] += degree;
            community[node] = best;

            if best != current {
                moved = true;
                improved = true;
            }
        }

        if !moved {
            break;
        }
    }

    improved.then_some(community)
}

fn aggregate(
    adjacency: &WeightedAdjacency,
    assignment: &[usize],
    community_count: usize,
) -> WeightedAdjacency {
    let mut aggregated: WeightedAdjacency = vec![BTreeMap::new(); community_count];
    for (node, neighbors) in adjacency.iter().enumerate() {
        let from = assignment[node];
        for (neighbor, weight) in neighbors {
            *aggregated[from]
                .entry(assignment[*neighbor])
                .or_insert(0.0) += weight;
        }
    }
    aggregated
}

impl CommunityStrategy for LabelPropagation {
    fn name(&self) -> &'static str {
        "label_propagation"
    }

    /// Asynchronous propagation in node-index order. Ties keep the current
    /// label when it is among the most frequent, else take the smallest.
    fn detect(&self, projection: &UnGraph<(), ()>) -> Vec<usize> {
        let mut labels = (0..projection.node_count()).collect::<Vec<_>>();

        for _ in 0..self.max_iterations {
            let mut changed = false;
            for node in projection.node_indices() {
                let mut counts = BTreeMap::<usize, usize>::new();
                for neighbor in projection.neighbors(node) {
                    *counts.entry(labels[neighbor.index()]).or_insert(0) += 1;
                }
                let Some(max_count) = counts.values().copied().max() else {
                    continue;
                };

                let current = labels[node.index()];
                if counts.get(&current) == Some(&max_count) {
                    continue;
                }
                if let Some((label, _)) = counts.iter().find(|(_, count)| **count == max_count) {
                    labels[node.index()] = *label;
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        renumber_communities(&labels)
    }
}

#[cfg(test)]
mod tests {
    use petgraph::graph::NodeIndex;

    use super::*;

    fn undirected(node_count: usize, edges: &[(usize, usize)]) -> UnGraph<(), ()> {
        let mut graph = UnGraph::new_undirected();
        for _ in 0..node_count {
            graph.add_node(());
        }
        for (left, right) in edges {
            graph.add_edge(NodeIndex::new(*left), NodeIndex::new(*right), ());
        }
        graph
    }

    fn clique_edges(nodes: &[usize]) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (offset, left) in nodes.iter().enumerate() {
            for right in &nodes[offset + 1..] {
                edges.push((*left, *right));
            }
        }
        edges
    }

    #[test]
    fn renumber_uses_first_appearance_order() {
        assert_eq!(renumber_communities(&[7, 7, 3, 9, 3]), vec![0, 0, 1, 2, 1]);
    }

    #[test]
    fn louvain_separates_bridged_cliques() {
        let mut edges = clique_edges(&[0, 1, 2, 3]);
        edges.extend(clique_edges(&[4, 5, 6, 7]));
        edges.push((3, 4));
        let graph = undirected(8, &edges);

        let communities = Louvain.detect(&graph);
        assert_eq!(communities, vec![0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn louvain_keeps_isolated_nodes_apart() {
        let communities = Louvain.detect(&undirected(3, &[]));
        assert_eq!(communities, vec![0, 1, 2]);
        assert!(Louvain.detect(&undirected(0, &[])).is_empty());
    }

    #[test]
    fn label_propagation_groups_disconnected_cliques() {
        let mut edges = clique_edges(&[0, 1, 2]);
        edges.extend(clique_edges(&[3, 4, 5]));
        let graph = undirected(7, &edges);

        let communities = LabelPropagation::default().detect(&graph);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_eq!(communities[4], communities[5]);
        assert_ne!(communities[0], communities[3]);
        assert_ne!(communities[6], communities[0]);
        assert_ne!(communities[6], communities[3]);
    }
}
