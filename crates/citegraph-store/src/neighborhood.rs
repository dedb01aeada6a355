use std::collections::{BTreeMap, HashSet};

use citegraph_config::GraphConfig;
use citegraph_core::{EdgeArrows, GraphData, GraphEdge, GraphNode, NodeGroup, PaperId};
use serde::{Deserialize, Serialize};

use crate::{Store, StoreError};

const REFERENCE_EDGE_COLOR: &str = "#ff7675";
const CITATION_EDGE_COLOR: &str = "#74b9ff";
const RELATED_EDGE_COLOR: &str = "#00b894";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborhoodLimits {
    pub references: usize,
    pub citations: usize,
    pub related: usize,
    pub label_max_chars: usize,
}

impl Default for NeighborhoodLimits {
    fn default() -> Self {
        Self::from(&GraphConfig::default())
    }
}

impl From<&GraphConfig> for NeighborhoodLimits {
    fn from(config: &GraphConfig) -> Self {
        Self {
            references: config.reference_limit,
            citations: config.citation_limit,
            related: config.related_limit,
            label_max_chars: config.label_max_chars,
        }
    }
}

/// Per-year paper counts over a root's neighborhood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Timeline {
    pub years: Vec<i32>,
    pub counts: Vec<usize>,
    pub total_papers: usize,
}

struct NeighborhoodBuilder {
    data: GraphData,
    seen: HashSet<PaperId>,
    label_max_chars: usize,
}

impl NeighborhoodBuilder {
    fn push_node<S: Store + ?Sized>(
        &mut self,
        store: &S,
        doi: &str,
        group: NodeGroup,
    ) -> Result<bool, StoreError> {
        if self.seen.contains(doi) {
            return Ok(true);
        }
        let Some(paper) = store.get_paper(doi)? else {
            tracing::debug!(doi, group = group.as_str(), "neighbor missing from store");
            return Ok(false);
        };

        self.seen.insert(paper.doi.clone());
        self.data
            .nodes
            .push(GraphNode::from_paper(&paper, group, self.label_max_chars));
        Ok(true)
    }
}

/// Root paper plus its capped references, citations and related papers.
/// Neighbors absent from the store are left out along with their edges; an
/// unknown root yields an empty batch that still names the root.
pub fn citation_graph_data<S: Store + ?Sized>(
    store: &S,
    root: &str,
    limits: NeighborhoodLimits,
) -> Result<GraphData, StoreError> {
    let root = root.trim();
    let mut builder = NeighborhoodBuilder {
        data: GraphData {
            root_doi: Some(root.to_owned()),
            ..GraphData::default()
        },
        seen: HashSet::new(),
        label_max_chars: limits.label_max_chars,
    };

    if !builder.push_node(store, root, NodeGroup::Root)? {
        return Ok(builder.data);
    }

    for reference in store
        .get_references(root)?
        .into_iter()
        .take(limits.references)
    {
        if builder.push_node(store, &reference, NodeGroup::Reference)? {
            let mut edge = GraphEdge::cites(root, reference);
            edge.color = Some(REFERENCE_EDGE_COLOR.to_owned());
            builder.data.edges.push(edge);
        }
    }

    for citation in store
        .get_citations(root)?
        .into_iter()
        .take(limits.citations)
    {
        if builder.push_node(store, &citation, NodeGroup::Citation)? {
            let mut edge = GraphEdge::cites(citation, root);
            edge.color = Some(CITATION_EDGE_COLOR.to_owned());
            builder.data.edges.push(edge);
        }
    }

    for related in store.get_related(root)?.into_iter().take(limits.related) {
        if builder.seen.contains(&related) {
            continue;
        }
        if builder.push_node(store, &related, NodeGroup::Related)? {
            builder.data.edges.push(GraphEdge {
                from: root.to_owned(),
                to: related,
                arrows: EdgeArrows::Hidden,
                color: Some(RELATED_EDGE_COLOR.to_owned()),
                dashes: true,
            });
        }
    }

    tracing::debug!(
        root,
        nodes = builder.data.nodes.len(),
        edges = builder.data.edges.len(),
        "assembled citation neighborhood"
    );
    Ok(builder.data)
}

pub fn timeline<S: Store + ?Sized>(
    store: &S,
    root: &str,
    limits: NeighborhoodLimits,
) -> Result<Timeline, StoreError> {
    let data = citation_graph_data(store, root, limits)?;

    let mut by_year = BTreeMap::<i32, usize>::new();
    for year in data.nodes.iter().filter_map(|node| node.year) {
        if year > 0 {
            *by_year.entry(year).or_insert(0) += 1;
        }
    }

    Ok(Timeline {
        years: by_year.keys().copied().collect(),
        counts: by_year.values().copied().collect(),
        total_papers: data.nodes.len(),
    })
}
