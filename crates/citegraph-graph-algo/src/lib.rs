mod centrality;
mod community;
mod structure;

pub use centrality::{
    PageRankOptions, PageRankOutcome, betweenness_centrality, in_degree_centrality,
    out_degree_centrality, page_rank,
};
pub use community::{CommunityStrategy, LabelPropagation, Louvain, renumber_communities};
pub use structure::{
    average_clustering, density, diameter, strongly_connected_component_count,
    undirected_projection, weakly_connected_component_count,
};
