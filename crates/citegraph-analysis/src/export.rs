use std::str::FromStr;

use citegraph_core::GraphData;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;
use crate::builder::CitationGraph;

const NODE_HEADER: [&str; 7] = [
    "id",
    "label",
    "title",
    "year",
    "citation_count",
    "group",
    "relevance_score",
];
const EDGE_HEADER: [&str; 5] = ["from", "to", "arrows", "color", "dashes"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AnalysisError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(AnalysisError::UnsupportedFormat(format!(
                "'{other}', expected one of: json, csv"
            ))),
        }
    }
}

/// Serializes exactly the admitted nodes and edges of `graph`.
pub fn export_graph(graph: &CitationGraph, format: ExportFormat) -> Result<String, AnalysisError> {
    export_graph_data(&graph.to_graph_data(), format)
}

pub fn export_graph_data(data: &GraphData, format: ExportFormat) -> Result<String, AnalysisError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        ExportFormat::Csv => export_csv(data),
    }
}

/// `# Nodes` table, a blank line, then the `# Edges` table.
fn export_csv(data: &GraphData) -> Result<String, AnalysisError> {
    let mut nodes = csv::Writer::from_writer(Vec::new());
    nodes.write_record(NODE_HEADER)?;
    for node in &data.nodes {
        nodes.write_record([
            node.id.clone(),
            node.label.clone(),
            node.title.clone(),
            node.year.map(|year| year.to_string()).unwrap_or_default(),
            node.citation_count.to_string(),
            node.group.as_str().to_owned(),
            node.relevance_score
                .map(|score| score.to_string())
                .unwrap_or_default(),
        ])?;
    }

    let mut edges = csv::Writer::from_writer(Vec::new());
    edges.write_record(EDGE_HEADER)?;
    for edge in &data.edges {
        edges.write_record([
            edge.from.as_str(),
            edge.to.as_str(),
            edge.arrows.as_str(),
            edge.color.as_deref().unwrap_or_default(),
            if edge.dashes { "true" } else { "false" },
        ])?;
    }

    let nodes = finish(nodes)?;
    let edges = finish(edges)?;
    Ok(format!("# Nodes\n{nodes}\n# Edges\n{edges}"))
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, AnalysisError> {
    let bytes = writer
        .into_inner()
        .map_err(|err| AnalysisError::Io(err.into_error()))?;
    String::from_utf8(bytes).map_err(|err| {
        AnalysisError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

#[cfg(test)]
mod tests {
    use citegraph_core::{GraphEdge, GraphNode, NodeGroup};

    use super::*;

    fn graph() -> CitationGraph {
        let node = |id: &str, title: &str, group| GraphNode {
            id: id.to_owned(),
            label: title.to_owned(),
            title: title.to_owned(),
            year: Some(2020),
            citation_count: 3,
            group,
            venue: String::new(),
            keywords: Vec::new(),
            relevance_score: None,
        };
        let mut edge = GraphEdge::cites("10.1/a", "10.1/b");
        edge.color = Some("#ff7675".to_owned());

        CitationGraph::from_graph_data(&GraphData {
            nodes: vec![
                node("10.1/a", "Graphs, and more", NodeGroup::Root),
                node("10.1/b", "Plain", NodeGroup::Reference),
            ],
            edges: vec![edge, GraphEdge::cites("10.1/a", "10.1/missing")],
            root_doi: Some("10.1/a".to_owned()),
        })
    }

    #[test]
    fn json_export_round_trips_the_built_graph() {
        let raw = export_graph(&graph(), ExportFormat::Json).expect("export json");
        let parsed: GraphData = serde_json::from_str(&raw).expect("parse export");
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.edges.len(), 1);
        assert_eq!(parsed.root_doi.as_deref(), Some("10.1/a"));
        assert!(raw.contains('\n'));
    }

    #[test]
    fn csv_export_has_node_and_edge_sections() {
        let raw = export_graph(&graph(), ExportFormat::Csv).expect("export csv");
        let expected = "# Nodes\n\
            id,label,title,year,citation_count,group,relevance_score\n\
            10.1/a,\"Graphs, and more\",\"Graphs, and more\",2020,3,root,\n\
            10.1/b,Plain,Plain,2020,3,reference,\n\
            \n\
            # Edges\n\
            from,to,arrows,color,dashes\n\
            10.1/a,10.1/b,to,#ff7675,false\n";
        assert_eq!(raw, expected);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "xml".parse::<ExportFormat>().expect_err("xml is unsupported");
        assert!(err.to_string().contains("json, csv"));
        assert_eq!("CSV".parse::<ExportFormat>().expect("csv"), ExportFormat::Csv);
    }
}
