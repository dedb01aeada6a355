use std::fs;
use std::path::{Path, PathBuf};

use citegraph_analysis::{ExportFormat, NeighborhoodAnalyzer};
use citegraph_config::CitegraphConfig;
use citegraphd::cli::{
    AnalyzeFileArgs, ExportArgs, GraphFilterArgs, IngestArgs, OutputFormat, PaperArgs, SearchArgs,
};
use citegraphd::commands::{
    run_analyze_file, run_export, run_ingest, run_related, run_report, run_search, run_stats,
    run_timeline,
};
use tempfile::tempdir;

const PAPERS: &str = r#"{
    "papers": [
        {"doi": "10.1/root", "title": "Mapping Citation Graphs", "authors": ["Grace Hopper"],
         "year": 2018, "venue": "Science", "citation_count": 80, "keywords": ["citation"],
         "references": ["10.1/ref"]},
        {"doi": "10.1/ref", "title": "Early Bibliometrics", "year": 1995,
         "venue": "Cell", "citation_count": 300},
        {"doi": "10.1/follow", "title": "Following Up on Citation Graphs", "year": 2022,
         "venue": "PLOS One", "citation_count": 4, "references": ["10.1/root", "10.1/ref"]}
    ],
    "citations": []
}"#;

fn paper_args(doi: &str, output: OutputFormat) -> PaperArgs {
    PaperArgs {
        doi: doi.to_owned(),
        output,
    }
}

fn no_filter() -> GraphFilterArgs {
    GraphFilterArgs {
        min_year: None,
        max_year: None,
        min_citations: None,
    }
}

fn render(run: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> anyhow::Result<String> {
    let mut out = Vec::new();
    run(&mut out)?;
    Ok(String::from_utf8(out)?)
}

fn top_ranked(
    analyzer: &NeighborhoodAnalyzer,
    file: &Path,
    keywords: Vec<String>,
) -> anyhow::Result<serde_json::Value> {
    let rendered = render(|out| {
        run_analyze_file(
            analyzer,
            &AnalyzeFileArgs {
                file: file.to_path_buf(),
                keywords,
                filter: no_filter(),
                output: OutputFormat::Json,
            },
            out,
        )
    })?;
    let report: serde_json::Value = serde_json::from_str(&rendered)?;
    Ok(report["relevance"][0].clone())
}

#[test]
fn ingest_then_query_search_related_and_stats() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let workspace = temp.path();
    let batch_path = workspace.join("papers.json");
    fs::write(&batch_path, PAPERS)?;

    let summary = run_ingest(
        workspace,
        &IngestArgs { file: batch_path },
        &mut std::io::sink(),
    )?;
    assert_eq!(summary.papers, 3);
    assert_eq!(summary.new_edges, 3);

    let table = render(|out| {
        run_search(
            workspace,
            &SearchArgs {
                query: "citation graphs".to_owned(),
                output: OutputFormat::Table,
            },
            out,
        )
    })?;
    let lines = table.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("10.1/root\t2018\t80\t"));

    let related = render(|out| {
        run_related(workspace, &paper_args("10.1/root", OutputFormat::Json), out)
    })?;
    let related: serde_json::Value = serde_json::from_str(&related)?;
    assert_eq!(related["shared_reference"], serde_json::json!(["10.1/follow"]));

    let stats = render(|out| run_stats(workspace, out))?;
    assert!(stats.contains("total_papers\t3\n"));
    assert!(stats.contains("year_range\t1995-2022\n"));
    Ok(())
}

#[test]
fn report_timeline_and_export_use_the_neighborhood() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let workspace = temp.path();
    let batch_path = workspace.join("papers.json");
    fs::write(&batch_path, PAPERS)?;
    run_ingest(workspace, &IngestArgs { file: batch_path }, &mut std::io::sink())?;

    let mut config = CitegraphConfig::default();
    config.relevance.current_year = Some(2024);
    let analyzer = NeighborhoodAnalyzer::with_config(workspace, config);

    let report = render(|out| {
        run_report(&analyzer, &paper_args("10.1/root", OutputFormat::Json), out)
    })?;
    let report: serde_json::Value = serde_json::from_str(&report)?;
    assert_eq!(report["statistics"]["total_nodes"], 3);
    assert_eq!(report["relevance"][0]["doi"], "10.1/ref");

    let timeline = render(|out| {
        run_timeline(&analyzer, &paper_args("10.1/root", OutputFormat::Table), out)
    })?;
    assert_eq!(timeline, "year\tpapers\n1995\t1\n2018\t1\n2022\t1\ntotal\t3\n");

    let export_path = workspace.join("graph.csv");
    run_export(
        &analyzer,
        &ExportArgs {
            doi: "10.1/root".to_owned(),
            format: ExportFormat::Csv,
            out: Some(export_path.clone()),
            filter: GraphFilterArgs {
                min_year: Some(2000),
                max_year: Some(2030),
                min_citations: None,
            },
        },
        &mut std::io::sink(),
    )?;
    let csv = fs::read_to_string(&export_path)?;
    assert!(csv.starts_with("# Nodes\n"));
    assert!(csv.contains("10.1/follow"));
    assert!(!csv.contains("10.1/ref,"));

    let missing = run_report(
        &analyzer,
        &paper_args("10.1/missing", OutputFormat::Table),
        &mut std::io::sink(),
    );
    assert!(missing.is_err());
    Ok(())
}

#[test]
fn analyze_file_reports_the_three_paper_example() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let workspace = temp.path();
    let graph_path: PathBuf = workspace.join("graph.json");
    fs::write(
        &graph_path,
        r#"{
            "nodes": [
                {"id": "A", "title": "A", "year": 2020, "citation_count": 10, "group": "root"},
                {"id": "B", "title": "B", "year": 2019, "citation_count": 15, "group": "reference"},
                {"id": "C", "title": "C", "year": 2021, "citation_count": 8, "group": "citation"},
                {"title": "no id"}
            ],
            "edges": [
                {"from": "A", "to": "B"},
                {"from": "C", "to": "A"},
                {"from": "A", "to": "ghost"}
            ],
            "root_doi": "A"
        }"#,
    )?;

    let analyzer = NeighborhoodAnalyzer::with_config(workspace, CitegraphConfig::default());
    let rendered = render(|out| {
        run_analyze_file(
            &analyzer,
            &AnalyzeFileArgs {
                file: graph_path,
                keywords: Vec::new(),
                filter: no_filter(),
                output: OutputFormat::Json,
            },
            out,
        )
    })?;
    let report: serde_json::Value = serde_json::from_str(&rendered)?;
    assert_eq!(report["statistics"]["total_nodes"], 3);
    assert_eq!(report["statistics"]["total_edges"], 2);
    assert_eq!(report["statistics"]["density"], 0.3333);
    assert_eq!(report["centrality"]["in_degree"]["A"], 0.5);
    Ok(())
}

#[test]
fn analyze_file_scores_node_venue_and_keywords() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let workspace = temp.path();
    let graph_path = workspace.join("graph.json");
    fs::write(
        &graph_path,
        r#"{
            "nodes": [
                {"id": "N", "title": "N", "year": 2024, "venue": "Nature",
                 "keywords": ["citation"]},
                {"id": "P", "title": "P", "year": 2024}
            ],
            "edges": [{"from": "P", "to": "N"}]
        }"#,
    )?;

    let mut config = CitegraphConfig::default();
    config.relevance.current_year = Some(2024);
    let analyzer = NeighborhoodAnalyzer::with_config(workspace, config);
    let without_keywords = top_ranked(&analyzer, &graph_path, Vec::new())?;
    assert_eq!(without_keywords["doi"], "N");
    assert_eq!(without_keywords["relevance_score"], 20.0);

    let with_keywords = top_ranked(&analyzer, &graph_path, vec!["citation".to_owned()])?;
    assert_eq!(with_keywords["doi"], "N");
    assert_eq!(with_keywords["relevance_score"], 30.0);
    Ok(())
}
