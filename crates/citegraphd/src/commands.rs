use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use citegraph_analysis::{CitationGraph, NeighborhoodAnalyzer, RelevanceCandidate, export_graph};
use citegraph_core::GraphData;
use citegraph_store::{
    IngestSummary, NeighborhoodLimits, PaperBatch, SqliteStore, Store, ingest_batch, timeline,
};

use crate::cli::{
    AnalyzeFileArgs, ExportArgs, GraphFilterArgs, IngestArgs, OutputFormat, PaperArgs, SearchArgs,
    YearsArgs,
};
use crate::output::{
    write_database_stats, write_graph_report, write_json, write_neighborhood_report,
    write_paper_summaries, write_related, write_timeline,
};

fn open_store(workspace: &Path) -> Result<SqliteStore> {
    SqliteStore::open(workspace).with_context(|| {
        format!(
            "failed to open citation database under {}",
            workspace.display()
        )
    })
}

pub fn run_ingest(
    workspace: &Path,
    args: &IngestArgs,
    out: &mut dyn Write,
) -> Result<IngestSummary> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let batch: PaperBatch = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse paper batch {}", args.file.display()))?;

    let store = open_store(workspace)?;
    let summary = ingest_batch(&store, batch).context("failed to ingest paper batch")?;
    writeln!(
        out,
        "ingested {} papers ({} skipped), {} new citation edges",
        summary.papers, summary.skipped_papers, summary.new_edges
    )?;
    Ok(summary)
}

pub fn run_search(workspace: &Path, args: &SearchArgs, out: &mut dyn Write) -> Result<()> {
    let store = open_store(workspace)?;
    let papers = store.search(&args.query).context("search failed")?;
    match args.output {
        OutputFormat::Table => write_paper_summaries(&papers, out)?,
        OutputFormat::Json => write_json(&papers, out)?,
    }
    Ok(())
}

pub fn run_years(workspace: &Path, args: &YearsArgs, out: &mut dyn Write) -> Result<()> {
    let store = open_store(workspace)?;
    let papers = store
        .papers_by_year(args.start, args.end)
        .context("year range query failed")?;
    match args.output {
        OutputFormat::Table => write_paper_summaries(&papers, out)?,
        OutputFormat::Json => write_json(&papers, out)?,
    }
    Ok(())
}

pub fn run_related(workspace: &Path, args: &PaperArgs, out: &mut dyn Write) -> Result<()> {
    let store = open_store(workspace)?;
    let related = store
        .related_papers_detail(&args.doi)
        .with_context(|| format!("failed to find papers related to {}", args.doi))?;
    match args.output {
        OutputFormat::Table => write_related(&related, out)?,
        OutputFormat::Json => write_json(&related, out)?,
    }
    Ok(())
}

pub fn run_report(
    analyzer: &NeighborhoodAnalyzer,
    args: &PaperArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let report = analyzer
        .report(&args.doi)
        .with_context(|| format!("failed to analyze neighborhood of {}", args.doi))?;
    match args.output {
        OutputFormat::Table => write_neighborhood_report(&report, out)?,
        OutputFormat::Json => write_json(&report, out)?,
    }
    Ok(())
}

pub fn run_timeline(
    analyzer: &NeighborhoodAnalyzer,
    args: &PaperArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let store = open_store(analyzer.workspace())?;
    let timeline = timeline(
        &store,
        &args.doi,
        NeighborhoodLimits::from(&analyzer.config().graph),
    )
    .with_context(|| format!("failed to build timeline for {}", args.doi))?;
    match args.output {
        OutputFormat::Table => write_timeline(&timeline, out)?,
        OutputFormat::Json => write_json(&timeline, out)?,
    }
    Ok(())
}

pub fn run_export(
    analyzer: &NeighborhoodAnalyzer,
    args: &ExportArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let data = analyzer
        .neighborhood(&args.doi)
        .with_context(|| format!("failed to load neighborhood of {}", args.doi))?;
    let graph = apply_filters(CitationGraph::from_graph_data(&data), &args.filter);
    let rendered = export_graph(&graph, args.format).context("export failed")?;

    match &args.out {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("failed to write export to {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                format = args.format.as_str(),
                nodes = graph.node_count(),
                "wrote graph export"
            );
        }
        None => out.write_all(rendered.as_bytes())?,
    }
    Ok(())
}

pub fn run_analyze_file(
    analyzer: &NeighborhoodAnalyzer,
    args: &AnalyzeFileArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let raw = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let batch = GraphData::from_json_lenient(&raw)
        .with_context(|| format!("failed to parse graph records {}", args.file.display()))?;
    if batch.skipped_nodes > 0 || batch.skipped_edges > 0 {
        tracing::warn!(
            skipped_nodes = batch.skipped_nodes,
            skipped_edges = batch.skipped_edges,
            "skipped malformed graph records"
        );
    }

    let mut data = batch.data;
    analyzer.apply_node_cap(&mut data);
    let graph = apply_filters(CitationGraph::from_graph_data(&data), &args.filter);
    let candidates = graph
        .nodes()
        .map(RelevanceCandidate::from)
        .collect::<Vec<_>>();
    let report = analyzer.analyze(&graph, &candidates, &args.keywords);

    match args.output {
        OutputFormat::Table => write_graph_report(&report, out)?,
        OutputFormat::Json => write_json(&report, out)?,
    }
    Ok(())
}

pub fn run_stats(workspace: &Path, out: &mut dyn Write) -> Result<()> {
    let store = open_store(workspace)?;
    let stats = store
        .database_stats()
        .context("failed to read database statistics")?;
    write_database_stats(&stats, out)?;
    Ok(())
}

fn apply_filters(graph: CitationGraph, filter: &GraphFilterArgs) -> CitationGraph {
    let graph = match (filter.min_year, filter.max_year) {
        (Some(start), Some(end)) => graph.filter_by_year(start, end),
        _ => graph,
    };
    match filter.min_citations {
        Some(min) => graph.filter_by_citation_count(min),
        None => graph,
    }
}
