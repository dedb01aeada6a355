use std::io::Write;

use citegraph_analysis::{GraphReport, NeighborhoodReport, RankedPaper};
use citegraph_core::PaperSummary;
use citegraph_store::{DatabaseStats, RelatedPapers, Timeline};
use serde::Serialize;

pub fn write_json<T: Serialize>(value: &T, out: &mut dyn Write) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_paper_summaries(
    papers: &[PaperSummary],
    out: &mut dyn Write,
) -> std::io::Result<()> {
    writeln!(out, "doi\tyear\tcitations\tvenue\ttitle\tauthors")?;

    for paper in papers {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            normalize_field(&paper.doi),
            paper.year.map(|year| year.to_string()).unwrap_or_default(),
            paper.citation_count,
            normalize_field(&paper.venue),
            normalize_field(&paper.title),
            normalize_field(&paper.authors.join("; "))
        )?;
    }

    Ok(())
}

pub fn write_related(related: &RelatedPapers, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "rank\tdoi\tsignal")?;

    for (rank, doi) in related.merged.iter().enumerate() {
        let signal = if related.shared_reference.contains(doi) {
            "shared_reference"
        } else {
            "co_citation"
        };
        writeln!(out, "{}\t{}\t{signal}", rank + 1, normalize_field(doi))?;
    }

    Ok(())
}

pub fn write_ranked(ranked: &[RankedPaper], out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "rank\tdoi\tscore\tcitations\tyear\ttitle")?;

    for (rank, paper) in ranked.iter().enumerate() {
        writeln!(
            out,
            "{}\t{}\t{:.2}\t{}\t{}\t{}",
            rank + 1,
            normalize_field(&paper.doi),
            paper.relevance_score,
            paper.citation_count,
            paper.year.map(|year| year.to_string()).unwrap_or_default(),
            normalize_field(&paper.title)
        )?;
    }

    Ok(())
}

pub fn write_graph_report(report: &GraphReport, out: &mut dyn Write) -> std::io::Result<()> {
    let stats = &report.statistics;
    writeln!(out, "metric\tvalue")?;
    writeln!(out, "total_nodes\t{}", stats.total_nodes)?;
    writeln!(out, "total_edges\t{}", stats.total_edges)?;
    writeln!(out, "density\t{}", stats.density)?;
    writeln!(out, "diameter\t{}", stats.diameter)?;
    writeln!(out, "avg_clustering\t{}", stats.avg_clustering)?;
    writeln!(out, "connected_components\t{}", stats.connected_components)?;
    writeln!(out, "weak_components\t{}", stats.weak_components)?;
    writeln!(
        out,
        "communities\t{} ({})",
        report.communities.count, report.communities.strategy
    )?;

    let mut top_pagerank = report.centrality.pagerank.iter().collect::<Vec<_>>();
    top_pagerank.sort_by(|left, right| right.1.total_cmp(left.1).then(left.0.cmp(right.0)));
    writeln!(out)?;
    writeln!(out, "doi\tpagerank\tin_degree\tbetweenness")?;
    for (doi, score) in top_pagerank.into_iter().take(10) {
        writeln!(
            out,
            "{}\t{score:.4}\t{:.4}\t{:.4}",
            normalize_field(doi),
            report.centrality.in_degree.get(doi).copied().unwrap_or(0.0),
            report.centrality.betweenness.get(doi).copied().unwrap_or(0.0)
        )?;
    }

    writeln!(out)?;
    write_ranked(&report.relevance, out)
}

pub fn write_neighborhood_report(
    report: &NeighborhoodReport,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    writeln!(out, "root\t{}", normalize_field(&report.root_doi))?;
    write_graph_report(
        &GraphReport {
            statistics: report.statistics.clone(),
            centrality: report.centrality.clone(),
            communities: report.communities.clone(),
            relevance: report.relevance.clone(),
        },
        out,
    )?;
    writeln!(out)?;
    write_related(&report.related, out)
}

pub fn write_timeline(timeline: &Timeline, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "year\tpapers")?;
    for (year, count) in timeline.years.iter().zip(&timeline.counts) {
        writeln!(out, "{year}\t{count}")?;
    }
    writeln!(out, "total\t{}", timeline.total_papers)
}

pub fn write_database_stats(stats: &DatabaseStats, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "metric\tvalue")?;
    writeln!(out, "total_papers\t{}", stats.total_papers)?;
    writeln!(out, "total_citation_edges\t{}", stats.total_citation_edges)?;
    writeln!(out, "citing_papers\t{}", stats.citing_papers)?;
    match stats.year_range {
        Some((first, last)) => writeln!(out, "year_range\t{first}-{last}"),
        None => writeln!(out, "year_range\t"),
    }
}

fn normalize_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}
