use citegraph_core::{Paper, PaperId};
use serde::{Deserialize, Serialize};

use crate::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub citing: PaperId,
    pub cited: PaperId,
}

/// Papers plus citation pairs, as produced by a metadata fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaperBatch {
    #[serde(default)]
    pub papers: Vec<PaperRecord>,
    #[serde(default)]
    pub citations: Vec<CitationRecord>,
}

/// A paper with its optional outgoing reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    #[serde(flatten)]
    pub paper: Paper,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<PaperId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IngestSummary {
    pub papers: usize,
    pub skipped_papers: usize,
    pub new_edges: usize,
}

pub fn ingest_batch<S: Store + ?Sized>(
    store: &S,
    batch: PaperBatch,
) -> Result<IngestSummary, StoreError> {
    let mut summary = IngestSummary::default();

    for record in batch.papers {
        let doi = record.paper.doi.trim().to_owned();
        if doi.is_empty() {
            summary.skipped_papers += 1;
            continue;
        }
        store.upsert_paper(record.paper)?;
        summary.papers += 1;
        if !record.references.is_empty() {
            summary.new_edges += store.save_references(&doi, &record.references)?;
        }
    }

    for citation in batch.citations {
        summary.new_edges += store.save_citations(&citation.citing, &[citation.cited])?;
    }

    tracing::info!(
        papers = summary.papers,
        skipped = summary.skipped_papers,
        new_edges = summary.new_edges,
        "ingested paper batch"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::SqliteStore;

    #[test]
    fn ingest_writes_papers_references_and_citations() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::open(temp.path()).expect("open store");

        let raw = r#"{
            "papers": [
                {"doi": "10.1/a", "title": "A", "year": 2020, "journal": "Nature",
                 "keywords": ["graphs"], "references": ["10.1/b"]},
                {"doi": "10.1/b", "title": "B", "citation_count": null},
                {"doi": "  ", "title": "nameless"}
            ],
            "citations": [
                {"citing": "10.1/c", "cited": "10.1/a"},
                {"citing": "10.1/a", "cited": "10.1/b"}
            ]
        }"#;
        let batch: PaperBatch = serde_json::from_str(raw).expect("parse batch");

        let summary = ingest_batch(&store, batch).expect("ingest");
        assert_eq!(
            summary,
            IngestSummary {
                papers: 2,
                skipped_papers: 1,
                new_edges: 2,
            }
        );

        let a = store.get_paper("10.1/a").expect("get").expect("paper a");
        assert_eq!(a.venue, "Nature");
        assert_eq!(a.keywords, vec!["graphs".to_owned()]);
        assert_eq!(
            store.get_citations("10.1/a").expect("citations"),
            vec!["10.1/c".to_owned()]
        );
    }
}
