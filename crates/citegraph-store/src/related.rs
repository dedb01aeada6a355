use citegraph_core::PaperId;
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::{SqliteStore, StoreError};

pub const SHARED_REFERENCE_LIMIT: usize = 10;
pub const CO_CITATION_LIMIT: usize = 10;
pub const RELATED_LIMIT: usize = 15;

/// Both relation signals for one target plus their merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RelatedPapers {
    pub target: PaperId,
    pub shared_reference: Vec<PaperId>,
    pub co_cited: Vec<PaperId>,
    pub merged: Vec<PaperId>,
}

/// Shared-reference results first, then co-citation results not already
/// present. The target never appears and the result holds at most
/// [`RELATED_LIMIT`] ids.
pub fn merge_related(
    target: &str,
    shared_reference: &[PaperId],
    co_cited: &[PaperId],
) -> Vec<PaperId> {
    let mut merged: Vec<PaperId> = Vec::with_capacity(RELATED_LIMIT);
    for candidate in shared_reference.iter().chain(co_cited) {
        if merged.len() == RELATED_LIMIT {
            break;
        }
        if candidate == target || merged.contains(candidate) {
            continue;
        }
        merged.push(candidate.clone());
    }
    merged
}

const SHARED_REFERENCE_SQL: &str = r#"
    SELECT candidate.citing_id,
           (SELECT COUNT(*) FROM citation_edges outgoing
             WHERE outgoing.citing_id = candidate.citing_id) AS reference_total
    FROM citation_edges target_refs
    JOIN citation_edges candidate ON candidate.cited_id = target_refs.cited_id
    WHERE target_refs.citing_id = ?1
      AND candidate.citing_id <> ?1
    GROUP BY candidate.citing_id
    ORDER BY reference_total DESC, candidate.citing_id ASC
    LIMIT ?2
"#;

const CO_CITATION_SQL: &str = r#"
    SELECT candidate.cited_id,
           (SELECT COUNT(*) FROM citation_edges incoming
             WHERE incoming.cited_id = candidate.cited_id) AS citation_total
    FROM citation_edges citing_target
    JOIN citation_edges candidate ON candidate.citing_id = citing_target.citing_id
    WHERE citing_target.cited_id = ?1
      AND candidate.cited_id <> ?1
    GROUP BY candidate.cited_id
    ORDER BY citation_total DESC, candidate.cited_id ASC
    LIMIT ?2
"#;

impl SqliteStore {
    pub fn related_papers_detail(&self, doi: &str) -> Result<RelatedPapers, StoreError> {
        let target = doi.trim();
        if target.is_empty() {
            return Ok(RelatedPapers::default());
        }

        let shared_reference =
            self.related_query(SHARED_REFERENCE_SQL, target, SHARED_REFERENCE_LIMIT)?;
        let co_cited = self.related_query(CO_CITATION_SQL, target, CO_CITATION_LIMIT)?;
        let merged = merge_related(target, &shared_reference, &co_cited);

        tracing::debug!(
            doi = target,
            shared_reference = shared_reference.len(),
            co_cited = co_cited.len(),
            merged = merged.len(),
            "discovered related papers"
        );

        Ok(RelatedPapers {
            target: target.to_owned(),
            shared_reference,
            co_cited,
            merged,
        })
    }

    fn related_query(
        &self,
        sql: &str,
        target: &str,
        limit: usize,
    ) -> Result<Vec<PaperId>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![target, limit as i64], |row| {
            row.get::<_, String>(0)
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::Store;

    fn ids(values: &[&str]) -> Vec<PaperId> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn merge_prefers_shared_references_and_drops_target() {
        let merged = merge_related("t", &ids(&["a", "b", "t"]), &ids(&["b", "c"]));
        assert_eq!(merged, ids(&["a", "b", "c"]));
    }

    #[test]
    fn merge_truncates_to_fifteen() {
        let shared = (0..10).map(|index| format!("s{index}")).collect::<Vec<_>>();
        let co_cited = (0..10).map(|index| format!("c{index}")).collect::<Vec<_>>();
        let merged = merge_related("t", &shared, &co_cited);
        assert_eq!(merged.len(), RELATED_LIMIT);
        assert_eq!(merged[9], "s9");
        assert_eq!(merged[14], "c4");
    }

    #[test]
    fn shared_references_rank_by_outgoing_reference_count() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::open(temp.path()).expect("open store");

        store.save_references("t", &ids(&["r1", "r2"])).expect("target refs");
        store.save_references("p", &ids(&["r1"])).expect("p refs");
        store.save_references("q", &ids(&["r2", "x", "y"])).expect("q refs");
        store.save_references("b", &ids(&["r1"])).expect("b refs");
        store.save_references("unrelated", &ids(&["z"])).expect("unrelated refs");

        let related = store.related_papers_detail("t").expect("related");
        assert_eq!(related.shared_reference, ids(&["q", "b", "p"]));
        assert!(!related.shared_reference.contains(&"t".to_owned()));
    }

    #[test]
    fn co_citation_ranks_by_incoming_citation_count() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::open(temp.path()).expect("open store");

        store.save_references("c1", &ids(&["t", "a", "b"])).expect("c1 refs");
        store.save_references("c2", &ids(&["t", "b"])).expect("c2 refs");
        store.save_references("c3", &ids(&["a"])).expect("c3 refs");
        store.save_references("c4", &ids(&["a"])).expect("c4 refs");
        store.save_references("lonely", &ids(&["z"])).expect("lonely refs");

        let related = store.related_papers_detail("t").expect("related");
        assert_eq!(related.co_cited, ids(&["a", "b"]));
        assert!(related.shared_reference.iter().all(|id| id != "t"));
        assert_eq!(store.get_related("t").expect("merged"), related.merged);
        assert!(!related.merged.contains(&"t".to_owned()));
    }

    #[test]
    fn unknown_or_blank_targets_have_no_related_papers() {
        let temp = tempdir().expect("tempdir");
        let store = SqliteStore::open(temp.path()).expect("open store");
        assert!(store.get_related("missing").expect("related").is_empty());
        assert_eq!(
            store.related_papers_detail(" ").expect("blank"),
            RelatedPapers::default()
        );
    }
}
