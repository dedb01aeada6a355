use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use citegraph_config::{citegraph_dir, database_path};
use citegraph_core::{Paper, PaperId, PaperSummary, normalize_doi, normalize_keywords};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod ingest;
mod neighborhood;
mod related;

pub use ingest::{CitationRecord, IngestSummary, PaperBatch, PaperRecord, ingest_batch};
pub use neighborhood::{NeighborhoodLimits, Timeline, citation_graph_data, timeline};
pub use related::{
    CO_CITATION_LIMIT, RELATED_LIMIT, RelatedPapers, SHARED_REFERENCE_LIMIT, merge_related,
};

pub const SEARCH_LIMIT: i64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub total_papers: u64,
    pub total_citation_edges: u64,
    pub citing_papers: u64,
    pub year_range: Option<(i32, i32)>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Query contract the analytics engine depends on.
pub trait Store {
    fn upsert_paper(&self, paper: Paper) -> Result<(), StoreError>;
    /// Records `citing -> cited` for each entry; returns the number of new edges.
    fn save_citations(&self, citing: &str, cited: &[PaperId]) -> Result<usize, StoreError>;
    /// Records `paper -> reference` for each entry; returns the number of new edges.
    fn save_references(&self, paper: &str, references: &[PaperId]) -> Result<usize, StoreError>;

    fn get_paper(&self, doi: &str) -> Result<Option<Paper>, StoreError>;
    fn get_keywords(&self, doi: &str) -> Result<Vec<String>, StoreError>;
    /// Papers citing `doi`.
    fn get_citations(&self, doi: &str) -> Result<Vec<PaperId>, StoreError>;
    /// Papers `doi` cites.
    fn get_references(&self, doi: &str) -> Result<Vec<PaperId>, StoreError>;
    fn get_related(&self, doi: &str) -> Result<Vec<PaperId>, StoreError>;
    fn search(&self, query: &str) -> Result<Vec<PaperSummary>, StoreError>;
    fn papers_by_year(&self, start: i32, end: i32) -> Result<Vec<PaperSummary>, StoreError>;
    fn database_stats(&self) -> Result<DatabaseStats, StoreError>;
}

/// SQLite-backed store. Only the database path is held; every operation
/// opens its own connection and releases it before returning.
pub struct SqliteStore {
    sqlite_path: PathBuf,
    citegraph_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(workspace_root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let workspace_root = workspace_root.as_ref();
        let citegraph_dir = citegraph_dir(workspace_root);
        let sqlite_path = database_path(workspace_root);

        fs::create_dir_all(&citegraph_dir)?;

        let conn = Connection::open(&sqlite_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        run_migrations(&conn)?;
        drop(conn);

        Ok(Self {
            sqlite_path,
            citegraph_dir,
        })
    }

    pub fn citegraph_dir(&self) -> &Path {
        &self.citegraph_dir
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    fn connection(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.sqlite_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    fn insert_edges<'a>(
        &self,
        pairs: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> Result<usize, StoreError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO citation_edges (citing_id, cited_id) VALUES (?1, ?2)",
            )?;
            for (citing, cited) in pairs {
                let (citing, cited) = (citing.trim(), cited.trim());
                if citing.is_empty() || cited.is_empty() {
                    tracing::debug!(citing, cited, "skipping citation edge with blank endpoint");
                    continue;
                }
                inserted += stmt.execute(params![citing, cited])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn list_column(&self, sql: &str, doi: &str) -> Result<Vec<PaperId>, StoreError> {
        let doi = doi.trim();
        if doi.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![doi], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn query_summaries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<PaperSummary>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<i32>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (doi, title, authors_json, year, venue, citation_count) = row?;
            summaries.push(PaperSummary {
                doi,
                title,
                authors: decode_authors(&authors_json)?,
                year,
                venue,
                citation_count: count_from_sql(citation_count),
            });
        }

        Ok(summaries)
    }
}

impl Store for SqliteStore {
    fn upsert_paper(&self, paper: Paper) -> Result<(), StoreError> {
        let doi = normalize_doi(&paper.doi);
        if doi.is_empty() {
            tracing::warn!("skipping paper upsert without an identifier");
            return Ok(());
        }

        let authors_json = serde_json::to_string(&paper.authors)?;
        let keywords = normalize_keywords(&paper.keywords);

        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO papers (
                doi, title, authors_json, year, venue, abstract,
                citation_count, reference_count, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(doi) DO UPDATE SET
                title = excluded.title,
                authors_json = excluded.authors_json,
                year = excluded.year,
                venue = excluded.venue,
                abstract = excluded.abstract,
                citation_count = excluded.citation_count,
                reference_count = excluded.reference_count,
                updated_at = excluded.updated_at
            "#,
            params![
                doi,
                paper.title,
                authors_json,
                paper.year,
                paper.venue,
                paper.abstract_text,
                count_to_sql(paper.citation_count),
                count_to_sql(paper.reference_count),
                now_millis(),
            ],
        )?;

        tx.execute("DELETE FROM paper_keywords WHERE paper_doi = ?1", params![doi])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO paper_keywords (paper_doi, position, keyword) VALUES (?1, ?2, ?3)",
            )?;
            for (position, keyword) in keywords.iter().enumerate() {
                stmt.execute(params![doi, position as i64, keyword])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn save_citations(&self, citing: &str, cited: &[PaperId]) -> Result<usize, StoreError> {
        self.insert_edges(cited.iter().map(|cited| (citing, cited.as_str())))
    }

    fn save_references(&self, paper: &str, references: &[PaperId]) -> Result<usize, StoreError> {
        self.insert_edges(
            references
                .iter()
                .map(|reference| (paper, reference.as_str())),
        )
    }

    fn get_paper(&self, doi: &str) -> Result<Option<Paper>, StoreError> {
        let doi = doi.trim();
        if doi.is_empty() {
            return Ok(None);
        }

        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT doi, title, authors_json, year, venue, abstract, citation_count, reference_count
            FROM papers
            WHERE doi = ?1
            "#,
        )?;
        let row = stmt
            .query_row(params![doi], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<i32>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            })
            .optional()?;
        drop(stmt);
        drop(conn);

        let Some((doi, title, authors_json, year, venue, abstract_text, citations, references)) =
            row
        else {
            return Ok(None);
        };

        let keywords = self.get_keywords(&doi)?;
        Ok(Some(Paper {
            authors: decode_authors(&authors_json)?,
            doi,
            title,
            year,
            venue,
            abstract_text,
            citation_count: count_from_sql(citations),
            reference_count: count_from_sql(references),
            keywords,
        }))
    }

    fn get_keywords(&self, doi: &str) -> Result<Vec<String>, StoreError> {
        self.list_column(
            "SELECT keyword FROM paper_keywords WHERE paper_doi = ?1 ORDER BY position ASC",
            doi,
        )
    }

    fn get_citations(&self, doi: &str) -> Result<Vec<PaperId>, StoreError> {
        self.list_column(
            "SELECT citing_id FROM citation_edges WHERE cited_id = ?1 ORDER BY rowid ASC",
            doi,
        )
    }

    fn get_references(&self, doi: &str) -> Result<Vec<PaperId>, StoreError> {
        self.list_column(
            "SELECT cited_id FROM citation_edges WHERE citing_id = ?1 ORDER BY rowid ASC",
            doi,
        )
    }

    fn get_related(&self, doi: &str) -> Result<Vec<PaperId>, StoreError> {
        Ok(self.related_papers_detail(doi)?.merged)
    }

    fn search(&self, query: &str) -> Result<Vec<PaperSummary>, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("%{query}%");
        self.query_summaries(
            r#"
            SELECT p.doi, p.title, p.authors_json, p.year, p.venue, p.citation_count
            FROM papers p
            WHERE LOWER(p.title) LIKE LOWER(?1)
               OR LOWER(p.authors_json) LIKE LOWER(?1)
               OR EXISTS (
                    SELECT 1 FROM paper_keywords k
                    WHERE k.paper_doi = p.doi AND LOWER(k.keyword) LIKE LOWER(?1)
               )
            ORDER BY p.citation_count DESC, p.year DESC, p.doi ASC
            LIMIT ?2
            "#,
            params![pattern, SEARCH_LIMIT],
        )
    }

    fn papers_by_year(&self, start: i32, end: i32) -> Result<Vec<PaperSummary>, StoreError> {
        self.query_summaries(
            r#"
            SELECT doi, title, authors_json, year, venue, citation_count
            FROM papers
            WHERE year BETWEEN ?1 AND ?2
            ORDER BY year DESC, citation_count DESC, doi ASC
            "#,
            params![start, end],
        )
    }

    fn database_stats(&self) -> Result<DatabaseStats, StoreError> {
        let conn = self.connection()?;
        let total_papers: i64 = conn.query_row("SELECT COUNT(*) FROM papers", [], |row| row.get(0))?;
        let total_citation_edges: i64 =
            conn.query_row("SELECT COUNT(*) FROM citation_edges", [], |row| row.get(0))?;
        let citing_papers: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT citing_id) FROM citation_edges",
            [],
            |row| row.get(0),
        )?;
        let (min_year, max_year): (Option<i32>, Option<i32>) = conn.query_row(
            "SELECT MIN(year), MAX(year) FROM papers WHERE year IS NOT NULL",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(DatabaseStats {
            total_papers: count_from_sql(total_papers),
            total_citation_edges: count_from_sql(total_citation_edges),
            citing_papers: count_from_sql(citing_papers),
            year_range: min_year.zip(max_year),
        })
    }
}

fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS papers (
            doi TEXT PRIMARY KEY,
            title TEXT NOT NULL DEFAULT '',
            authors_json TEXT NOT NULL DEFAULT '[]',
            year INTEGER,
            venue TEXT NOT NULL DEFAULT '',
            abstract TEXT NOT NULL DEFAULT '',
            citation_count INTEGER NOT NULL DEFAULT 0,
            reference_count INTEGER NOT NULL DEFAULT 0,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS citation_edges (
            citing_id TEXT NOT NULL,
            cited_id TEXT NOT NULL,
            PRIMARY KEY (citing_id, cited_id)
        );

        CREATE INDEX IF NOT EXISTS idx_citation_edges_cited
            ON citation_edges (cited_id, citing_id);

        CREATE TABLE IF NOT EXISTS paper_keywords (
            paper_doi TEXT NOT NULL,
            position INTEGER NOT NULL,
            keyword TEXT NOT NULL,
            PRIMARY KEY (paper_doi, position)
        );

        CREATE INDEX IF NOT EXISTS idx_paper_keywords_keyword
            ON paper_keywords (keyword);
        "#,
    )?;

    Ok(())
}

fn decode_authors(raw: &str) -> Result<Vec<String>, StoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

fn count_to_sql(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

fn count_from_sql(count: i64) -> u64 {
    count.max(0) as u64
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}
