use crate::embeddings::cosine_similarity;
use crate::error::{MemoryError, Result};
use crate::types::{IndexEntry, IndexMatch};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name of the JSON index inside the index directory
pub const JSON_INDEX_FILE: &str = "mock_data.json";

/// File name of the SQLite index inside the index directory
pub const SQLITE_INDEX_FILE: &str = "index.db";

/// Metadata attached to an indexed entry
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A store of vectors that can be upserted by id and queried by similarity
pub trait VectorIndex {
    /// Insert or replace the entry with this id
    fn upsert(&mut self, id: &str, vector: &[f32], metadata: Metadata) -> Result<()>;

    /// Top `k` entries by cosine similarity, ties in insertion order
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>>;

    fn len(&self) -> Result<usize>;

    /// Length of the stored vectors, `None` while the index is empty
    fn stored_dimension(&self) -> Result<Option<usize>>;

    fn name(&self) -> &'static str;
}

/// Which index a vault is configured to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBackend {
    Sqlite,
    Json,
}

impl IndexBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sqlite" => Some(IndexBackend::Sqlite),
            "json" => Some(IndexBackend::Json),
            _ => None,
        }
    }
}

/// Open the configured index, falling back to the JSON index if SQLite
/// cannot be opened
pub fn open_index(backend: IndexBackend, index_dir: &Path) -> Result<Box<dyn VectorIndex>> {
    if backend == IndexBackend::Sqlite {
        match SqliteIndex::open(&index_dir.join(SQLITE_INDEX_FILE)) {
            Ok(index) => {
                info!("using SQLite index at {}", index_dir.display());
                return Ok(Box::new(index));
            }
            Err(e) => {
                warn!("SQLite index unavailable ({}). Falling back to JSON index.", e);
            }
        }
    }

    let path = index_dir.join(JSON_INDEX_FILE);
    let index = JsonIndex::open(&path)?;
    info!("using JSON index at {}", path.display());
    Ok(Box::new(index))
}

/// Rank entries by similarity to `query`. `sort_by` is stable, so equal
/// scores keep the order the entries were given in.
fn rank<'a, I>(entries: I, query: &[f32], k: usize) -> Vec<IndexMatch>
where
    I: IntoIterator<Item = &'a IndexEntry>,
{
    let mut scored: Vec<IndexMatch> = entries
        .into_iter()
        .map(|entry| IndexMatch {
            id: entry.id.clone(),
            score: cosine_similarity(query, &entry.vector),
            content: entry
                .metadata
                .get("content")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            metadata: entry.metadata.clone(),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

// =============================================================================
// JsonIndex - list-backed store persisted as one JSON document
// =============================================================================

/// In-memory list of entries, rewritten in full to a JSON file on every
/// upsert. Without a backing file the entries live only as long as the
/// value.
///
/// There is no locking: two processes writing the same file race and the
/// last writer wins.
#[derive(Debug)]
pub struct JsonIndex {
    path: Option<PathBuf>,
    entries: Vec<IndexEntry>,
}

impl JsonIndex {
    /// Load the index at `path`. A missing file is an empty index. A file
    /// that is not UTF-8 or not valid JSON is renamed to `<name>.corrupt`
    /// and the index starts empty, so nothing is overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let parsed = match fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str::<Vec<IndexEntry>>(&content)
                    .map_err(|e| e.to_string()),
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => Err(e.to_string()),
                Err(e) => return Err(MemoryError::io(&path, e)),
            };

            match parsed {
                Ok(entries) => entries,
                Err(reason) => {
                    let quarantine = quarantine(&path)?;
                    warn!(
                        "Index file {} is corrupt ({}); moved to {} and starting empty",
                        path.display(),
                        reason,
                        quarantine.display()
                    );
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// An empty index that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MemoryError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, json).map_err(|e| MemoryError::io(path, e))
    }
}

/// Move `path` aside to `<path>.corrupt`
fn quarantine(path: &Path) -> Result<PathBuf> {
    let mut target = path.as_os_str().to_owned();
    target.push(".corrupt");
    let target = PathBuf::from(target);
    fs::rename(path, &target).map_err(|e| MemoryError::io(path, e))?;
    Ok(target)
}

impl VectorIndex for JsonIndex {
    fn upsert(&mut self, id: &str, vector: &[f32], metadata: Metadata) -> Result<()> {
        self.entries.retain(|entry| entry.id != id);
        self.entries.push(IndexEntry {
            id: id.to_string(),
            vector: vector.to_vec(),
            metadata,
        });
        self.save()
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>> {
        Ok(rank(&self.entries, vector, k))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    fn stored_dimension(&self) -> Result<Option<usize>> {
        Ok(self.entries.first().map(|entry| entry.vector.len()))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

// =============================================================================
// SqliteIndex - entries in a SQLite table
// =============================================================================

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    embedding BLOB NOT NULL,
    metadata TEXT NOT NULL
);
"#;

/// Index backed by SQLite
pub struct SqliteIndex {
    conn: Connection,
}

impl SqliteIndex {
    /// Open or create the index database
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|e| MemoryError::io(parent, e))?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // -------------------------------------------------------------------------
    // Embedding serialization
    // -------------------------------------------------------------------------

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(data: &[u8]) -> Vec<f32> {
        data.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> Result<Vec<IndexEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, embedding, metadata FROM entries ORDER BY seq")?;

        let mut results = Vec::new();
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let embedding_bytes: Vec<u8> = row.get(1)?;
            let metadata_json: String = row.get(2)?;

            results.push(IndexEntry {
                id: row.get(0)?,
                vector: Self::deserialize_embedding(&embedding_bytes),
                metadata: serde_json::from_str(&metadata_json)?,
            });
        }

        Ok(results)
    }
}

impl VectorIndex for SqliteIndex {
    fn upsert(&mut self, id: &str, vector: &[f32], metadata: Metadata) -> Result<()> {
        let metadata_json = serde_json::to_string(&metadata)?;
        let tx = self.conn.transaction()?;

        // Delete then insert so a replaced entry moves to the end
        tx.execute("DELETE FROM entries WHERE id = ?1", params![id])?;
        tx.execute(
            "INSERT INTO entries (id, embedding, metadata) VALUES (?1, ?2, ?3)",
            params![id, Self::serialize_embedding(vector), metadata_json],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<IndexMatch>> {
        let entries = self.entries()?;
        Ok(rank(&entries, vector, k))
    }

    fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn stored_dimension(&self) -> Result<Option<usize>> {
        let bytes: Option<i64> = self
            .conn
            .query_row(
                "SELECT length(embedding) FROM entries ORDER BY seq LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(bytes.map(|b| b as usize / 4))
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
