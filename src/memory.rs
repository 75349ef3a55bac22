use crate::config::{find_vault_path, VaultConfig};
use crate::embeddings::{content_id, get_embedder, Embedder};
use crate::error::{MemoryError, Result};
use crate::index::{open_index, JsonIndex, Metadata, VectorIndex};
use crate::types::{IndexMatch, RememberOutcome, SyncReport};
use crate::vault::{self, RecordDraft};
use chrono::{Local, NaiveDateTime};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The main memory interface: one vault, its index and its embedder
pub struct Memories {
    vault_path: PathBuf,
    config: VaultConfig,
    index: Box<dyn VectorIndex>,
    embedder: Box<dyn Embedder>,
}

impl Memories {
    /// Open the vault found from an explicit path, the environment or the
    /// current directory
    pub fn open(vault: Option<&Path>) -> Result<Self> {
        let vault_path = find_vault_path(vault)?;
        Self::open_at(vault_path)
    }

    /// Open a vault at a specific path
    pub fn open_at(vault_path: PathBuf) -> Result<Self> {
        if !vault_path.exists() {
            return Err(MemoryError::io(
                &vault_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "vault does not exist"),
            ));
        }

        let config = VaultConfig::new(vault_path.clone());
        let index = match open_index(config.index_backend(), &config.index_dir()) {
            Ok(index) => index,
            Err(e) => {
                warn!("Index unavailable ({}). Using a temporary in-memory index.", e);
                Box::new(JsonIndex::in_memory())
            }
        };
        let embedder = get_embedder(
            config.embedder_kind(),
            config.dimension(),
            &config.embedding_socket(),
        );

        let mem = Self::with_parts(vault_path, config, index, embedder);
        mem.check_dimensions();
        Ok(mem)
    }

    /// Warn when the embedder's vectors differ in length from those
    /// already stored. Returns `(embedder, stored)` on a mismatch.
    pub fn check_dimensions(&self) -> Option<(usize, usize)> {
        let produced = self.embedder.dimension()?;
        let stored = match self.index.stored_dimension() {
            Ok(stored) => stored?,
            Err(e) => {
                debug!("could not read stored dimension: {}", e);
                return None;
            }
        };

        if produced == stored {
            return None;
        }
        warn!(
            "Embedder produces {} dims but the index holds {} dim vectors; recall scores will be meaningless until the index is rebuilt",
            produced, stored
        );
        Some((produced, stored))
    }

    /// Assemble from already-built parts
    pub fn with_parts(
        vault_path: PathBuf,
        config: VaultConfig,
        index: Box<dyn VectorIndex>,
        embedder: Box<dyn Embedder>,
    ) -> Self {
        Self {
            vault_path,
            config,
            index,
            embedder,
        }
    }

    /// Create the memory folder and `MEMORY.md`, then open the vault
    pub fn init(path: &Path) -> Result<Self> {
        fs::create_dir_all(path).map_err(|e| MemoryError::io(path, e))?;
        vault::init_vault(path, &Local::now().naive_local())?;
        Self::open_at(path.to_path_buf())
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn index_name(&self) -> &'static str {
        self.index.name()
    }

    pub fn embedder_name(&self) -> String {
        self.embedder.name()
    }

    pub fn index_len(&self) -> Result<usize> {
        self.index.len()
    }

    // =========================================================================
    // Core operations
    // =========================================================================

    /// Embed `text` and upsert it under `doc_id`. Returns whether the index
    /// accepted it; failures are logged, never raised.
    pub fn add_to_index(&mut self, doc_id: &str, text: &str, mut metadata: Metadata) -> bool {
        metadata.insert("content".to_string(), json!(text));
        metadata.insert(
            "timestamp".to_string(),
            json!(Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()),
        );

        let result = self
            .embedder
            .embed(text)
            .and_then(|vector| self.index.upsert(doc_id, &vector, metadata));

        match result {
            Ok(()) => {
                debug!("indexed {}", doc_id);
                true
            }
            Err(e) => {
                warn!("Failed to index {}: {}", doc_id, e);
                false
            }
        }
    }

    /// Append a memory to today's daily log, then index it. The text write
    /// must succeed; the index write is best effort.
    pub fn remember(&mut self, content: &str, importance: u8, tags: &[String]) -> Result<RememberOutcome> {
        self.remember_at(content, importance, tags, &Local::now().naive_local())
    }

    fn remember_at(
        &mut self,
        content: &str,
        importance: u8,
        tags: &[String],
        now: &NaiveDateTime,
    ) -> Result<RememberOutcome> {
        if !(1..=5).contains(&importance) {
            return Err(MemoryError::InvalidRecord(
                "importance must be an integer from 1 to 5".into(),
            ));
        }

        let file = vault::append_entry(&self.vault_path, content, importance, tags, now)?;

        let doc_id = content_id(content);
        let mut metadata = Metadata::new();
        metadata.insert("source_file".to_string(), json!(file.display().to_string()));
        metadata.insert("importance".to_string(), json!(importance));
        metadata.insert("tags".to_string(), json!(tags));

        let indexed = self.add_to_index(&doc_id, content, metadata);

        Ok(RememberOutcome {
            file,
            doc_id,
            indexed,
        })
    }

    /// Write a structured record, copy decisions and preferences into
    /// `MEMORY.md`, then index it
    pub fn record(&mut self, draft: &RecordDraft) -> Result<RememberOutcome> {
        self.record_at(draft, &Local::now().naive_local())
    }

    fn record_at(&mut self, draft: &RecordDraft, now: &NaiveDateTime) -> Result<RememberOutcome> {
        let file = vault::append_record(&self.vault_path, draft, now)?;

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let date = now.format("%Y-%m-%d").to_string();
        if let Err(e) = vault::sync_core_memory(&self.vault_path, draft, &date, &file_name) {
            warn!("Failed to update core memory: {}", e);
        }

        let text = format!("{}\n\n{}", draft.title, draft.content);
        let doc_id = content_id(&text);
        let mut metadata = Metadata::new();
        metadata.insert("source_file".to_string(), json!(file.display().to_string()));
        metadata.insert("title".to_string(), json!(draft.title));
        metadata.insert("type".to_string(), json!(draft.record_type));
        metadata.insert("importance".to_string(), json!(draft.importance));
        metadata.insert("tags".to_string(), json!(draft.tags));

        let indexed = self.add_to_index(&doc_id, &text, metadata);

        Ok(RememberOutcome {
            file,
            doc_id,
            indexed,
        })
    }

    /// Recall memories by vector similarity
    pub fn recall(&self, query: &str, limit: usize) -> Result<Vec<IndexMatch>> {
        let query_embedding = self.embedder.embed(query)?;
        self.index.query(&query_embedding, limit)
    }

    /// Re-index every entry of every memory file. Used after notes were
    /// edited by hand or when earlier index writes failed.
    pub fn sync(&mut self) -> Result<SyncReport> {
        let files = vault::list_memory_files(&self.vault_path)?;
        let mut report = SyncReport {
            files: files.len(),
            ..Default::default()
        };

        for path in files {
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping file {}: {}", path.display(), e);
                    continue;
                }
            };

            for entry in vault::split_entries(&content) {
                let doc_id = content_id(&entry);
                let mut metadata = Metadata::new();
                metadata.insert("source_file".to_string(), json!(path.display().to_string()));
                metadata.insert("sync".to_string(), json!(true));

                if self.add_to_index(&doc_id, &entry, metadata) {
                    report.entries += 1;
                } else {
                    report.failed += 1;
                }
            }
        }

        info!(
            "synced {} entries from {} files ({} failed)",
            report.entries, report.files, report.failed
        );
        Ok(report)
    }
}
