use std::path::PathBuf;

/// Errors surfaced by vault, index and search operations
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("No vault found. Pass --vault or set OBSIDIAN_VAULT_ROOT.")]
    VaultNotFound,

    #[error("memory folder does not exist: {0}")]
    MissingMemoryFolder(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed frontmatter in {path}: {message}")]
    Frontmatter { path: PathBuf, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Memory system is {0}. Run `vault-memory init`.")]
    NotReady(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl MemoryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MemoryError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
