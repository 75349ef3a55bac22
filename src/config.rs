use crate::embeddings::{EmbedderKind, DEFAULT_SOCKET_PATH, STORE_DIM};
use crate::error::{MemoryError, Result};
use crate::index::IndexBackend;
use crate::search::{HybridWeights, DEFAULT_THRESHOLD};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directory inside the vault holding the index and the config file
pub const INDEX_DIR: &str = ".memory-index";

const CONFIG_FILE: &str = "config.yaml";

/// Environment variable naming the vault root
pub const VAULT_ENV: &str = "OBSIDIAN_VAULT_ROOT";

/// Settable keys with their defaults
pub const SETTINGS: &[(&str, &str)] = &[
    ("index_backend", "sqlite"),
    ("index_path", INDEX_DIR),
    ("embedder", "seeded"),
    ("embedding_socket", DEFAULT_SOCKET_PATH),
    ("dimension", "128"),
    ("keyword_weight", "0.3"),
    ("semantic_weight", "0.7"),
    ("semantic_threshold", "0.7"),
];

/// Configuration for one vault, stored as YAML under the index directory
pub struct VaultConfig {
    vault_path: PathBuf,
    config_file: PathBuf,
    config: BTreeMap<String, serde_yaml::Value>,
}

impl VaultConfig {
    pub fn new(vault_path: PathBuf) -> Self {
        let config_file = vault_path.join(INDEX_DIR).join(CONFIG_FILE);
        let mut instance = Self {
            vault_path,
            config_file,
            config: BTreeMap::new(),
        };
        instance.load();
        instance
    }

    fn load(&mut self) {
        if !self.config_file.exists() {
            return;
        }

        let parsed = fs::read_to_string(&self.config_file)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_yaml::from_str::<Option<BTreeMap<String, serde_yaml::Value>>>(&content)
                    .map_err(|e| e.to_string())
            });

        match parsed {
            Ok(config) => self.config = config.unwrap_or_default(),
            Err(e) => warn!(
                "Ignoring unreadable config {}: {}",
                self.config_file.display(),
                e
            ),
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.config_file.parent() {
            fs::create_dir_all(dir).map_err(|e| MemoryError::io(dir, e))?;
        }
        let content = serde_yaml::to_string(&self.config)?;
        fs::write(&self.config_file, content).map_err(|e| MemoryError::io(&self.config_file, e))
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).and_then(|v| match v {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Configured value, or the default for known keys
    pub fn get_or_default(&self, key: &str) -> Option<String> {
        self.get(key).or_else(|| default_for(key).map(str::to_string))
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if default_for(key).is_none() {
            return Err(MemoryError::Config(format!("unknown key: {}", key)));
        }
        validate(key, value)?;

        self.config
            .insert(key.to_string(), serde_yaml::Value::String(value.to_string()));
        self.save()
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, fallback: T) -> T {
        match self.get(key) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Invalid value for {}: {:?}, using default", key, raw);
                fallback
            }),
            None => fallback,
        }
    }

    pub fn index_backend(&self) -> IndexBackend {
        match self.get("index_backend") {
            Some(raw) => IndexBackend::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown index_backend {:?}, using sqlite", raw);
                IndexBackend::Sqlite
            }),
            None => IndexBackend::Sqlite,
        }
    }

    pub fn index_dir(&self) -> PathBuf {
        let raw = self.get("index_path").unwrap_or_else(|| INDEX_DIR.to_string());
        resolve_path(&self.vault_path, &raw)
    }

    pub fn embedder_kind(&self) -> EmbedderKind {
        match self.get("embedder") {
            Some(raw) => EmbedderKind::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown embedder {:?}, using seeded", raw);
                EmbedderKind::Seeded
            }),
            None => EmbedderKind::Seeded,
        }
    }

    pub fn embedding_socket(&self) -> PathBuf {
        let raw = self
            .get("embedding_socket")
            .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string());
        resolve_path(&self.vault_path, &raw)
    }

    pub fn dimension(&self) -> usize {
        self.parsed("dimension", STORE_DIM)
    }

    pub fn semantic_threshold(&self) -> f64 {
        self.parsed("semantic_threshold", DEFAULT_THRESHOLD)
    }

    /// Hybrid weights; the semantic cut-off for hybrid search is not
    /// configurable here
    pub fn hybrid_weights(&self) -> HybridWeights {
        let defaults = HybridWeights::default();
        HybridWeights {
            keyword: self.parsed("keyword_weight", defaults.keyword),
            semantic: self.parsed("semantic_weight", defaults.semantic),
            ..defaults
        }
    }
}

fn default_for(key: &str) -> Option<&'static str> {
    SETTINGS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn validate(key: &str, value: &str) -> Result<()> {
    let ok = match key {
        "index_backend" => IndexBackend::parse(value).is_some(),
        "embedder" => EmbedderKind::parse(value).is_some(),
        "dimension" => value.parse::<usize>().is_ok_and(|d| d > 0),
        "keyword_weight" | "semantic_weight" | "semantic_threshold" => {
            value.parse::<f64>().is_ok_and(f64::is_finite)
        }
        _ => !value.trim().is_empty(),
    };

    if ok {
        Ok(())
    } else {
        Err(MemoryError::Config(format!("invalid value for {}: {}", key, value)))
    }
}

/// Expand `~/` and resolve relative paths against the vault root
pub fn resolve_path(vault: &Path, raw: &str) -> PathBuf {
    let expanded = match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(raw),
    };

    if expanded.is_absolute() {
        expanded
    } else {
        vault.join(expanded)
    }
}

/// Find the vault root: explicit path, then `$OBSIDIAN_VAULT_ROOT`, then
/// the nearest ancestor of the current directory with a `memory/` folder
pub fn find_vault_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        let path = resolve_path(Path::new("."), &path.to_string_lossy());
        return if path.is_dir() {
            Ok(path)
        } else {
            Err(MemoryError::VaultNotFound)
        };
    }

    if let Ok(path) = std::env::var(VAULT_ENV) {
        let vault = resolve_path(Path::new("."), &path);
        if vault.is_dir() {
            return Ok(vault);
        }
        warn!("{} points to a missing directory: {}", VAULT_ENV, path);
    }

    let mut current = std::env::current_dir().map_err(|e| MemoryError::io(".", e))?;

    loop {
        if current.join(crate::vault::MEMORY_DIR).is_dir() {
            return Ok(current);
        }

        if !current.pop() {
            break;
        }
    }

    Err(MemoryError::VaultNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = VaultConfig::new(dir.path().to_path_buf());

        assert_eq!(config.index_backend(), IndexBackend::Sqlite);
        assert_eq!(config.embedder_kind(), EmbedderKind::Seeded);
        assert_eq!(config.index_dir(), dir.path().join(INDEX_DIR));
        assert_eq!(config.dimension(), STORE_DIM);
        assert_eq!(config.semantic_threshold(), 0.7);
        assert_eq!(config.hybrid_weights(), HybridWeights::default());
        assert_eq!(config.get("embedder"), None);
        assert_eq!(config.get_or_default("embedder").as_deref(), Some("seeded"));
    }

    #[test]
    fn test_set_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut config = VaultConfig::new(dir.path().to_path_buf());
            config.set("index_backend", "json").unwrap();
            config.set("keyword_weight", "0.5").unwrap();
            config.set("index_path", "/tmp/elsewhere").unwrap();
        }

        let config = VaultConfig::new(dir.path().to_path_buf());
        assert_eq!(config.index_backend(), IndexBackend::Json);
        assert_eq!(config.hybrid_weights().keyword, 0.5);
        assert_eq!(config.hybrid_weights().semantic, 0.7);
        assert_eq!(config.index_dir(), PathBuf::from("/tmp/elsewhere"));
        assert!(dir.path().join(INDEX_DIR).join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = VaultConfig::new(dir.path().to_path_buf());

        assert!(config.set("colour", "blue").is_err());
        assert!(config.set("index_backend", "postgres").is_err());
        assert!(config.set("dimension", "0").is_err());
        assert!(config.set("semantic_weight", "lots").is_err());
    }

    #[test]
    fn test_unreadable_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join(INDEX_DIR);
        fs::create_dir_all(&index_dir).unwrap();
        fs::write(index_dir.join(CONFIG_FILE), "embedder: [unclosed").unwrap();

        let config = VaultConfig::new(dir.path().to_path_buf());
        assert_eq!(config.embedder_kind(), EmbedderKind::Seeded);
    }

    #[test]
    fn test_resolve_path() {
        let vault = Path::new("/vault");
        assert_eq!(resolve_path(vault, "idx"), PathBuf::from("/vault/idx"));
        assert_eq!(resolve_path(vault, "/abs/idx"), PathBuf::from("/abs/idx"));
    }

    #[test]
    fn test_find_vault_path_explicit() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_vault_path(Some(dir.path())).unwrap(), dir.path());
        assert!(matches!(
            find_vault_path(Some(&dir.path().join("missing"))),
            Err(MemoryError::VaultNotFound)
        ));
    }
}
