use crate::config::{find_vault_path, resolve_path};
use crate::error::{MemoryError, Result};
use crate::vault::{memory_dir, CORE_MEMORY_FILE, MEMORY_DIR};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// How far a vault has been set up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemState {
    Ready,
    Partial,
    Uninitialized,
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SystemState::Ready => "ready",
            SystemState::Partial => "partial",
            SystemState::Uninitialized => "uninitialized",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: SystemState,
    pub vault_path: PathBuf,
    pub vault_exists: bool,
    pub memory_dir_exists: bool,
    pub core_memory_exists: bool,
    /// Components still to create; the vault directory itself is not listed
    pub missing: Vec<&'static str>,
}

/// Check which parts of the memory system exist under `vault`.
///
/// Everything present is ready, nothing present is uninitialized, and an
/// existing vault without `memory/` or `MEMORY.md` is partial.
pub fn check_status(vault: &Path) -> StatusReport {
    let vault_exists = vault.is_dir();
    let memory_dir_exists = memory_dir(vault).is_dir();
    let core_memory_exists = vault.join(CORE_MEMORY_FILE).is_file();

    let checks = [vault_exists, memory_dir_exists, core_memory_exists];
    let state = if checks.iter().all(|c| *c) {
        SystemState::Ready
    } else if checks.iter().any(|c| *c) {
        SystemState::Partial
    } else {
        SystemState::Uninitialized
    };

    let mut missing = Vec::new();
    if !memory_dir_exists {
        missing.push(MEMORY_DIR);
    }
    if !core_memory_exists {
        missing.push(CORE_MEMORY_FILE);
    }

    StatusReport {
        state,
        vault_path: vault.to_path_buf(),
        vault_exists,
        memory_dir_exists,
        core_memory_exists,
        missing,
    }
}

/// Run the status command. Fails unless the vault is ready.
pub fn run_status(vault: Option<&Path>, json: bool) -> Result<()> {
    let path = match vault {
        Some(p) => resolve_path(Path::new("."), &p.to_string_lossy()),
        None => find_vault_path(None).unwrap_or_else(|_| PathBuf::from(".")),
    };
    let report = check_status(&path);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vault: {}", report.vault_path.display());
        println!("State: {}", report.state);
        if !report.missing.is_empty() {
            println!("Missing: {}", report.missing.join(", "));
        }
    }

    match report.state {
        SystemState::Ready => Ok(()),
        state => Err(MemoryError::NotReady(state.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::init_vault;
    use chrono::Local;
    use std::fs;

    #[test]
    fn test_initialized_vault_is_ready() {
        let dir = tempfile::tempdir().unwrap();
        init_vault(dir.path(), &Local::now().naive_local()).unwrap();

        let report = check_status(dir.path());
        assert_eq!(report.state, SystemState::Ready);
        assert!(report.missing.is_empty());
        assert!(run_status(Some(dir.path()), false).is_ok());
    }

    #[test]
    fn test_vault_without_memory_file_is_partial() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(MEMORY_DIR)).unwrap();

        let report = check_status(dir.path());
        assert_eq!(report.state, SystemState::Partial);
        assert_eq!(report.missing, vec![CORE_MEMORY_FILE]);

        // An empty but existing vault is still partial
        let empty = tempfile::tempdir().unwrap();
        let report = check_status(empty.path());
        assert_eq!(report.state, SystemState::Partial);
        assert_eq!(report.missing, vec![MEMORY_DIR, CORE_MEMORY_FILE]);

        assert!(matches!(
            run_status(Some(empty.path()), false),
            Err(MemoryError::NotReady(s)) if s == "partial"
        ));
    }

    #[test]
    fn test_missing_vault_is_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let vault = dir.path().join("absent");

        let report = check_status(&vault);
        assert_eq!(report.state, SystemState::Uninitialized);
        assert!(!report.vault_exists);
        assert_eq!(report.missing, vec![MEMORY_DIR, CORE_MEMORY_FILE]);

        assert!(matches!(
            run_status(Some(&vault), true),
            Err(MemoryError::NotReady(s)) if s == "uninitialized"
        ));
    }

    #[test]
    fn test_report_serializes_state_lowercase() {
        let dir = tempfile::tempdir().unwrap();
        let json = serde_json::to_value(check_status(dir.path())).unwrap();

        assert_eq!(json["state"], "partial");
        assert_eq!(json["missing"][1], "MEMORY.md");
    }
}
