use crate::config::{find_vault_path, VaultConfig, SETTINGS};
use crate::error::{MemoryError, Result};
use std::path::Path;

/// Run the config command
pub fn run_config(vault: Option<&Path>, key: Option<&str>, value: Option<&str>) -> Result<()> {
    let vault_path = find_vault_path(vault)?;
    let mut config = VaultConfig::new(vault_path);

    match (key, value) {
        (None, None) => {
            println!("Configuration for {}:\n", config.vault_path().display());
            for (k, default) in SETTINGS {
                match config.get(k) {
                    Some(v) => println!("  {:20} {}", k, v),
                    None => println!("  {:20} {} (default)", k, default),
                }
            }
        }
        (Some(k), None) => match config.get_or_default(k) {
            Some(v) => println!("{}: {}", k, v),
            None => println!("{}: (not set)", k),
        },
        (Some(k), Some(v)) => {
            config.set(k, v)?;
            println!("Set {} = {}", k, v);
        }
        (None, Some(_)) => {
            return Err(MemoryError::Config(
                "Key required when setting a value".to_string(),
            ));
        }
    }

    Ok(())
}
