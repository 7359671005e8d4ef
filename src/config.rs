use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

pub const SUPPORTED_LANGUAGES: &[&str] = &["java"];

pub fn resolve_db_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.db.clone() {
        return Ok(p);
    }

    Ok(var_miner_home()?.join("cache.lmdb"))
}

pub fn clear_db(db_path: &Path) -> Result<()> {
    remove_file_if_exists(db_path, "db")?;
    remove_file_if_exists(&lmdb_lock_path(db_path), "db lock")?;
    Ok(())
}

/// Fail-fast checks for the `cache` command, before any processing.
pub fn validate_data_path(data_path: &Path) -> Result<()> {
    if !data_path.exists() {
        bail!(
            "The data path provided does not exist: {}",
            data_path.display()
        );
    }
    if !data_path.is_dir() {
        bail!(
            "The data path provided is not a folder: {}",
            data_path.display()
        );
    }
    Ok(())
}

/// Fail-fast checks for the `examples` command, before any processing.
pub fn validate_examples_args(
    input_path: &Path,
    output_path: &Path,
    language: &str,
) -> Result<()> {
    if !input_path.is_dir() {
        bail!(
            "The input path must be a folder but it is not: {}",
            input_path.display()
        );
    }
    if output_path.exists() {
        if !output_path.is_dir() {
            bail!("The output path must be a folder: {}", output_path.display());
        }
        let mut entries = std::fs::read_dir(output_path)
            .with_context(|| format!("Failed to read: {}", output_path.display()))?;
        if entries.next().is_some() {
            bail!("The output path is not empty: {}", output_path.display());
        }
    }
    if !SUPPORTED_LANGUAGES.contains(&language) {
        bail!("Language not supported: {language}");
    }
    Ok(())
}

pub fn normalize_dir(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))
}

fn var_miner_home() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::cache_dir)
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve data directory"))?;
    Ok(base.join("var-miner"))
}

fn lmdb_lock_path(db_path: &Path) -> PathBuf {
    let mut os = db_path.as_os_str().to_os_string();
    os.push("-lock");
    PathBuf::from(os)
}

fn remove_file_if_exists(path: &Path, kind: &str) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {kind} file: {}", path.display()))?;
    }
    Ok(())
}
