//! Persistent AST cache for parsed Java sources.
//!
//! Uses LMDB (via heed) for key-value storage with ACID guarantees. Keys are
//! canonical source file paths, values are JSON-serialized [`SourceAst`]
//! records carrying the content hash of the source they were parsed from.

use anyhow::{Context, Result};
use heed::types::Str;
use heed::{Database, Env, EnvFlags, EnvOpenOptions};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ast::{SourceAst, hash_file, parse_file};

pub const ASTS_DB: &str = "asts";

const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;
const DEFAULT_MAX_DBS: u32 = 8;

type StrDb = Database<Str, Str>;

#[derive(Debug)]
pub struct AstCache {
    env: Arc<Env>,
    db_path: PathBuf,
    asts: StrDb,
}

impl AstCache {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let env = open_env(&db_path)?;
        let env = Arc::new(env);

        let mut wtxn = env.write_txn()?;
        let asts = env.create_database::<Str, Str>(&mut wtxn, Some(ASTS_DB))?;
        wtxn.commit()?;

        Ok(Self { env, db_path, asts })
    }

    /// Store a batch of pre-serialized ASTs in a single write transaction.
    pub fn put_asts(&self, entries: &[(String, String)]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut wtxn = self.env.write_txn()?;
        for (key, json) in entries {
            self.asts.put(&mut wtxn, key.as_str(), json.as_str())?;
        }
        wtxn.commit()?;
        Ok(entries.len())
    }

    pub fn put_ast(&self, key: &str, ast: &SourceAst) -> Result<()> {
        let json = serde_json::to_string(ast)?;
        self.put_asts(&[(key.to_string(), json)])?;
        Ok(())
    }

    pub fn get_ast(&self, key: &str) -> Result<Option<SourceAst>> {
        let rtxn = self.env.read_txn()?;
        let Some(raw) = self.asts.get(&rtxn, key)? else {
            return Ok(None);
        };
        serde_json::from_str(raw)
            .map(Some)
            .with_context(|| format!("Corrupt cache entry for: {key}"))
    }

    /// True iff an entry exists for this path and its stored content hash
    /// matches the file's current content.
    pub fn file_cached(&self, path: &Path) -> Result<bool> {
        let key = path.to_string_lossy();
        let Some(cached) = self.get_ast(&key)? else {
            return Ok(false);
        };
        Ok(cached.content_hash == hash_file(path)?)
    }

    /// Parse a batch of files and commit the results in one write
    /// transaction. Files whose cache entry is already current are skipped;
    /// per-file parse failures are collected, not fatal. Parsing is pure
    /// and CPU-bound, so the batch is parsed in parallel before the commit.
    pub fn cache_files(&self, files: &[PathBuf]) -> Result<CacheBatchOutcome> {
        let mut outcome = CacheBatchOutcome::default();

        let mut pending = Vec::new();
        for file in files {
            match self.file_cached(file) {
                Ok(true) => outcome.skipped += 1,
                Ok(false) => pending.push(file.clone()),
                Err(err) => outcome.failures.push((file.clone(), err)),
            }
        }

        let parsed: Vec<(PathBuf, Result<SourceAst>)> = pending
            .into_par_iter()
            .map(|file| {
                let ast = parse_file(&file);
                (file, ast)
            })
            .collect();

        let mut entries = Vec::new();
        for (file, result) in parsed {
            match result.and_then(|ast| Ok(serde_json::to_string(&ast)?)) {
                Ok(json) => entries.push((file.to_string_lossy().to_string(), json)),
                Err(err) => outcome.failures.push((file, err)),
            }
        }
        outcome.cached = self.put_asts(&entries)?;

        Ok(outcome)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let rtxn = self.env.read_txn()?;
        let mut cached_files = 0u64;
        for item in self.asts.iter(&rtxn)? {
            let _ = item?;
            cached_files += 1;
        }
        Ok(CacheStats {
            db_path: self.db_path.to_string_lossy().to_string(),
            cached_files,
        })
    }
}

fn open_env(db_path: &PathBuf) -> Result<Env> {
    let mut options = EnvOpenOptions::new();
    options.map_size(DEFAULT_MAP_SIZE);
    options.max_dbs(DEFAULT_MAX_DBS);
    // SAFETY: We do not use NO_LOCK and keep default LMDB locking guarantees.
    // NO_SUB_DIR preserves single-path CLI behavior for --db.
    unsafe {
        options.flags(EnvFlags::NO_SUB_DIR);
        options
            .open(db_path)
            .with_context(|| format!("Failed to create/open db env: {}", db_path.display()))
    }
}

#[derive(Debug, Default)]
pub struct CacheBatchOutcome {
    pub cached: usize,
    pub skipped: usize,
    pub failures: Vec<(PathBuf, anyhow::Error)>,
}

#[derive(Debug, serde::Serialize)]
pub struct CacheStats {
    pub db_path: String,
    pub cached_files: u64,
}
