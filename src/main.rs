use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use var_miner::cache::AstCache;
use var_miner::cli::{Cli, Commands};
use var_miner::config;
use var_miner::example::VarExample;
use var_miner::extract;
use var_miner::walk::{rebase_path, walk_source_files};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.clone() {
        Commands::Cache { data_path } => {
            config::validate_data_path(&data_path)?;
            let data_path = config::normalize_dir(&data_path)?;
            let cache = AstCache::open(config::resolve_db_path(&cli)?)?;
            let summary = run_cache(&cache, &data_path)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Examples {
            input_path,
            output_path,
            cache_only,
            language,
        } => {
            config::validate_examples_args(&input_path, &output_path, &language)?;
            let input_path = config::normalize_dir(&input_path)?;
            std::fs::create_dir_all(&output_path).with_context(|| {
                format!("Failed to create output path: {}", output_path.display())
            })?;
            let output_path = config::normalize_dir(&output_path)?;
            let cache = AstCache::open(config::resolve_db_path(&cli)?)?;
            let summary = run_examples(&cache, &input_path, &output_path, cache_only)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Stats => {
            let cache = AstCache::open(config::resolve_db_path(&cli)?)?;
            println!("{}", serde_json::to_string_pretty(&cache.stats()?)?);
        }
        Commands::Clear => {
            config::clear_db(&config::resolve_db_path(&cli)?)?;
        }
    }

    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct CacheRunSummary {
    root: String,
    scanned_files: usize,
    cached_files: usize,
    skipped_files: usize,
    failed_files: usize,
    duration_ms: u64,
}

fn run_cache(cache: &AstCache, root: &Path) -> Result<CacheRunSummary> {
    let start = Instant::now();
    let mut summary = CacheRunSummary {
        root: root.to_string_lossy().to_string(),
        ..Default::default()
    };

    for group in walk_source_files(root)? {
        summary.scanned_files += group.files.len();
        match cache.cache_files(&group.files) {
            Ok(outcome) => {
                summary.cached_files += outcome.cached;
                summary.skipped_files += outcome.skipped;
                summary.failed_files += outcome.failures.len();
                for (path, err) in &outcome.failures {
                    println!("{}: {err:#}", path.display());
                }
            }
            Err(err) => {
                summary.failed_files += group.files.len();
                println!("{}: {err:#}", group.dir.display());
            }
        }
    }

    summary.duration_ms = start.elapsed().as_millis() as u64;
    Ok(summary)
}

#[derive(Debug, Default, Serialize)]
struct ExamplesRunSummary {
    input: String,
    output: String,
    processed_files: usize,
    skipped_files: usize,
    failed_files: usize,
    written_examples: usize,
    duration_ms: u64,
}

fn run_examples(
    cache: &AstCache,
    input: &Path,
    output: &Path,
    cache_only: bool,
) -> Result<ExamplesRunSummary> {
    let start = Instant::now();
    let mut summary = ExamplesRunSummary {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        ..Default::default()
    };

    for group in walk_source_files(input)? {
        let out_dir = rebase_path(input, output, &group.dir);
        std::fs::create_dir_all(&out_dir).with_context(|| {
            format!("Failed to create output directory: {}", out_dir.display())
        })?;

        for file in &group.files {
            match process_file(cache, file, &out_dir, cache_only) {
                Ok(Some(written)) => {
                    summary.processed_files += 1;
                    summary.written_examples += written;
                }
                Ok(None) => summary.skipped_files += 1,
                Err(err) => {
                    summary.failed_files += 1;
                    println!("{}: {err:#}", file.display());
                }
            }
        }
    }

    summary.duration_ms = start.elapsed().as_millis() as u64;
    Ok(summary)
}

/// Returns the number of examples written, or `None` when the file was
/// skipped because `--cache-only` is set and no current cache entry exists.
fn process_file(
    cache: &AstCache,
    file: &Path,
    out_dir: &Path,
    cache_only: bool,
) -> Result<Option<usize>> {
    if cache_only && !cache.file_cached(file)? {
        return Ok(None);
    }

    let examples: Vec<VarExample> = extract::from_source_file(file, cache)?
        .into_iter()
        .filter(|e| !e.variables().is_empty())
        .collect();

    let out_path = out_dir.join(example_file_name(file)?);
    VarExample::serialize_to_file(&out_path, &examples)?;
    Ok(Some(examples.len()))
}

fn example_file_name(file: &Path) -> Result<String> {
    let name = file
        .file_name()
        .with_context(|| format!("Source path has no file name: {}", file.display()))?;
    Ok(format!("{}.eg.tsv", name.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_file_name_appends_suffix() {
        assert_eq!(
            example_file_name(Path::new("/corpus/org/Foo.java")).unwrap(),
            "Foo.java.eg.tsv"
        );
        assert!(example_file_name(Path::new("/")).is_err());
    }
}
