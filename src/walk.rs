use anyhow::Result;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// One input directory together with the Java files found directly in it.
#[derive(Debug, Clone)]
pub struct SourceDir {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Recursively collect `*.java` files under `root`, grouped by parent
/// directory. Directories and the files within them are sorted so runs
/// process the corpus in a deterministic order.
pub fn walk_source_files(root: &Path) -> Result<Vec<SourceDir>> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if path.extension().is_some_and(|e| e == "java")
                    && entry.file_type().is_some_and(|t| t.is_file())
                {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);

    let mut grouped: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for file in rx.iter() {
        let dir = file.parent().unwrap_or(root).to_path_buf();
        grouped.entry(dir).or_default().push(file);
    }

    Ok(grouped
        .into_iter()
        .map(|(dir, mut files)| {
            files.sort();
            SourceDir { dir, files }
        })
        .collect())
}

/// Map a directory under `from_root` to the corresponding directory under
/// `to_root`. A path outside `from_root` maps to `to_root` itself.
pub fn rebase_path(from_root: &Path, to_root: &Path, dir: &Path) -> PathBuf {
    match dir.strip_prefix(from_root) {
        Ok(rel) => to_root.join(rel),
        Err(_) => to_root.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(prefix: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "{prefix}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn walk_groups_java_files_by_directory() {
        let base = temp_dir("var-miner-walk");
        fs::create_dir_all(base.join("a/b")).unwrap();
        fs::write(base.join("a/One.java"), "class One {}").unwrap();
        fs::write(base.join("a/Two.java"), "class Two {}").unwrap();
        fs::write(base.join("a/b/Three.java"), "class Three {}").unwrap();
        fs::write(base.join("a/notes.txt"), "skip me").unwrap();

        let groups = walk_source_files(&base).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].dir, base.join("a"));
        assert_eq!(
            groups[0].files,
            vec![base.join("a/One.java"), base.join("a/Two.java")]
        );
        assert_eq!(groups[1].dir, base.join("a/b"));
        assert_eq!(groups[1].files, vec![base.join("a/b/Three.java")]);

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn walk_includes_hidden_directories() {
        let base = temp_dir("var-miner-walk-hidden");
        fs::create_dir_all(base.join(".internal")).unwrap();
        fs::write(base.join(".internal/Hidden.java"), "class Hidden {}").unwrap();

        let groups = walk_source_files(&base).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files.len(), 1);

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn rebase_path_mirrors_subdirectories() {
        let from = Path::new("/in/corpora");
        let to = Path::new("/out/examples");
        assert_eq!(
            rebase_path(from, to, Path::new("/in/corpora/org/example")),
            PathBuf::from("/out/examples/org/example")
        );
        assert_eq!(rebase_path(from, to, from), to.to_path_buf());
        assert_eq!(rebase_path(from, to, Path::new("/elsewhere")), to);
    }
}
