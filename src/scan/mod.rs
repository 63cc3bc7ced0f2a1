//! File discovery: walks the tree and resolves the include/exclude rules
//! before the core pipeline is ever invoked.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use glob::Pattern;
use ignore::WalkBuilder;
use tracing::{debug, warn};

use crate::config::ScanConfig;

/// Resolves which source files are eligible for summarization.
pub struct Scanner {
    include_exts: HashSet<String>,
    exclude_dirs: Vec<Pattern>,
    exclude_files: Vec<Pattern>,
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            include_exts: config
                .include_exts
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            exclude_dirs: compile_patterns(&config.exclude_dirs),
            exclude_files: compile_patterns(&config.exclude_files),
        }
    }

    /// Collect eligible files under `root`, or from explicit `paths` when
    /// given (files are taken directly, directories are walked).
    /// Returns a sorted, deduplicated list.
    pub fn collect(&self, root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut found = BTreeSet::new();

        if paths.is_empty() {
            self.walk_into(root, &mut found);
        } else {
            for path in paths {
                if path.is_dir() {
                    self.walk_into(path, &mut found);
                } else if path.is_file() {
                    if self.is_eligible(path) {
                        found.insert(path.clone());
                    } else {
                        debug!("skipping excluded or unsupported path: {}", path.display());
                    }
                } else {
                    warn!("{} is not a file or directory, skipping", path.display());
                }
            }
        }

        found.into_iter().collect()
    }

    /// Whether one file passes the extension filter and exclusion lists.
    pub fn is_eligible(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !self.include_exts.contains(&ext) {
            return false;
        }
        !self.is_excluded(path)
    }

    fn walk_into(&self, root: &Path, found: &mut BTreeSet<PathBuf>) {
        let walker = WalkBuilder::new(root).hidden(false).build();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("walk error under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_some_and(|t| t.is_file()) {
                let path = entry.into_path();
                if self.is_eligible(&path) {
                    found.insert(path);
                }
            }
        }
    }

    /// Exclusion check: file patterns against the file name, directory
    /// patterns against every ancestor directory name.
    fn is_excluded(&self, path: &Path) -> bool {
        if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && self.exclude_files.iter().any(|p| p.matches(name))
        {
            return true;
        }

        for ancestor in path.ancestors().skip(1) {
            if let Some(dir_name) = ancestor.file_name().and_then(|n| n.to_str())
                && self.exclude_dirs.iter().any(|p| p.matches(dir_name))
            {
                return true;
            }
        }
        false
    }
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("ignoring invalid exclude pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> Scanner {
        Scanner::new(&ScanConfig::default())
    }

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "x = 1\n").unwrap();
        path
    }

    #[test]
    fn test_collect_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let py = touch(dir.path(), "app.py");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "data.csv");

        let files = scanner().collect(dir.path(), &[]);
        assert_eq!(files, vec![py]);
    }

    #[test]
    fn test_collect_skips_excluded_directories() {
        let dir = tempfile::tempdir().unwrap();
        let kept = touch(dir.path(), "src/app.py");
        touch(dir.path(), "node_modules/lib/index.js");
        touch(dir.path(), "__pycache__/app.py");
        touch(dir.path(), "deep/vendor/pkg/mod.go");

        let files = scanner().collect(dir.path(), &[]);
        assert_eq!(files, vec![kept]);
    }

    #[test]
    fn test_collect_skips_excluded_file_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let kept = touch(dir.path(), "app.py");
        touch(dir.path(), "app_test.py");
        touch(dir.path(), "bundle.min.js");
        touch(dir.path(), "setup.py");

        let files = scanner().collect(dir.path(), &[]);
        assert_eq!(files, vec![kept]);
    }

    #[test]
    fn test_explicit_paths_deduplicated_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.py");
        let b = touch(dir.path(), "b.py");

        let files = scanner().collect(dir.path(), &[b.clone(), a.clone(), b.clone()]);
        assert_eq!(files, vec![a, b]);
    }

    #[test]
    fn test_explicit_excluded_file_still_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let excluded = touch(dir.path(), "target/generated.rs");

        let files = scanner().collect(dir.path(), &[excluded]);
        assert!(files.is_empty());
    }
}
