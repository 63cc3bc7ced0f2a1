//! DocInjector: idempotent injection of summaries into marked regions of
//! per-directory documentation files.
//!
//! The format is deliberately line-oriented and marker-delimited rather
//! than a parsed document tree: a region is everything between
//! `<!-- BEGIN docsync: {anchor} -->` and `<!-- END docsync: {anchor} -->`,
//! and injection/pruning are plain string-region operations that leave
//! every byte outside the target region untouched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::types::{Result, SyncError};

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!-- BEGIN docsync: (.+?) -->").expect("anchor regex is valid")
});

fn begin_marker(anchor: &str) -> String {
    format!("<!-- BEGIN docsync: {} -->", anchor)
}

fn end_marker(anchor: &str) -> String {
    format!("<!-- END docsync: {} -->", anchor)
}

/// Render a complete marked region for an anchor.
fn render_region(anchor: &str, body: &str) -> String {
    format!(
        "{}\n## {}\n\n{}\n{}",
        begin_marker(anchor),
        anchor,
        body.trim_end(),
        end_marker(anchor)
    )
}

/// Injects and prunes marked regions, serializing concurrent writers per
/// documentation file.
#[derive(Default)]
pub struct DocInjector {
    /// One lock per canonical doc path; two file-level workers summarizing
    /// siblings in the same directory contend here, never on content
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl DocInjector {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, doc_path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(doc_path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Replace (or append) the marked region for `anchor` with `body`.
    ///
    /// Idempotent: injecting the same pair twice yields a byte-identical
    /// document. Everything outside the region is preserved exactly.
    pub async fn inject(&self, doc_path: &Path, anchor: &str, body: &str) -> Result<()> {
        let lock = self.lock_for(doc_path);
        let _guard = lock.lock().await;

        let current = read_or_empty(doc_path).await?;
        let updated = upsert_region(&current, anchor, body);

        if updated != current {
            write_atomic(doc_path, &updated).await?;
            info!("updated {} for {}", doc_path.display(), anchor);
        } else {
            debug!("{} already current for {}", doc_path.display(), anchor);
        }
        Ok(())
    }

    /// Remove every marked region whose anchor is not in `valid_anchors`.
    ///
    /// Used when source files are deleted or excluded; free-form content
    /// and valid regions are untouched. A missing doc file is a no-op.
    pub async fn prune(&self, doc_path: &Path, valid_anchors: &HashSet<String>) -> Result<()> {
        let lock = self.lock_for(doc_path);
        let _guard = lock.lock().await;

        if !doc_path.exists() {
            return Ok(());
        }

        let current = read_or_empty(doc_path).await?;
        let mut updated = current.clone();

        for anchor in anchors_in(&current) {
            if !valid_anchors.contains(&anchor) {
                updated = remove_region(&updated, &anchor);
                info!("pruned stale section {} from {}", anchor, doc_path.display());
            }
        }

        if updated != current {
            write_atomic(doc_path, &updated).await?;
        }
        Ok(())
    }
}

/// Every anchor present in a document, in order of appearance.
pub fn anchors_in(content: &str) -> Vec<String> {
    ANCHOR_RE
        .captures_iter(content)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Replace the anchor's region in place, or append a new one.
fn upsert_region(content: &str, anchor: &str, body: &str) -> String {
    let rendered = render_region(anchor, body);

    if let Some((start, end)) = region_bounds(content, anchor) {
        let mut updated = String::with_capacity(content.len() + rendered.len());
        updated.push_str(&content[..start]);
        updated.push_str(&rendered);
        updated.push_str(&content[end..]);
        return updated;
    }

    if content.trim().is_empty() {
        format!("{}\n", rendered)
    } else {
        format!("{}\n\n{}\n", content.trim_end_matches('\n'), rendered)
    }
}

/// Remove the anchor's region, collapsing the blank separation it leaves.
fn remove_region(content: &str, anchor: &str) -> String {
    let Some((start, mut end)) = region_bounds(content, anchor) else {
        return content.to_string();
    };

    // Swallow the trailing newlines that separated this region from what
    // follows, leaving at most the separation the neighbors already had
    while content[end..].starts_with('\n') {
        end += 1;
    }
    let mut start_trimmed = start;
    while start_trimmed > 0 && content[..start_trimmed].ends_with('\n') {
        start_trimmed -= 1;
    }

    let before = &content[..start_trimmed];
    let after = &content[end..];

    if before.is_empty() {
        after.to_string()
    } else if after.is_empty() {
        format!("{}\n", before)
    } else {
        format!("{}\n\n{}", before, after)
    }
}

/// Byte bounds of the anchor's region including both markers.
fn region_bounds(content: &str, anchor: &str) -> Option<(usize, usize)> {
    let begin = begin_marker(anchor);
    let end = end_marker(anchor);

    let start = content.find(&begin)?;
    let end_start = content[start..].find(&end)? + start;
    Some((start, end_start + end.len()))
}

async fn read_or_empty(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(SyncError::injection(path.display().to_string(), e)),
    }
}

/// Write the whole document to a sibling temp file, then rename it over
/// the target so a reader never observes a partial document.
async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = parent.join(format!(
        ".{}.docsync.tmp",
        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("README.md")
    ));

    tokio::fs::write(&tmp, content)
        .await
        .map_err(|e| SyncError::injection(path.display().to_string(), e))?;

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(SyncError::injection(path.display().to_string(), e));
    }
    Ok(())
}
