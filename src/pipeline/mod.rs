//! Batch orchestrator: drives a set of files through summarization and
//! injection with bounded parallelism and per-file failure isolation.
//!
//! Flow per batch: prune stale doc sections per directory, preload the
//! local model once, then fan files out. Only a completed Summary is ever
//! handed to the injector, so a half-finished file cannot corrupt a
//! documentation file.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use tracing::{info, warn};

use crate::ai::GenerationGateway;
use crate::config::{Backend, Config};
use crate::constants::doc::DOC_FILE_NAME;
use crate::inject::DocInjector;
use crate::summarize::Summarizer;

/// Per-file result in a batch; nothing is silently dropped.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Summarized and injected; `degraded_units > 0` means placeholder
    /// blurbs stand in for some units
    Summarized { degraded_units: usize },
    /// Summarization or injection failed for this file only
    Failed { reason: String },
    /// Batch was aborted before this file started
    Skipped,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Summarized { .. })
    }
}

/// Everything a batch caller learns about a run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(PathBuf, FileOutcome)>,
    pub aborted: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, FileOutcome::Failed { .. }))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && !self.aborted
    }
}

/// Batch-level tuning.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Concurrent files in flight
    pub file_workers: usize,
    /// Warm the model once before fanning out
    pub preload: bool,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            file_workers: config.pipeline.file_workers_for(config.llm.backend),
            preload: config.llm.backend == Backend::Ollama,
        }
    }
}

pub struct Pipeline {
    summarizer: Arc<Summarizer>,
    injector: Arc<DocInjector>,
    gateway: Arc<GenerationGateway>,
    opts: PipelineOptions,
    abort: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(
        summarizer: Arc<Summarizer>,
        injector: Arc<DocInjector>,
        gateway: Arc<GenerationGateway>,
        opts: PipelineOptions,
    ) -> Self {
        Self {
            summarizer,
            injector,
            gateway,
            opts,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cooperative cancellation handle: setting it stops new files from
    /// starting; in-flight unit calls finish or time out on their own.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Run the batch. Per-file failures are reported, never propagated to
    /// sibling files.
    pub async fn run(&self, files: Vec<PathBuf>) -> BatchReport {
        let files: Vec<PathBuf> = files.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        if files.is_empty() {
            return BatchReport::default();
        }

        self.prune_stale_sections(&files).await;

        if self.opts.preload {
            // One warm call before fanning out, so concurrent first calls
            // don't all pay the cold-start latency
            if !self.gateway.preload().await {
                warn!("model preload failed; continuing, retries will cover it");
            }
        }

        info!(
            "summarizing {} files with up to {} workers",
            files.len(),
            self.opts.file_workers
        );

        let mut outcomes: Vec<(PathBuf, FileOutcome)> =
            futures::stream::iter(files.into_iter())
                .map(|path| {
                    let summarizer = Arc::clone(&self.summarizer);
                    let injector = Arc::clone(&self.injector);
                    let abort = Arc::clone(&self.abort);
                    async move {
                        if abort.load(Ordering::SeqCst) {
                            return (path, FileOutcome::Skipped);
                        }
                        let outcome = process_file(&summarizer, &injector, &path).await;
                        (path, outcome)
                    }
                })
                .buffer_unordered(self.opts.file_workers.max(1))
                .collect()
                .await;

        outcomes.sort_by(|(a, _), (b, _)| a.cmp(b));

        BatchReport {
            outcomes,
            aborted: self.abort.load(Ordering::SeqCst),
        }
    }

    /// Remove doc sections whose source file is no longer in the batch's
    /// directories before writing anything new.
    async fn prune_stale_sections(&self, files: &[PathBuf]) {
        let mut by_dir: HashMap<PathBuf, HashSet<String>> = HashMap::new();
        for file in files {
            let (Some(parent), Some(name)) = (
                file.parent(),
                file.file_name().and_then(|n| n.to_str()),
            ) else {
                continue;
            };
            by_dir
                .entry(parent.to_path_buf())
                .or_default()
                .insert(name.to_string());
        }

        for (dir, valid_anchors) in by_dir {
            let doc_path = dir.join(DOC_FILE_NAME);
            if let Err(e) = self.injector.prune(&doc_path, &valid_anchors).await {
                warn!("pre-run prune of {} failed: {}", doc_path.display(), e);
            }
        }
    }
}

async fn process_file(
    summarizer: &Summarizer,
    injector: &DocInjector,
    path: &Path,
) -> FileOutcome {
    let summary = match summarizer.summarize(path).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("failed to summarize {}: {}", path.display(), e);
            return FileOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    let (Some(parent), Some(anchor)) =
        (path.parent(), path.file_name().and_then(|n| n.to_str()))
    else {
        return FileOutcome::Failed {
            reason: "path has no parent directory".to_string(),
        };
    };

    let doc_path = parent.join(DOC_FILE_NAME);
    match injector.inject(&doc_path, anchor, &summary.body).await {
        Ok(()) => FileOutcome::Summarized {
            degraded_units: summary.degraded_units,
        },
        Err(e) => {
            warn!("failed to inject {} into {}: {}", anchor, doc_path.display(), e);
            FileOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
