//! Summarizer: drives one file through extraction, fans unit prompts out
//! to the gateway under a concurrency bound, and rolls the unit blurbs up
//! into one cohesive file summary.

pub mod prompts;

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::ai::GenerationGateway;
use crate::config::Config;
use crate::extract::{ExtractOptions, UnitExtractor};
use crate::types::{CodeUnit, Result, Summary};

/// Tuning for one summarization run.
#[derive(Debug, Clone, Copy)]
pub struct SummarizerOptions {
    pub extract: ExtractOptions,
    /// Concurrent unit-level generation calls within one file
    pub unit_workers: usize,
    /// Character budget for the source snippet embedded in a prompt
    pub input_char_budget: usize,
}

impl SummarizerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            extract: ExtractOptions::from_config(&config.llm, &config.pipeline),
            unit_workers: config.pipeline.unit_workers.max(1),
            input_char_budget: config.llm.input_char_budget(),
        }
    }
}

pub struct Summarizer {
    gateway: Arc<GenerationGateway>,
    extractor: Arc<UnitExtractor>,
    opts: SummarizerOptions,
}

impl Summarizer {
    pub fn new(
        gateway: Arc<GenerationGateway>,
        extractor: Arc<UnitExtractor>,
        opts: SummarizerOptions,
    ) -> Self {
        Self {
            gateway,
            extractor,
            opts,
        }
    }

    /// Summarize one source file.
    ///
    /// Errors are recoverable per-file: an unreadable file or an exhausted
    /// generation budget fails this file only, never a batch. Individual
    /// unit failures degrade to placeholder blurbs and the file continues.
    pub async fn summarize(&self, path: &Path) -> Result<Summary> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let units = self.extractor.extract(path, &self.opts.extract).await?;

        // Units concatenate back to the file content, so this is the source
        let source: String = units.iter().map(|u| u.text.as_str()).collect();

        if source.trim().is_empty() || is_comment_only(&source, &ext) {
            debug!("{}: empty or comment-only, using canned blurb", file_name);
            return Ok(Summary::new(path, prompts::empty_file(&file_name)));
        }

        if units.len() == 1 {
            let snippet = prompts::truncate(&units[0].text, self.opts.input_char_budget);
            let body = self
                .gateway
                .invoke(&prompts::whole_file(&file_name, &ext, snippet))
                .await?;
            return Ok(Summary::new(path, body));
        }

        let (blurbs, degraded) = self.summarize_units(&file_name, &units).await;

        let body = match self
            .gateway
            .invoke(&prompts::rollup(&file_name, &blurbs))
            .await
        {
            Ok(body) => body,
            Err(e) => {
                // Last resort: summarize the raw source directly. Covers
                // pathological cases where every blurb degraded and the
                // rollup has nothing to work with.
                warn!(
                    "{}: rollup failed ({}), retrying with direct prompt",
                    file_name, e
                );
                let snippet = prompts::truncate(&source, self.opts.input_char_budget);
                self.gateway
                    .invoke(&prompts::direct_retry(&file_name, &ext, snippet))
                    .await?
            }
        };

        Ok(Summary::new(path, body).with_degraded(degraded))
    }

    /// Fan unit prompts out under the worker bound.
    ///
    /// Results are reassembled by ordinal, so the completion order of
    /// concurrent calls never affects the rollup.
    async fn summarize_units(&self, file_name: &str, units: &[CodeUnit]) -> (Vec<String>, usize) {
        let mut indexed: Vec<(usize, String, bool)> = futures::stream::iter(units.iter())
            .map(|unit| {
                let gateway = Arc::clone(&self.gateway);
                let snippet = prompts::truncate(&unit.text, self.opts.input_char_budget);
                let prompt = prompts::unit(file_name, unit, snippet);
                async move {
                    match gateway.invoke(&prompt).await {
                        Ok(text) => (unit.ordinal, text, false),
                        Err(e) => {
                            warn!(
                                "{}: unit '{}' degraded to placeholder: {}",
                                file_name, unit.name, e
                            );
                            (unit.ordinal, prompts::degraded_unit(unit, &e.to_string()), true)
                        }
                    }
                }
            })
            .buffer_unordered(self.opts.unit_workers)
            .collect()
            .await;

        indexed.sort_by_key(|(ordinal, _, _)| *ordinal);

        let degraded = indexed.iter().filter(|(_, _, degraded)| *degraded).count();
        let blurbs = indexed.into_iter().map(|(_, blurb, _)| blurb).collect();

        (blurbs, degraded)
    }
}

/// True when every non-blank line is a comment for the given language.
fn is_comment_only(source: &str, ext: &str) -> bool {
    let leaders: &[&str] = match ext {
        "py" | "rb" => &["#"],
        "rs" | "go" | "c" | "h" | "cpp" | "hpp" | "cxx" | "hxx" | "java" | "cs" | "js"
        | "jsx" | "ts" | "tsx" | "php" => &["//", "/*", "*", "*/"],
        _ => return false,
    };

    let mut saw_comment = false;
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !leaders.iter().any(|leader| trimmed.starts_with(leader)) {
            return false;
        }
        saw_comment = true;
    }
    saw_comment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::testing::ScriptedProvider;
    use crate::ai::{GenerationCache, RetryPolicy};
    use crate::types::ErrorCategory;
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            model_loading_delay: Duration::from_millis(2),
            max_delay: Duration::from_millis(5),
        }
    }

    fn summarizer_with(provider: Arc<ScriptedProvider>, single_pass_tokens: usize) -> Summarizer {
        let gateway = Arc::new(GenerationGateway::new(
            provider,
            Arc::new(GenerationCache::new()),
            fast_policy(),
        ));
        Summarizer::new(
            gateway,
            Arc::new(UnitExtractor::new()),
            SummarizerOptions {
                extract: ExtractOptions {
                    single_pass_tokens,
                    chunk_budget_tokens: 1_024,
                },
                unit_workers: 4,
                input_char_budget: 100_000,
            },
        )
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn multi_function_python() -> String {
        let mut source = String::from("import json\n\n");
        for i in 0..3 {
            source.push_str(&format!(
                "def handler_{i}(payload):\n    data = json.loads(payload)\n    return data['k{i}']\n\n"
            ));
        }
        source
    }

    #[tokio::test]
    async fn test_single_unit_file_issues_one_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "small.py", "def f():\n    return 1\n");

        let provider = Arc::new(ScriptedProvider::succeeding().with_default_reply("one summary"));
        let summarizer = summarizer_with(Arc::clone(&provider), 2_048);

        let summary = summarizer.summarize(&path).await.unwrap();
        assert_eq!(summary.body, "one summary");
        assert!(summary.is_complete());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_file_uses_canned_blurb_without_calls() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.py", "");

        let provider = Arc::new(ScriptedProvider::succeeding());
        let summarizer = summarizer_with(Arc::clone(&provider), 2_048);

        let summary = summarizer.summarize(&path).await.unwrap();
        assert!(summary.body.contains("empty.py"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_comment_only_file_uses_canned_blurb() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.py", "# just notes\n# more notes\n");

        let provider = Arc::new(ScriptedProvider::succeeding());
        let summarizer = summarizer_with(Arc::clone(&provider), 2_048);

        let summary = summarizer.summarize(&path).await.unwrap();
        assert!(summary.body.contains("comments"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_multi_unit_file_fans_out_and_rolls_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "handlers.py", &multi_function_python());

        let provider = Arc::new(ScriptedProvider::succeeding().with_default_reply("blurb"));
        // Low threshold forces decomposition: preamble + 3 functions
        let summarizer = summarizer_with(Arc::clone(&provider), 10);

        let summary = summarizer.summarize(&path).await.unwrap();
        assert!(summary.is_complete());
        // 4 unit calls plus 1 rollup
        assert_eq!(provider.calls(), 5);
    }

    #[tokio::test]
    async fn test_failed_unit_degrades_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "handlers.py", &multi_function_python());

        // handler_1's unit prompt permanently fails; everything else works
        let provider = Arc::new(
            ScriptedProvider::succeeding()
                .with_default_reply("blurb")
                .poison("named 'handler_1'", ErrorCategory::Transient),
        );
        let summarizer = summarizer_with(Arc::clone(&provider), 10);

        let summary = summarizer.summarize(&path).await.unwrap();
        assert_eq!(summary.degraded_units, 1);
        assert!(!summary.is_complete());
        // The rollup still ran and produced a body
        assert_eq!(summary.body, "blurb");
    }

    #[tokio::test]
    async fn test_rollup_failure_falls_back_to_direct_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "handlers.py", &multi_function_python());

        let provider = Arc::new(
            ScriptedProvider::succeeding()
                .with_default_reply("direct summary")
                .poison("partial explanations", ErrorCategory::Transient),
        );
        let summarizer = summarizer_with(Arc::clone(&provider), 10);

        let summary = summarizer.summarize(&path).await.unwrap();
        assert_eq!(summary.body, "direct summary");
    }

    #[tokio::test]
    async fn test_fatal_single_unit_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "small.py", "def f():\n    return 1\n");

        let provider = Arc::new(
            ScriptedProvider::succeeding().poison("small.py", ErrorCategory::Auth),
        );
        let summarizer = summarizer_with(Arc::clone(&provider), 2_048);

        assert!(summarizer.summarize(&path).await.is_err());
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("# a\n\n# b\n", "py"));
        assert!(is_comment_only("// a\n/* b */\n", "rs"));
        assert!(!is_comment_only("# a\nx = 1\n", "py"));
        assert!(!is_comment_only("", "py"));
        // Unknown languages never match
        assert!(!is_comment_only("# a\n", "css"));
    }
}
