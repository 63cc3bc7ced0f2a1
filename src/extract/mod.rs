//! Unit extraction: splits one source file into an ordered sequence of
//! nameable, summarizable units.
//!
//! Strategy selection is a lookup table keyed on the file extension:
//! extensions with a registered [`StructuralExtractor`] get top-level
//! declarations as units, everything else (and every structural failure)
//! falls back to token-budgeted chunk tiling. Extraction never fails
//! outward except for an unreadable file.

pub mod chunker;
mod go;
mod python;
mod rust_lang;
mod traits;
mod typescript;

pub use chunker::{chunk_units, estimate_tokens};
pub use traits::{Declaration, StructuralExtractor};

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{LlmConfig, PipelineConfig};
use crate::constants::budget;
use crate::types::{CodeUnit, Result, UnitKind};

/// Splitting thresholds for one extraction pass, derived from the active
/// backend's context window.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    /// Files at or below this estimated token count become one module unit
    pub single_pass_tokens: usize,
    /// Per-request token budget for chunk units
    pub chunk_budget_tokens: usize,
}

impl ExtractOptions {
    pub fn from_config(llm: &LlmConfig, pipeline: &PipelineConfig) -> Self {
        let input_tokens =
            (llm.context_tokens() as f64 * budget::INPUT_CODE_CTX_RATIO) as usize;
        Self {
            single_pass_tokens: pipeline.single_pass_tokens,
            chunk_budget_tokens: input_tokens.max(1),
        }
    }
}

/// Splits source files into ordered [`CodeUnit`] sequences.
pub struct UnitExtractor {
    registry: HashMap<&'static str, Arc<dyn StructuralExtractor>>,
}

impl UnitExtractor {
    /// Build the extractor with every bundled language registered.
    pub fn new() -> Self {
        let mut registry: HashMap<&'static str, Arc<dyn StructuralExtractor>> = HashMap::new();

        match python::PythonExtractor::new() {
            Ok(extractor) => {
                registry.insert("py", Arc::new(extractor));
            }
            Err(e) => warn!("Python extractor unavailable: {}", e),
        }
        match rust_lang::RustExtractor::new() {
            Ok(extractor) => {
                registry.insert("rs", Arc::new(extractor));
            }
            Err(e) => warn!("Rust extractor unavailable: {}", e),
        }
        match typescript::TypeScriptExtractor::new() {
            Ok(extractor) => {
                let shared: Arc<dyn StructuralExtractor> = Arc::new(extractor);
                for ext in ["ts", "tsx", "js", "jsx"] {
                    registry.insert(ext, Arc::clone(&shared));
                }
            }
            Err(e) => warn!("TypeScript extractor unavailable: {}", e),
        }
        match go::GoExtractor::new() {
            Ok(extractor) => {
                registry.insert("go", Arc::new(extractor));
            }
            Err(e) => warn!("Go extractor unavailable: {}", e),
        }

        Self { registry }
    }

    /// Extract units from a file on disk.
    ///
    /// The only error surfaced is an unreadable file; everything past the
    /// read is infallible by design.
    pub async fn extract(&self, path: &Path, opts: &ExtractOptions) -> Result<Vec<CodeUnit>> {
        let content = tokio::fs::read_to_string(path).await?;
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

        Ok(self.extract_source(&content, &file_name, &ext, opts))
    }

    /// Extract units from already-read source text.
    pub fn extract_source(
        &self,
        content: &str,
        file_name: &str,
        ext: &str,
        opts: &ExtractOptions,
    ) -> Vec<CodeUnit> {
        if estimate_tokens(content) <= opts.single_pass_tokens {
            return vec![CodeUnit::new(UnitKind::Module, file_name, content, 0)];
        }

        if let Some(extractor) = self.registry.get(ext) {
            match extractor.declarations(content) {
                Ok(decls) if !decls.is_empty() => {
                    debug!(
                        "{}: structural extraction found {} top-level declarations",
                        file_name,
                        decls.len()
                    );
                    return units_from_declarations(file_name, content, decls);
                }
                Ok(_) => {
                    debug!(
                        "{}: no top-level declarations, falling back to chunks",
                        file_name
                    );
                }
                Err(e) => {
                    debug!(
                        "{}: structural extraction failed ({}), falling back to chunks",
                        file_name, e
                    );
                }
            }
        }

        chunk_units(file_name, content, opts.chunk_budget_tokens)
    }
}

impl Default for UnitExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Split the file at declaration start boundaries.
///
/// Each declaration's segment runs to the start of the next declaration, so
/// trailing comments and interstitial statements stay attached and the
/// segments concatenate back to the original content. Text before the first
/// declaration becomes a preamble module unit.
fn units_from_declarations(
    file_name: &str,
    content: &str,
    mut decls: Vec<Declaration>,
) -> Vec<CodeUnit> {
    decls.sort_by_key(|d| d.start_byte);
    decls.retain(|d| d.start_byte <= content.len());

    let mut units = Vec::with_capacity(decls.len() + 1);
    let mut ordinal = 0;

    if let Some(first) = decls.first()
        && first.start_byte > 0
    {
        units.push(CodeUnit::new(
            UnitKind::Module,
            format!("{} (preamble)", file_name),
            &content[..first.start_byte],
            ordinal,
        ));
        ordinal += 1;
    }

    for (i, decl) in decls.iter().enumerate() {
        let end = decls
            .get(i + 1)
            .map(|next| next.start_byte)
            .unwrap_or(content.len());
        if end <= decl.start_byte {
            continue;
        }
        units.push(CodeUnit::new(
            decl.kind,
            decl.name.clone(),
            &content[decl.start_byte..end],
            ordinal,
        ));
        ordinal += 1;
    }

    if units.is_empty() {
        units.push(CodeUnit::new(UnitKind::Module, file_name, content, 0));
    }

    units
}
