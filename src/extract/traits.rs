//! Shared machinery for structural extractors.

use crate::types::{Result, SyncError, UnitKind};

/// A top-level declaration discovered by a structural extractor.
///
/// Only the start byte matters for unit formation: the file is split at
/// declaration start boundaries, so interstitial text (imports, preamble,
/// trailing comments) stays attached to a neighboring unit and the units'
/// concatenation reproduces the file.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub kind: UnitKind,
    pub name: String,
    pub start_byte: usize,
}

/// Language-specific structural decomposition.
///
/// An implementation reports where top-level declarations begin; a parse
/// failure or an empty result makes the caller fall back to chunking, it
/// is never surfaced further.
pub trait StructuralExtractor: Send + Sync {
    /// Language name for logging
    fn language(&self) -> &'static str;

    /// Top-level declarations in source order
    fn declarations(&self, content: &str) -> Result<Vec<Declaration>>;
}

/// Decides whether a top-level node is a declaration worth naming.
/// Returns the unit kind and the node holding the declaration's name.
pub(crate) type Classifier =
    for<'a> fn(node: &tree_sitter::Node<'a>) -> Option<(UnitKind, Option<tree_sitter::Node<'a>>)>;

/// Create a tree-sitter parser for the given language.
/// This helper reduces boilerplate in language-specific extractors.
pub(crate) fn create_ts_parser<L: Into<tree_sitter::Language>>(
    language: L,
    lang_name: &str,
) -> Result<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.into())
        .map_err(|e| SyncError::Parse {
            message: format!("failed to set {} language: {}", lang_name, e),
            path: String::new(),
        })?;
    Ok(parser)
}

/// Extract text content from a tree-sitter node.
/// Returns empty string if extraction fails (with debug logging).
#[inline]
pub(crate) fn get_node_text<'a>(node: tree_sitter::Node, content: &'a [u8]) -> &'a str {
    node.utf8_text(content).unwrap_or_else(|e| {
        tracing::debug!(
            "UTF-8 extraction failed at {}:{}: {}",
            node.start_position().row + 1,
            node.start_position().column,
            e
        );
        ""
    })
}

/// Parse `content` and collect top-level declarations using `classify`.
///
/// Shared walker for all language extractors: iterates the named children
/// of the root node in source order, which is exactly the set of top-level
/// declarations plus preamble statements.
pub(crate) fn walk_top_level<L: Into<tree_sitter::Language>>(
    language: L,
    lang_name: &'static str,
    content: &str,
    classify: Classifier,
) -> Result<Vec<Declaration>> {
    let mut parser = create_ts_parser(language, lang_name)?;
    let tree = parser.parse(content, None).ok_or_else(|| SyncError::Parse {
        message: format!("failed to parse {} source", lang_name),
        path: String::new(),
    })?;

    let root = tree.root_node();
    let bytes = content.as_bytes();
    let mut declarations = Vec::new();

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if let Some((kind, name_node)) = classify(&child) {
            let name = name_node
                .map(|n| get_node_text(n, bytes).to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("{} @ line {}", kind, child.start_position().row + 1));

            declarations.push(Declaration {
                kind,
                name,
                start_byte: child.start_byte(),
            });
        }
    }

    Ok(declarations)
}
