//! Python structural extractor.

use tree_sitter::Node;

use super::traits::{Declaration, StructuralExtractor, create_ts_parser, walk_top_level};
use crate::types::{Result, UnitKind};

pub struct PythonExtractor;

impl PythonExtractor {
    pub fn new() -> Result<Self> {
        // Validate that the language is available
        let _ = create_ts_parser(tree_sitter_python::LANGUAGE, "Python")?;
        Ok(Self)
    }
}

impl StructuralExtractor for PythonExtractor {
    fn language(&self) -> &'static str {
        "Python"
    }

    fn declarations(&self, content: &str) -> Result<Vec<Declaration>> {
        walk_top_level(tree_sitter_python::LANGUAGE, "Python", content, classify)
    }
}

fn classify<'a>(node: &Node<'a>) -> Option<(UnitKind, Option<Node<'a>>)> {
    match node.kind() {
        "function_definition" => Some((UnitKind::Function, node.child_by_field_name("name"))),
        "class_definition" => Some((UnitKind::Class, node.child_by_field_name("name"))),
        // Decorators belong to the declaration they annotate
        "decorated_definition" => {
            let inner = node.child_by_field_name("definition")?;
            let (kind, name) = classify(&inner)?;
            Some((kind, name))
        }
        _ => None,
    }
}
