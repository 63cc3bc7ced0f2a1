//! Rust structural extractor.

use tree_sitter::Node;

use super::traits::{Declaration, StructuralExtractor, create_ts_parser, walk_top_level};
use crate::types::{Result, UnitKind};

pub struct RustExtractor;

impl RustExtractor {
    pub fn new() -> Result<Self> {
        let _ = create_ts_parser(tree_sitter_rust::LANGUAGE, "Rust")?;
        Ok(Self)
    }
}

impl StructuralExtractor for RustExtractor {
    fn language(&self) -> &'static str {
        "Rust"
    }

    fn declarations(&self, content: &str) -> Result<Vec<Declaration>> {
        walk_top_level(tree_sitter_rust::LANGUAGE, "Rust", content, classify)
    }
}

fn classify<'a>(node: &Node<'a>) -> Option<(UnitKind, Option<Node<'a>>)> {
    match node.kind() {
        "function_item" => Some((UnitKind::Function, node.child_by_field_name("name"))),
        "struct_item" | "enum_item" | "trait_item" | "union_item" => {
            Some((UnitKind::Class, node.child_by_field_name("name")))
        }
        "impl_item" => Some((UnitKind::Class, node.child_by_field_name("type"))),
        "mod_item" => Some((UnitKind::Module, node.child_by_field_name("name"))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
use std::fmt;

pub struct Counter {
    value: u64,
}

impl Counter {
    pub fn incr(&mut self) {
        self.value += 1;
    }
}

pub fn reset(counter: &mut Counter) {
    counter.value = 0;
}

pub trait Tick {
    fn tick(&mut self);
}
";

    #[test]
    fn test_top_level_declarations() {
        let extractor = RustExtractor::new().unwrap();
        let decls = extractor.declarations(SOURCE).unwrap();

        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Counter", "Counter", "reset", "Tick"]);
        assert_eq!(decls[0].kind, UnitKind::Class);
        assert_eq!(decls[2].kind, UnitKind::Function);
    }

    #[test]
    fn test_methods_not_top_level() {
        let extractor = RustExtractor::new().unwrap();
        let decls = extractor.declarations(SOURCE).unwrap();
        assert!(!decls.iter().any(|d| d.name == "incr"));
    }
}
