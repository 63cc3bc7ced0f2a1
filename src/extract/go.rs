//! Go structural extractor.

use tree_sitter::Node;

use super::traits::{Declaration, StructuralExtractor, create_ts_parser, walk_top_level};
use crate::types::{Result, UnitKind};

pub struct GoExtractor;

impl GoExtractor {
    pub fn new() -> Result<Self> {
        let _ = create_ts_parser(tree_sitter_go::LANGUAGE, "Go")?;
        Ok(Self)
    }
}

impl StructuralExtractor for GoExtractor {
    fn language(&self) -> &'static str {
        "Go"
    }

    fn declarations(&self, content: &str) -> Result<Vec<Declaration>> {
        walk_top_level(tree_sitter_go::LANGUAGE, "Go", content, classify)
    }
}

fn classify<'a>(node: &Node<'a>) -> Option<(UnitKind, Option<Node<'a>>)> {
    match node.kind() {
        "function_declaration" | "method_declaration" => {
            Some((UnitKind::Function, node.child_by_field_name("name")))
        }
        // `type Foo struct { ... }` nests the name inside a type_spec
        "type_declaration" => {
            let mut cursor = node.walk();
            let name = node
                .named_children(&mut cursor)
                .find(|c| c.kind() == "type_spec")
                .and_then(|spec| spec.child_by_field_name("name"));
            Some((UnitKind::Class, name))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
package store

import \"sync\"

type Store struct {
    mu   sync.Mutex
    data map[string]string
}

func NewStore() *Store {
    return &Store{data: map[string]string{}}
}

func (s *Store) Get(key string) string {
    s.mu.Lock()
    defer s.mu.Unlock()
    return s.data[key]
}
";

    #[test]
    fn test_top_level_declarations() {
        let extractor = GoExtractor::new().unwrap();
        let decls = extractor.declarations(SOURCE).unwrap();

        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Store", "NewStore", "Get"]);
        assert_eq!(decls[0].kind, UnitKind::Class);
        assert_eq!(decls[1].kind, UnitKind::Function);
        assert_eq!(decls[2].kind, UnitKind::Function);
    }
}
