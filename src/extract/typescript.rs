//! TypeScript/JavaScript structural extractor.
//!
//! The TypeScript grammar parses plain JavaScript as well, so one extractor
//! serves ts/tsx/js/jsx.

use tree_sitter::Node;

use super::traits::{Declaration, StructuralExtractor, create_ts_parser, walk_top_level};
use crate::types::{Result, UnitKind};

pub struct TypeScriptExtractor;

impl TypeScriptExtractor {
    pub fn new() -> Result<Self> {
        let _ = create_ts_parser(
            tree_sitter_typescript::LANGUAGE_TSX,
            "TypeScript",
        )?;
        Ok(Self)
    }
}

impl StructuralExtractor for TypeScriptExtractor {
    fn language(&self) -> &'static str {
        "TypeScript"
    }

    fn declarations(&self, content: &str) -> Result<Vec<Declaration>> {
        // TSX grammar is a superset covering JSX syntax
        walk_top_level(
            tree_sitter_typescript::LANGUAGE_TSX,
            "TypeScript",
            content,
            classify,
        )
    }
}

fn classify<'a>(node: &Node<'a>) -> Option<(UnitKind, Option<Node<'a>>)> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            Some((UnitKind::Function, node.child_by_field_name("name")))
        }
        "class_declaration" | "abstract_class_declaration" => {
            Some((UnitKind::Class, node.child_by_field_name("name")))
        }
        "interface_declaration" | "enum_declaration" | "type_alias_declaration" => {
            Some((UnitKind::Class, node.child_by_field_name("name")))
        }
        // `export function f() {}` wraps the declaration
        "export_statement" => {
            let inner = node.child_by_field_name("declaration")?;
            let (kind, name) = classify(&inner)?;
            Some((kind, name))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
import { api } from './api';

const BASE = '/v1';

export function fetchUser(id: string) {
    return api.get(`${BASE}/users/${id}`);
}

export class UserStore {
    private users = new Map<string, object>();
}

interface User {
    id: string;
}

function internalHelper() {
    return BASE;
}
";

    #[test]
    fn test_top_level_declarations() {
        let extractor = TypeScriptExtractor::new().unwrap();
        let decls = extractor.declarations(SOURCE).unwrap();

        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["fetchUser", "UserStore", "User", "internalHelper"]
        );
        assert_eq!(decls[0].kind, UnitKind::Function);
        assert_eq!(decls[1].kind, UnitKind::Class);
        assert_eq!(decls[2].kind, UnitKind::Class);
    }

    #[test]
    fn test_export_keyword_included_in_boundary() {
        let extractor = TypeScriptExtractor::new().unwrap();
        let decls = extractor.declarations(SOURCE).unwrap();

        let fetch = decls.iter().find(|d| d.name == "fetchUser").unwrap();
        assert!(SOURCE[fetch.start_byte..].starts_with("export function"));
    }

    #[test]
    fn test_plain_javascript_parses() {
        let extractor = TypeScriptExtractor::new().unwrap();
        let decls = extractor
            .declarations("function add(a, b) { return a + b; }\n")
            .unwrap();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "add");
    }
}
