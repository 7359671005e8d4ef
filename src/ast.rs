//! Java source parsing into a cacheable AST.
//!
//! Wraps tree-sitter-java and converts the parse tree into an owned,
//! serde-serializable node tree so parsed files can round-trip through the
//! persistent cache as JSON. Leaf nodes carry their token text, which makes
//! example extraction possible without re-reading the source file.

use anyhow::{Context, Result};
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstNode {
    pub kind: String,
    pub start: usize,
    pub end: usize,
    /// Grammar field name this node occupies in its parent, e.g. the
    /// `name` of a method_declaration or the `field` of a field_access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Token text, present on leaf nodes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAst {
    pub content_hash: String,
    pub root: AstNode,
}

/// Parse Java source bytes. tree-sitter is error-tolerant, so sources with
/// syntax errors still yield a usable tree; only non-UTF-8 content or a
/// parser failure is an error.
pub fn parse_source(source: &[u8]) -> Result<SourceAst> {
    std::str::from_utf8(source).context("Source file is not valid UTF-8")?;

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .context("Failed to load the Java grammar")?;
    let tree = parser
        .parse(source, None)
        .context("Parser produced no tree")?;

    Ok(SourceAst {
        content_hash: hash_content(source),
        root: convert(tree.root_node(), source),
    })
}

pub fn parse_file(path: &Path) -> Result<SourceAst> {
    let bytes = read_file(path)?;
    parse_source(bytes.as_ref())
        .with_context(|| format!("Failed to parse: {}", path.display()))
}

pub fn hash_file(path: &Path) -> Result<String> {
    Ok(hash_content(read_file(path)?.as_ref()))
}

pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

enum SourceBytes {
    Mapped(Mmap),
    Empty,
}

impl AsRef<[u8]> for SourceBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            SourceBytes::Mapped(mmap) => mmap,
            SourceBytes::Empty => &[],
        }
    }
}

fn read_file(path: &Path) -> Result<SourceBytes> {
    let file =
        File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat: {}", path.display()))?
        .len();
    // zero-length files cannot be mapped
    if len == 0 {
        return Ok(SourceBytes::Empty);
    }
    let mmap = unsafe {
        Mmap::map(&file).with_context(|| format!("mmap failed: {}", path.display()))?
    };
    Ok(SourceBytes::Mapped(mmap))
}

fn convert(node: Node, source: &[u8]) -> AstNode {
    let mut children = Vec::new();
    for i in 0..node.child_count() {
        let Some(child) = node.child(i as u32) else {
            continue;
        };
        if matches!(child.kind(), "line_comment" | "block_comment") {
            continue;
        }
        let mut converted = convert(child, source);
        converted.field = node
            .field_name_for_child(i as u32)
            .map(|name| name.to_string());
        children.push(converted);
    }

    let text = if node.child_count() == 0 {
        Some(node.utf8_text(source).unwrap_or("").to_string())
    } else {
        None
    };

    AstNode {
        kind: node.kind().to_string(),
        start: node.start_byte(),
        end: node.end_byte(),
        field: None,
        text,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(node: &AstNode, out: &mut Vec<String>) {
        if let Some(text) = &node.text {
            out.push(text.clone());
        }
        for child in &node.children {
            tokens(child, out);
        }
    }

    #[test]
    fn parse_source_builds_program_tree() {
        let source = b"package org.example;\n\npublic class Foo {\n    int count;\n}\n";
        let ast = parse_source(source).unwrap();
        assert_eq!(ast.root.kind, "program");
        assert_eq!(ast.content_hash.len(), 64);

        let mut toks = Vec::new();
        tokens(&ast.root, &mut toks);
        assert!(toks.contains(&"class".to_string()));
        assert!(toks.contains(&"Foo".to_string()));
        assert!(toks.contains(&"count".to_string()));
    }

    #[test]
    fn parse_source_drops_comments() {
        let source = b"// header comment\npublic class Foo { /* inner */ }\n";
        let ast = parse_source(source).unwrap();

        let mut toks = Vec::new();
        tokens(&ast.root, &mut toks);
        assert!(!toks.iter().any(|t| t.contains("comment")));
        assert!(!toks.iter().any(|t| t.contains("inner")));
    }

    #[test]
    fn parse_source_records_grammar_fields() {
        let source = b"class Foo { void run() {} }";
        let ast = parse_source(source).unwrap();

        let class_decl = ast
            .root
            .children
            .iter()
            .find(|c| c.kind == "class_declaration")
            .unwrap();
        let name = class_decl
            .children
            .iter()
            .find(|c| c.field.as_deref() == Some("name"))
            .unwrap();
        assert_eq!(name.text.as_deref(), Some("Foo"));
    }

    #[test]
    fn parse_source_rejects_non_utf8() {
        assert!(parse_source(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn parse_source_tolerates_syntax_errors() {
        let ast = parse_source(b"class { { {").unwrap();
        assert_eq!(ast.root.kind, "program");
    }

    #[test]
    fn source_ast_round_trips_through_json() {
        let source = b"class Foo { int x = 1; }";
        let ast = parse_source(source).unwrap();
        let json = serde_json::to_string(&ast).unwrap();
        let back: SourceAst = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content_hash, ast.content_hash);

        let (mut a, mut b) = (Vec::new(), Vec::new());
        tokens(&ast.root, &mut a);
        tokens(&back.root, &mut b);
        assert_eq!(a, b);
    }
}
