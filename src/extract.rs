//! Variable usage example extraction from parsed Java ASTs.
//!
//! Every method or constructor declaration becomes one example: the scope's
//! token stream with each occurrence of a locally declared variable replaced
//! by a numbered reference. Locals are formal parameters (including spread
//! parameters), local variable declarators, enhanced-for bindings, catch
//! clause parameters, try-with-resources bindings, and lambda parameters.
//! Identifiers in positions that cannot be a local read or write, such as
//! the field of a field access or the name of a method invocation, are left
//! as plain tokens.

use anyhow::Result;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use crate::ast::{AstNode, SourceAst, hash_file, parse_file};
use crate::cache::AstCache;
use crate::example::{ExampleToken, VarExample};

const SCOPE_KINDS: &[&str] = &["method_declaration", "constructor_declaration"];

pub fn extract_examples(ast: &SourceAst) -> Vec<VarExample> {
    let mut scopes = Vec::new();
    collect_scopes(&ast.root, &mut scopes);
    scopes.into_iter().map(example_for_scope).collect()
}

/// Extract examples for one source file, reusing the cached AST when it is
/// current and refreshing the cache entry otherwise.
pub fn from_source_file(path: &Path, cache: &AstCache) -> Result<Vec<VarExample>> {
    let key = path.to_string_lossy().to_string();
    let ast = match cache.get_ast(&key)? {
        Some(cached) if cached.content_hash == hash_file(path)? => cached,
        _ => {
            let parsed = parse_file(path)?;
            cache.put_ast(&key, &parsed)?;
            parsed
        }
    };
    Ok(extract_examples(&ast))
}

/// Outermost method-level scopes, in source order. Declarations nested
/// inside a scope (local classes, lambdas) stay part of the enclosing
/// example rather than becoming examples of their own.
fn collect_scopes<'a>(node: &'a AstNode, out: &mut Vec<&'a AstNode>) {
    if SCOPE_KINDS.contains(&node.kind.as_str()) {
        out.push(node);
        return;
    }
    for child in &node.children {
        collect_scopes(child, out);
    }
}

fn example_for_scope(scope: &AstNode) -> VarExample {
    let mut names = Vec::new();
    declared_names(scope, &mut names);

    let mut ids: HashMap<&str, u32> = HashMap::new();
    let mut variables = BTreeMap::new();
    for (idx, name) in names.iter().enumerate() {
        let id = idx as u32 + 1;
        ids.insert(name.as_str(), id);
        variables.insert(id, name.clone());
    }

    let mut tokens = Vec::new();
    collect_tokens(scope, &ids, &mut tokens);
    VarExample::new(tokens, variables)
}

fn declared_names(node: &AstNode, names: &mut Vec<String>) {
    match node.kind.as_str() {
        "formal_parameter"
        | "catch_formal_parameter"
        | "enhanced_for_statement"
        | "resource" => push_field_name(node, names),
        "local_variable_declaration" | "spread_parameter" => {
            for child in &node.children {
                if child.kind == "variable_declarator" {
                    push_field_name(child, names);
                }
            }
        }
        "lambda_expression" => {
            if let Some(params) = node
                .children
                .iter()
                .find(|c| c.field.as_deref() == Some("parameters"))
            {
                match params.kind.as_str() {
                    "identifier" => push_name(params.text.clone(), names),
                    "inferred_parameters" => {
                        for child in &params.children {
                            if child.kind == "identifier" {
                                push_name(child.text.clone(), names);
                            }
                        }
                    }
                    // formal_parameters are picked up by the recursion below
                    _ => {}
                }
            }
        }
        _ => {}
    }

    for child in &node.children {
        declared_names(child, names);
    }
}

fn push_field_name(node: &AstNode, names: &mut Vec<String>) {
    let name = node
        .children
        .iter()
        .find(|c| c.field.as_deref() == Some("name") && c.kind == "identifier")
        .and_then(|c| c.text.clone());
    push_name(name, names);
}

fn push_name(name: Option<String>, names: &mut Vec<String>) {
    if let Some(name) = name
        && !names.contains(&name)
    {
        names.push(name);
    }
}

fn collect_tokens(parent: &AstNode, ids: &HashMap<&str, u32>, out: &mut Vec<ExampleToken>) {
    for child in &parent.children {
        let Some(text) = &child.text else {
            collect_tokens(child, ids, out);
            continue;
        };

        if child.kind == "identifier"
            && !is_non_variable_position(parent, child)
            && let Some(id) = ids.get(text.as_str())
        {
            out.push(ExampleToken::Var(*id));
        } else {
            out.push(ExampleToken::Text(text.clone()));
        }
    }
}

/// Positions where an identifier can never resolve to a local variable.
fn is_non_variable_position(parent: &AstNode, child: &AstNode) -> bool {
    match parent.kind.as_str() {
        "field_access" => child.field.as_deref() == Some("field"),
        "method_invocation" | "method_declaration" | "constructor_declaration" => {
            child.field.as_deref() == Some("name")
        }
        // `recv::name` — only the receiver before `::` can be a variable.
        "method_reference" => parent
            .children
            .first()
            .is_none_or(|first| first.start != child.start),
        "scoped_identifier" | "annotation" | "marker_annotation" => true,
        "labeled_statement" | "break_statement" | "continue_statement" => true,
        _ => false,
    }
}
