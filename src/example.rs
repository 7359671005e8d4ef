//! The variable usage example record and its TSV encoding.
//!
//! An example is the token stream of one method-level scope in which local
//! variable occurrences have been replaced by numbered references, plus the
//! table mapping each number back to the original name. One `.eg.tsv` line
//! per example: column one is the variable table (`id:name` pairs joined by
//! commas), column two the space-joined token stream with variable
//! references rendered as `%{id}`.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExampleToken {
    Text(String),
    Var(u32),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarExample {
    tokens: Vec<ExampleToken>,
    variables: BTreeMap<u32, String>,
}

impl VarExample {
    pub fn new(tokens: Vec<ExampleToken>, variables: BTreeMap<u32, String>) -> Self {
        Self { tokens, variables }
    }

    pub fn tokens(&self) -> &[ExampleToken] {
        &self.tokens
    }

    pub fn variables(&self) -> &BTreeMap<u32, String> {
        &self.variables
    }

    pub fn encode_line(&self) -> String {
        let table = self
            .variables
            .iter()
            .map(|(id, name)| format!("{id}:{name}"))
            .collect::<Vec<_>>()
            .join(",");

        let tokens = self
            .tokens
            .iter()
            .map(|t| match t {
                ExampleToken::Var(id) => format!("%{{{id}}}"),
                ExampleToken::Text(text) => escape_token(text),
            })
            .collect::<Vec<_>>()
            .join(" ");

        format!("{table}\t{tokens}")
    }

    pub fn parse_line(line: &str) -> Result<Self> {
        let (table, tokens) = line
            .split_once('\t')
            .context("Example line has no tab separator")?;

        let mut variables = BTreeMap::new();
        for entry in table.split(',').filter(|e| !e.is_empty()) {
            let (id, name) = entry
                .split_once(':')
                .with_context(|| format!("Malformed variable entry: {entry}"))?;
            let id: u32 = id
                .parse()
                .with_context(|| format!("Malformed variable id: {entry}"))?;
            variables.insert(id, name.to_string());
        }

        let mut parsed = Vec::new();
        for token in tokens.split(' ').filter(|t| !t.is_empty()) {
            if let Some(id) = token
                .strip_prefix("%{")
                .and_then(|rest| rest.strip_suffix('}'))
            {
                let id: u32 = id
                    .parse()
                    .with_context(|| format!("Malformed variable reference: {token}"))?;
                parsed.push(ExampleToken::Var(id));
            } else {
                parsed.push(ExampleToken::Text(unescape_token(token)?));
            }
        }

        Ok(Self {
            tokens: parsed,
            variables,
        })
    }

    /// Write one line per example. The file is created even when the
    /// example list is empty, so every processed source file has a
    /// corresponding output file.
    pub fn serialize_to_file(path: &Path, examples: &[VarExample]) -> Result<()> {
        let mut out = String::new();
        for example in examples {
            out.push_str(&example.encode_line());
            out.push('\n');
        }
        std::fs::write(path, out)
            .with_context(|| format!("Failed to write examples: {}", path.display()))
    }
}

fn escape_token(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ' ' => out.push_str("\\s"),
            '%' => out.push_str("\\%"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_token(token: &str) -> Result<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('s') => out.push(' '),
            Some('%') => out.push('%'),
            other => bail!("Malformed escape in token {token}: {other:?}"),
        }
    }
    Ok(out)
}
