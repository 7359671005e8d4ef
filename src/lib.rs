//! # var-miner
//!
//! Mine variable usage examples from Java source trees for ML training.
//!
//! ## Architecture
//!
//! - **walk**: Java source discovery, grouped per directory for deterministic runs
//! - **ast**: tree-sitter-java parsing into a serializable AST
//! - **cache**: Persistent AST storage using LMDB, keyed by source path
//! - **extract**: Per-method variable usage example extraction
//! - **example**: The VarExample record and its `.eg.tsv` encoding
//! - **config**: Cache db resolution and CLI argument validation
//! - **cli**: Command-line definitions

pub mod ast;
pub mod cache;
pub mod cli;
pub mod config;
pub mod example;
pub mod extract;
pub mod walk;
