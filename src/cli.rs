use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "var-miner")]
#[command(about = "Mine variable usage examples from Java source trees with a persistent AST cache")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, value_name = "FILE")]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Parse every *.java file under the data path and store its AST in the cache.
    Cache {
        #[arg(long, value_name = "DIR")]
        data_path: PathBuf,
    },
    /// Extract variable usage examples and write one <file>.eg.tsv per source file.
    Examples {
        #[arg(long, value_name = "DIR", default_value = "data/corpora")]
        input_path: PathBuf,

        #[arg(long, value_name = "DIR", default_value = "data/examples")]
        output_path: PathBuf,

        #[arg(long, value_name = "BOOL", default_value_t = false, action = clap::ArgAction::Set)]
        cache_only: bool,

        #[arg(long, value_name = "LANG", default_value = "java")]
        language: String,
    },
    Stats,
    Clear,
}
