use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::AnalyzerConfig;
use crate::error::TestsiftError;
use crate::rules::RuleId;

pub mod analyze;
pub mod args;
pub mod blocks;
pub mod classify;

#[derive(Debug, Parser)]
#[command(name = "testsift")]
#[command(version, about = "Static quality checks for JavaScript/TypeScript test files")]
#[command(
    long_about = "Static quality checks for JavaScript/TypeScript test files. Finds test blocks without Given/When/Then narration, files without boundary values, and throws assertions that never check the error message."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Run the rule pipeline over one or more test files")]
    Analyze(analyze::AnalyzeArgs),
    #[command(about = "List detected test blocks in a file")]
    Blocks(blocks::BlocksArgs),
    #[command(about = "Print the code-only projection of a file")]
    Classify(classify::ClassifyArgs),
    #[command(about = "Split the argument list of the call opening at a byte offset")]
    Args(args::ArgsArgs),
}

/// Configuration flags shared by the commands that run the scanner.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Configuration file (defaults to ./testsift.toml when present)"
    )]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn resolve(&self, rules: &[RuleId]) -> Result<AnalyzerConfig, TestsiftError> {
        Ok(AnalyzerConfig::discover(self.config.as_deref())?.with_rules(rules.to_vec()))
    }
}

pub(crate) fn read_source(path: &Path) -> Result<String, TestsiftError> {
    let bytes = fs::read(path).map_err(|error| TestsiftError::io(path, error))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read source file");
    String::from_utf8(bytes).map_err(|source| TestsiftError::InvalidUtf8 {
        path: path.display().to_string(),
        source,
    })
}
