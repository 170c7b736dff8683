use std::path::PathBuf;

use clap::Args;
use glob::Pattern;
use serde::Serialize;

use super::{ConfigArgs, read_source};
use crate::error::TestsiftError;
use crate::lexer::classify;
use crate::structure::{StructureScanner, TestBlock};

#[derive(Debug, Args)]
pub struct BlocksArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    #[arg(
        long,
        value_name = "GLOB",
        help = "Optional glob pattern over test block names"
    )]
    pub name: Option<String>,
    #[arg(long, help = "Include the original source text of each block")]
    pub verbose: bool,
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct BlocksResponse {
    pub file: PathBuf,
    pub blocks: Vec<BlockSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub name: String,
    pub callee: String,
    pub start_line: usize,
    pub end_line: usize,
    pub leading_comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl BlockSummary {
    pub fn from_block(block: &TestBlock, verbose: bool) -> Self {
        Self {
            name: block.name.clone(),
            callee: block.callee.clone(),
            start_line: block.start_line,
            end_line: block.end_line,
            leading_comment: block.leading_comment.clone(),
            body: verbose.then(|| block.body_original.clone()),
        }
    }
}

pub fn run_blocks(args: BlocksArgs) -> Result<BlocksResponse, TestsiftError> {
    let compiled_name_pattern = args
        .name
        .as_deref()
        .map(Pattern::new)
        .transpose()
        .map_err(|error| TestsiftError::InvalidNamePattern {
            pattern: args.name.clone().unwrap_or_default(),
            message: error.msg.to_string(),
        })?;

    let config = args.config.resolve(&[])?;
    let scanner = StructureScanner::new(&config.test_functions)?;
    let source = read_source(&args.file)?;
    let projection = classify(&source);

    let blocks = scanner
        .find_test_blocks(&source, &projection)
        .iter()
        .filter(|block| {
            compiled_name_pattern
                .as_ref()
                .is_none_or(|pattern| pattern.matches(&block.name))
        })
        .map(|block| BlockSummary::from_block(block, args.verbose))
        .collect::<Vec<_>>();
    tracing::debug!(file = %args.file.display(), blocks = blocks.len(), "listed test blocks");

    Ok(BlocksResponse {
        file: args.file,
        blocks,
    })
}
