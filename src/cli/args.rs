use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::read_source;
use crate::arguments::parse_arguments;
use crate::error::TestsiftError;

#[derive(Debug, Args)]
pub struct ArgsArgs {
    #[arg(long, value_name = "N", help = "Byte offset of the call's opening parenthesis")]
    pub offset: usize,
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ArgsResponse {
    pub args: Vec<ArgumentEntry>,
    pub close_paren: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ArgumentEntry {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

pub fn run_args(args: ArgsArgs) -> Result<ArgsResponse, TestsiftError> {
    let source = read_source(&args.file)?;
    match source.as_bytes().get(args.offset).copied() {
        Some(b'(') => {}
        Some(_) => {
            return Err(TestsiftError::InvalidRequest {
                message: format!("Byte offset {} is not an opening parenthesis", args.offset),
            });
        }
        None => {
            return Err(TestsiftError::InvalidRequest {
                message: format!(
                    "Byte offset {} is past the end of '{}' ({} bytes)",
                    args.offset,
                    args.file.display(),
                    source.len()
                ),
            });
        }
    }

    let parsed = parse_arguments(&source, args.offset);
    Ok(ArgsResponse {
        args: parsed
            .args
            .iter()
            .map(|range| ArgumentEntry {
                start: range.start,
                end: range.end,
                text: range.text(&source).to_string(),
            })
            .collect(),
        close_paren: parsed.close_paren,
    })
}
