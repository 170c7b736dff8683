use std::path::PathBuf;

use clap::Args;

use super::read_source;
use crate::error::TestsiftError;
use crate::lexer::classify;

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Returns the projection verbatim; the caller prints it without a trailing
/// newline so byte offsets line up with the input file.
pub fn run_classify(args: ClassifyArgs) -> Result<String, TestsiftError> {
    let source = read_source(&args.file)?;
    Ok(classify(&source).into_string())
}
