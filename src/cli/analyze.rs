use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::blocks::BlockSummary;
use super::{ConfigArgs, read_source};
use crate::error::TestsiftError;
use crate::hash::content_hash;
use crate::issue::{AnalysisIssue, IssueKind};
use crate::rules::{RuleId, RulePipeline};

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    #[arg(
        long = "rule",
        value_name = "ID",
        value_enum,
        help = "Enable only this rule (repeatable); overrides the configured rule list"
    )]
    pub rules: Vec<RuleId>,
    #[arg(value_name = "FILE", num_args = 0.., help = "Test files to analyze")]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub files: Vec<FileReport>,
    pub summary: AnalyzeSummary,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub content_hash: String,
    pub test_blocks: Vec<BlockSummary>,
    pub issues: Vec<AnalysisIssue>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeSummary {
    pub files_scanned: usize,
    pub test_blocks: usize,
    pub issues: usize,
    pub by_kind: BTreeMap<&'static str, usize>,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<AnalyzeResponse, TestsiftError> {
    if args.files.is_empty() {
        return Err(TestsiftError::InvalidRequest {
            message: "At least one FILE is required".to_string(),
        });
    }

    let config = args.config.resolve(&args.rules)?;
    let pipeline = RulePipeline::from_config(&config)?;
    tracing::info!(
        files = args.files.len(),
        rules = ?pipeline.rule_ids(),
        "starting analysis"
    );

    let mut seen_canonical_paths = HashSet::with_capacity(args.files.len());
    let mut reports = Vec::with_capacity(args.files.len());

    for file in &args.files {
        let canonical_path =
            fs::canonicalize(file).map_err(|error| TestsiftError::io(file, error))?;
        if !seen_canonical_paths.insert(canonical_path.clone()) {
            return Err(TestsiftError::InvalidRequest {
                message: format!(
                    "Duplicate file entry in analyze input is not supported: '{}' appears more than once",
                    canonical_path.display()
                ),
            });
        }

        let source = read_source(file)?;
        let analysis = pipeline.analyze_with_blocks(&file.display().to_string(), &source);
        reports.push(FileReport {
            file: file.clone(),
            content_hash: content_hash(source.as_bytes()),
            test_blocks: analysis
                .test_blocks
                .iter()
                .map(|block| BlockSummary::from_block(block, false))
                .collect(),
            issues: analysis.issues,
        });
    }

    let summary = summarize(&reports);
    if summary.issues > 0 {
        tracing::warn!(issues = summary.issues, "analysis found issues");
    }

    Ok(AnalyzeResponse {
        files: reports,
        summary,
    })
}

fn summarize(reports: &[FileReport]) -> AnalyzeSummary {
    let mut by_kind: BTreeMap<&'static str, usize> = IssueKind::ALL
        .iter()
        .map(|kind| (kind.as_str(), 0))
        .collect();
    for issue in reports.iter().flat_map(|report| &report.issues) {
        *by_kind.entry(issue.kind.as_str()).or_default() += 1;
    }

    AnalyzeSummary {
        files_scanned: reports.len(),
        test_blocks: reports.iter().map(|report| report.test_blocks.len()).sum(),
        issues: reports.iter().map(|report| report.issues.len()).sum(),
        by_kind,
    }
}
