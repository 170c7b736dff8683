use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::error::TestsiftError;
use crate::issue::AnalysisIssue;
use crate::lexer::{RegionProjection, classify};
use crate::structure::{StructureScanner, TestBlock};

mod boundary;
mod exception;
mod narration;

pub use boundary::BoundaryRule;
pub use exception::{ExceptionMessageRule, MessageMatcher, classify_message_argument};
pub use narration::NarrationRule;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum RuleId {
    Narration,
    Boundary,
    ExceptionMessage,
}

impl RuleId {
    pub const ALL: [RuleId; 3] = [
        RuleId::Narration,
        RuleId::Boundary,
        RuleId::ExceptionMessage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::Narration => "narration",
            RuleId::Boundary => "boundary",
            RuleId::ExceptionMessage => "exception-message",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a rule may look at for one file. Built once per file and shared
/// by every rule in the pipeline.
pub struct RuleContext<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub projection: &'a RegionProjection,
    pub test_blocks: &'a [TestBlock],
}

/// A single check over one file. Rules never fail: input they cannot make
/// sense of produces no issue.
pub trait Rule {
    fn id(&self) -> RuleId;
    fn analyze(&self, context: &RuleContext<'_>) -> Vec<AnalysisIssue>;
}

#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub test_blocks: Vec<TestBlock>,
    pub issues: Vec<AnalysisIssue>,
}

/// Ordered set of enabled rules plus the scanner that feeds them.
pub struct RulePipeline {
    scanner: StructureScanner,
    rules: Vec<Box<dyn Rule>>,
}

impl Default for RulePipeline {
    fn default() -> Self {
        let scanner = StructureScanner::default();
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(NarrationRule),
            Box::new(BoundaryRule::new(scanner.clone())),
            Box::new(ExceptionMessageRule::default()),
        ];

        Self { scanner, rules }
    }
}

impl RulePipeline {
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, TestsiftError> {
        let scanner = StructureScanner::new(&config.test_functions)?;
        let mut rules: Vec<Box<dyn Rule>> = Vec::with_capacity(config.rules.len());

        for id in &config.rules {
            if rules.iter().any(|rule| rule.id() == *id) {
                tracing::warn!(rule = %id, "rule listed more than once; keeping the first entry");
                continue;
            }

            let rule: Box<dyn Rule> = match id {
                RuleId::Narration => Box::new(NarrationRule),
                RuleId::Boundary => Box::new(BoundaryRule::new(scanner.clone())),
                RuleId::ExceptionMessage => Box::new(ExceptionMessageRule::new(
                    &config.throws_functions,
                    &config.assert_throw_methods,
                )?),
            };
            rules.push(rule);
        }

        Ok(Self { scanner, rules })
    }

    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }

    pub fn scanner(&self) -> &StructureScanner {
        &self.scanner
    }

    pub fn analyze(&self, path: &str, content: &str) -> Vec<AnalysisIssue> {
        self.analyze_with_blocks(path, content).issues
    }

    /// Runs every enabled rule in order and concatenates their issues.
    pub fn analyze_with_blocks(&self, path: &str, content: &str) -> FileAnalysis {
        let projection = classify(content);
        let test_blocks = self.scanner.find_test_blocks(content, &projection);
        let context = RuleContext {
            path,
            content,
            projection: &projection,
            test_blocks: &test_blocks,
        };

        let mut issues = Vec::new();
        for rule in &self.rules {
            let found = rule.analyze(&context);
            tracing::debug!(file = path, rule = %rule.id(), issues = found.len(), "rule finished");
            issues.extend(found);
        }

        tracing::debug!(
            file = path,
            test_blocks = test_blocks.len(),
            issues = issues.len(),
            "analyzed file"
        );

        FileAnalysis {
            test_blocks,
            issues,
        }
    }
}

/// Analyzes one file with the default rule set.
pub fn analyze_file(path: &str, content: &str) -> Vec<AnalysisIssue> {
    RulePipeline::default().analyze(path, content)
}
