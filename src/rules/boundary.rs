use std::sync::OnceLock;

use regex::Regex;

use super::{Rule, RuleContext, RuleId};
use crate::issue::{AnalysisIssue, IssueKind};
use crate::lexer::literal_spans;
use crate::structure::StructureScanner;

/// File-level check that a test file exercises at least one boundary value:
/// `null`, `undefined`, zero, an empty array or an empty string.
#[derive(Debug, Clone)]
pub struct BoundaryRule {
    scanner: StructureScanner,
}

impl BoundaryRule {
    pub fn new(scanner: StructureScanner) -> Self {
        Self { scanner }
    }
}

impl Rule for BoundaryRule {
    fn id(&self) -> RuleId {
        RuleId::Boundary
    }

    fn analyze(&self, context: &RuleContext<'_>) -> Vec<AnalysisIssue> {
        if !self.scanner.has_test_calls(context.projection) {
            return Vec::new();
        }
        if has_code_signal(context.projection.as_str()) || has_empty_literal(context.content) {
            return Vec::new();
        }

        vec![AnalysisIssue::new(
            IssueKind::MissingBoundary,
            context.path,
            None,
            "no boundary value (null, undefined, 0, [] or empty string) is exercised in this file",
        )]
    }
}

fn has_code_signal(code: &str) -> bool {
    boundary_patterns().iter().any(|pattern| pattern.is_match(code))
}

// String contents are blanked in the projection, so empty strings are found
// on the original text instead.
fn has_empty_literal(original: &str) -> bool {
    literal_spans(original)
        .iter()
        .any(|span| span.is_empty_literal())
}

fn boundary_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\bnull\b",
            r"\bundefined\b",
            // `x === 0`, `n <= 0`; `=> 0` is an arrow body, not a comparison.
            r"(?:^|[^=])(?:[=!]==?|[<>]=?)\s*-?0(?:[^\w.]|$)",
            r"(?:^|[^\w.$])0\s*(?:[=!]==?|[<>]=?)",
            // `toBe(0)`, `assert.equal(n, 0)`
            r"\.\s*to\w*\s*\(\s*-?0\s*\)",
            r",\s*-?0\s*\)",
            r"\[\s*\]",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("boundary regex should compile"))
        .collect()
    })
}
