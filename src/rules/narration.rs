use std::sync::OnceLock;

use regex::Regex;

use super::{Rule, RuleContext, RuleId};
use crate::issue::{AnalysisIssue, IssueKind};

const LABELS: [&str; 3] = ["Given", "When", "Then"];

/// Requires every test block to carry `Given:`, `When:` and `Then:` labels,
/// either in its body or in the comment run right above it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrationRule;

impl Rule for NarrationRule {
    fn id(&self) -> RuleId {
        RuleId::Narration
    }

    fn analyze(&self, context: &RuleContext<'_>) -> Vec<AnalysisIssue> {
        context
            .test_blocks
            .iter()
            .filter_map(|block| {
                let haystack = format!("{}\n{}", block.body_original, block.leading_comment);
                let missing = missing_labels(&haystack);
                if missing.is_empty() {
                    return None;
                }

                Some(AnalysisIssue::new(
                    IssueKind::MissingNarration,
                    context.path,
                    Some(block.start_line),
                    format!(
                        "{} '{}' is missing narration label(s): {}",
                        block.callee,
                        block.name,
                        missing.join(", ")
                    ),
                ))
            })
            .collect()
    }
}

/// Labels with no line of the form `<label> ... :` in `text`.
pub(crate) fn missing_labels(text: &str) -> Vec<&'static str> {
    label_patterns()
        .iter()
        .zip(LABELS)
        .filter(|(pattern, _)| !pattern.is_match(text))
        .map(|(_, label)| label)
        .collect()
}

// `[^\n]` keeps each match on a single line.
fn label_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        LABELS.map(|label| {
            Regex::new(&format!(r"(?i)\b{label}\b[^\n]*:"))
                .expect("narration label regex should compile")
        })
    })
}
