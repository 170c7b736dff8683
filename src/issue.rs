use std::fmt;

use serde::{Deserialize, Serialize};

/// Defect categories. The serialized names are part of the output contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    MissingNarration,
    MissingBoundary,
    MissingExceptionMessage,
}

impl IssueKind {
    pub const ALL: [IssueKind; 3] = [
        IssueKind::MissingNarration,
        IssueKind::MissingBoundary,
        IssueKind::MissingExceptionMessage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::MissingNarration => "missing-narration",
            IssueKind::MissingBoundary => "missing-boundary",
            IssueKind::MissingExceptionMessage => "missing-exception-message",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisIssue {
    pub kind: IssueKind,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub detail: String,
}

impl AnalysisIssue {
    pub fn new(kind: IssueKind, file: &str, line: Option<usize>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.to_string(),
            line,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisIssue, IssueKind};

    #[test]
    fn kinds_serialize_to_stable_kebab_case_names() {
        for kind in IssueKind::ALL {
            let serialized = serde_json::to_value(kind).expect("kind should serialize");
            assert_eq!(serialized, serde_json::Value::String(kind.as_str().to_string()));
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn file_level_issue_omits_line() {
        let issue = AnalysisIssue::new(IssueKind::MissingBoundary, "a.test.js", None, "no boundary");
        let value = serde_json::to_value(&issue).expect("issue should serialize");

        assert_eq!(value["kind"], "missing-boundary");
        assert_eq!(value["file"], "a.test.js");
        assert!(value.get("line").is_none());
    }
}
