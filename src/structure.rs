use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::arguments::{ArgumentRange, CallIndex, ParsedArguments};
use crate::error::TestsiftError;
use crate::lexer::{RegionProjection, literal_spans};
use crate::lines::{LineInfo, collect_lines, line_index_for_offset};

pub const DEFAULT_TEST_FUNCTIONS: &[&str] = &["test", "it", "describe"];

/// One detected test or suite declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestBlock {
    pub name: String,
    pub callee: String,
    /// 1-based, inclusive.
    pub start_line: usize,
    pub end_line: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub body_code_only: String,
    pub body_original: String,
    pub leading_comment: String,
}

impl TestBlock {
    pub const UNKNOWN_NAME: &'static str = "<unknown>";

    pub fn has_known_name(&self) -> bool {
        self.name != Self::UNKNOWN_NAME
    }
}

/// Finds test declarations by matching call sites in the code-only projection,
/// so occurrences inside strings and comments are never reported.
#[derive(Debug, Clone)]
pub struct StructureScanner {
    call_regex: Regex,
}

impl StructureScanner {
    pub fn new<S: AsRef<str>>(test_functions: &[S]) -> Result<Self, TestsiftError> {
        let alternatives = test_functions
            .iter()
            .map(|name| regex::escape(name.as_ref().trim()))
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();
        if alternatives.is_empty() {
            return Err(TestsiftError::InvalidConfig {
                path: None,
                message: "test_functions must name at least one identifier".to_string(),
            });
        }

        let pattern = format!(
            r"\b({})\b(?:\s*\.\s*(?:only|skip|todo))?\s*\(",
            alternatives.join("|")
        );
        let call_regex = Regex::new(&pattern).map_err(|error| TestsiftError::InvalidConfig {
            path: None,
            message: format!("test_functions produced an invalid pattern: {error}"),
        })?;

        Ok(Self { call_regex })
    }

    /// Whether the projection contains at least one test call site.
    pub fn has_test_calls(&self, projection: &RegionProjection) -> bool {
        !self.call_sites(projection.as_str()).is_empty()
    }

    pub fn find_test_blocks(&self, original: &str, projection: &RegionProjection) -> Vec<TestBlock> {
        let code = projection.as_str();
        let sites = self.call_sites(code);
        if sites.is_empty() {
            return Vec::new();
        }

        let file = FileIndex {
            original,
            code,
            lines: collect_lines(original),
            calls: CallIndex::build(original),
            literals: literal_spans(original)
                .into_iter()
                .map(|span| (span.start, span.end))
                .collect(),
        };
        sites.into_iter().map(|site| file.build_block(site)).collect()
    }

    fn call_sites<'p>(&self, code: &'p str) -> Vec<CallSite<'p>> {
        let bytes = code.as_bytes();
        self.call_regex
            .captures_iter(code)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let callee = captures.get(1)?;
                if is_member_access(bytes, callee.start()) {
                    return None;
                }
                Some(CallSite {
                    callee: callee.as_str(),
                    start: callee.start(),
                    open_paren: whole.end() - 1,
                })
            })
            .collect()
    }
}

impl Default for StructureScanner {
    fn default() -> Self {
        static DEFAULT_SCANNER: OnceLock<StructureScanner> = OnceLock::new();
        DEFAULT_SCANNER
            .get_or_init(|| {
                StructureScanner::new(DEFAULT_TEST_FUNCTIONS)
                    .expect("default test call regex should compile")
            })
            .clone()
    }
}

pub fn find_test_blocks(original: &str, projection: &RegionProjection) -> Vec<TestBlock> {
    StructureScanner::default().find_test_blocks(original, projection)
}

struct CallSite<'p> {
    callee: &'p str,
    start: usize,
    open_paren: usize,
}

// `pattern.test(`, `obj . it(` and `$it(` are not test declarations.
pub(crate) fn is_member_access(code: &[u8], identifier_start: usize) -> bool {
    let previous = code[..identifier_start]
        .iter()
        .rev()
        .find(|byte| !byte.is_ascii_whitespace())
        .copied();
    let adjacent = identifier_start
        .checked_sub(1)
        .map(|index| code[index]);

    matches!(previous, Some(b'.')) || matches!(adjacent, Some(b'$'))
}

/// Per-file lookups shared by every call site, each built in one pass.
struct FileIndex<'a> {
    original: &'a str,
    code: &'a str,
    lines: Vec<LineInfo<'a>>,
    calls: CallIndex,
    /// Start to end offset of every string and template literal.
    literals: HashMap<usize, usize>,
}

impl FileIndex<'_> {
    fn build_block(&self, site: CallSite<'_>) -> TestBlock {
        let parsed = self.calls.arguments(site.open_paren);
        let name = parsed
            .and_then(|parsed| parsed.get(0))
            .and_then(|first| self.literal_text(first))
            .unwrap_or(TestBlock::UNKNOWN_NAME)
            .to_string();

        let end_offset = self.block_end(parsed);
        let start_line_index = line_index_for_offset(&self.lines, site.start);
        let end_line_index = line_index_for_offset(&self.lines, end_offset.saturating_sub(1));

        TestBlock {
            name,
            callee: site.callee.to_string(),
            start_line: start_line_index + 1,
            end_line: end_line_index.max(start_line_index) + 1,
            start_offset: site.start,
            end_offset,
            body_code_only: self.code.get(site.start..end_offset).unwrap_or_default().to_string(),
            body_original: self
                .original
                .get(site.start..end_offset)
                .unwrap_or_default()
                .to_string(),
            leading_comment: leading_comment(&self.lines, start_line_index),
        }
    }

    /// Contents of `argument` when it is exactly one string or template
    /// literal, so `'a' + 'b'` has no literal name.
    fn literal_text(&self, argument: &ArgumentRange) -> Option<&str> {
        if self.literals.get(&argument.start) != Some(&argument.end) {
            return None;
        }
        self.original.get(argument.start + 1..argument.end - 1)
    }

    /// Offset just past the `}` that balances the first `{` inside the call's
    /// argument list. A call that closes before any `{` ends at its `)`;
    /// without either, the block runs to end of input.
    fn block_end(&self, parsed: Option<&ParsedArguments>) -> usize {
        let end_of_input = self.code.len();
        let Some(parsed) = parsed else {
            return end_of_input;
        };

        match (parsed.first_brace, parsed.close_paren) {
            (Some(open_brace), _) => self
                .calls
                .brace_close(open_brace)
                .map_or(end_of_input, |close| close + 1),
            (None, Some(close_paren)) => close_paren + 1,
            (None, None) => end_of_input,
        }
    }
}

fn leading_comment(lines: &[LineInfo<'_>], start_line_index: usize) -> String {
    let mut collected = Vec::new();

    for line in lines[..start_line_index].iter().rev() {
        let trimmed = line.text.trim();
        if !is_comment_line(trimmed) {
            break;
        }
        collected.push(trimmed);
    }

    collected.reverse();
    collected.join("\n")
}

fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}
