use std::sync::OnceLock;

use regex::Regex;

use super::{Rule, RuleContext, RuleId};
use crate::arguments::CallIndex;
use crate::error::TestsiftError;
use crate::issue::{AnalysisIssue, IssueKind};
use crate::lines::{LineInfo, collect_lines, line_number_for_offset};
use crate::structure::is_member_access;

/// How the expectation argument of a throws-style assertion pins down the
/// thrown error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageMatcher {
    /// No second argument at all.
    Missing,
    RegexLiteral,
    RegExpConstructor,
    ObjectWithMessage,
    /// Function or arrow whose body reads `.message`.
    MessageValidator,
    /// A bare error class such as `TypeError`.
    ErrorTypeOnly(String),
    /// Anything else: variables, custom matchers, helper calls.
    Unrecognized,
}

impl MessageMatcher {
    /// Unrecognized shapes count as compliant.
    pub fn is_compliant(&self) -> bool {
        !matches!(self, MessageMatcher::Missing | MessageMatcher::ErrorTypeOnly(_))
    }
}

/// Classifies the expectation argument of a throws call. `argument` is the
/// trimmed original text and `code` the same range from the projection.
pub fn classify_message_argument(argument: Option<(&str, &str)>) -> MessageMatcher {
    let Some((text, code)) = argument else {
        return MessageMatcher::Missing;
    };
    let patterns = matcher_patterns();

    if is_regex_literal(text) {
        MessageMatcher::RegexLiteral
    } else if patterns.regexp_constructor.is_match(text) {
        MessageMatcher::RegExpConstructor
    } else if text.starts_with('{') && patterns.message_key.is_match(text) {
        MessageMatcher::ObjectWithMessage
    } else if patterns.function_like.is_match(code) && patterns.message_read.is_match(code) {
        MessageMatcher::MessageValidator
    } else if patterns.error_type.is_match(text) {
        MessageMatcher::ErrorTypeOnly(text.to_string())
    } else {
        MessageMatcher::Unrecognized
    }
}

fn is_regex_literal(text: &str) -> bool {
    let mut bytes = text.bytes();
    bytes.next() == Some(b'/') && !matches!(bytes.next(), Some(b'/' | b'*') | None)
}

struct MatcherPatterns {
    regexp_constructor: Regex,
    message_key: Regex,
    function_like: Regex,
    message_read: Regex,
    error_type: Regex,
}

fn matcher_patterns() -> &'static MatcherPatterns {
    static PATTERNS: OnceLock<MatcherPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |pattern: &str| {
            Regex::new(pattern).expect("exception matcher regex should compile")
        };
        MatcherPatterns {
            regexp_constructor: compile(r"^(?:new\s+)?RegExp\s*\("),
            message_key: compile(r#"[{,]\s*['"]?message['"]?\s*:"#),
            function_like: compile(r"^(?:async\s+)?function\b|=>"),
            message_read: compile(r"\.\s*message\b"),
            error_type: compile(r"^[A-Za-z_$][\w$]*Error$"),
        }
    })
}

/// Flags throws-style assertions that never check the error message, plus
/// zero-argument `toThrow()`-style matchers.
#[derive(Debug, Clone)]
pub struct ExceptionMessageRule {
    throws_call: Option<Regex>,
    assert_throw_call: Option<Regex>,
}

impl Default for ExceptionMessageRule {
    fn default() -> Self {
        static DEFAULT_RULE: OnceLock<ExceptionMessageRule> = OnceLock::new();
        DEFAULT_RULE
            .get_or_init(|| {
                ExceptionMessageRule::new(
                    &["assert.throws", "assert.rejects"],
                    &["toThrow", "toThrowError"],
                )
                .expect("default exception rule regexes should compile")
            })
            .clone()
    }
}

impl ExceptionMessageRule {
    pub fn new<S: AsRef<str>>(
        throws_functions: &[S],
        assert_throw_methods: &[S],
    ) -> Result<Self, TestsiftError> {
        let throws_names = throws_functions
            .iter()
            .map(|name| {
                name.as_ref()
                    .split('.')
                    .map(|part| regex::escape(part.trim()))
                    .collect::<Vec<_>>()
                    .join(r"\s*\.\s*")
            })
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();
        let methods = assert_throw_methods
            .iter()
            .map(|name| regex::escape(name.as_ref().trim()))
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();

        let throws_call = (!throws_names.is_empty())
            .then(|| compile_call_pattern(&format!(r"\b(?:{})\s*\(", throws_names.join("|"))))
            .transpose()?;
        let assert_throw_call = (!methods.is_empty())
            .then(|| compile_call_pattern(&format!(r"\.\s*(?:{})\b\s*\(", methods.join("|"))))
            .transpose()?;

        Ok(Self {
            throws_call,
            assert_throw_call,
        })
    }

    fn throws_issues(
        &self,
        context: &RuleContext<'_>,
        lines: &[LineInfo<'_>],
        calls: &CallIndex,
    ) -> Vec<AnalysisIssue> {
        let Some(throws_call) = &self.throws_call else {
            return Vec::new();
        };
        let code = context.projection.as_str();

        throws_call
            .find_iter(code)
            .filter(|found| !is_member_access(code.as_bytes(), found.start()))
            .filter_map(|found| {
                let open_paren = found.end() - 1;
                let argument = calls
                    .arguments(open_paren)
                    .and_then(|parsed| parsed.get(1))
                    .map(|range| {
                        (
                            range.text(context.content),
                            code.get(range.start..range.end).unwrap_or_default(),
                        )
                    });
                let matcher = classify_message_argument(argument);
                if matcher.is_compliant() {
                    return None;
                }

                let callee = compact(&code[found.start()..open_paren]);
                let detail = match matcher {
                    MessageMatcher::ErrorTypeOnly(error_type) => format!(
                        "{callee}() checks only the error type {error_type}, not its message"
                    ),
                    _ => format!("{callee}() has no message argument"),
                };
                Some(AnalysisIssue::new(
                    IssueKind::MissingExceptionMessage,
                    context.path,
                    Some(line_number_for_offset(lines, found.start())),
                    detail,
                ))
            })
            .collect()
    }

    fn assert_throw_issues(
        &self,
        context: &RuleContext<'_>,
        lines: &[LineInfo<'_>],
        calls: &CallIndex,
    ) -> Vec<AnalysisIssue> {
        let Some(assert_throw_call) = &self.assert_throw_call else {
            return Vec::new();
        };
        let code = context.projection.as_str();

        assert_throw_call
            .find_iter(code)
            .filter(|found| !is_negated(code, found.start()))
            .filter_map(|found| {
                let open_paren = found.end() - 1;
                if calls
                    .arguments(open_paren)
                    .is_some_and(|parsed| !parsed.is_empty())
                {
                    return None;
                }

                let method = compact(code[found.start()..open_paren].trim_start_matches('.'));
                Some(AnalysisIssue::new(
                    IssueKind::MissingExceptionMessage,
                    context.path,
                    Some(line_number_for_offset(lines, found.start())),
                    format!(".{method}() is called without an expected message"),
                ))
            })
            .collect()
    }
}

impl Rule for ExceptionMessageRule {
    fn id(&self) -> RuleId {
        RuleId::ExceptionMessage
    }

    fn analyze(&self, context: &RuleContext<'_>) -> Vec<AnalysisIssue> {
        if self.throws_call.is_none() && self.assert_throw_call.is_none() {
            return Vec::new();
        }
        let lines = collect_lines(context.content);
        let calls = CallIndex::build(context.content);
        let mut issues = self.throws_issues(context, &lines, &calls);
        issues.extend(self.assert_throw_issues(context, &lines, &calls));
        issues.sort_by_key(|issue| issue.line);
        issues
    }
}

fn compile_call_pattern(pattern: &str) -> Result<Regex, TestsiftError> {
    Regex::new(pattern).map_err(|error| TestsiftError::InvalidConfig {
        path: None,
        message: format!("exception rule names produced an invalid pattern: {error}"),
    })
}

/// `expect(fn).not.toThrow()` asserts that nothing is thrown, so there is no
/// message to pin down.
fn is_negated(code: &str, method_dot: usize) -> bool {
    code[..method_dot]
        .trim_end()
        .strip_suffix("not")
        .is_some_and(|before| before.trim_end().ends_with('.'))
}

fn compact(callee: &str) -> String {
    callee.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::{MessageMatcher, classify_message_argument, is_negated};
    use crate::lexer::classify;

    fn matcher(argument: &str) -> MessageMatcher {
        let projection = classify(argument);
        classify_message_argument(Some((argument, projection.as_str())))
    }

    #[test]
    fn compliant_matcher_shapes() {
        assert_eq!(matcher("/expected/i"), MessageMatcher::RegexLiteral);
        assert_eq!(matcher("new RegExp('bad')"), MessageMatcher::RegExpConstructor);
        assert_eq!(
            matcher("{ name: 'TypeError', message: 'bad' }"),
            MessageMatcher::ObjectWithMessage
        );
        assert_eq!(
            matcher("{ \"message\": /bad/ }"),
            MessageMatcher::ObjectWithMessage
        );
        assert_eq!(
            matcher("(e) => { return e.message.includes('x'); }"),
            MessageMatcher::MessageValidator
        );
        assert_eq!(
            matcher("function (err) { return err . message === 'x'; }"),
            MessageMatcher::MessageValidator
        );
    }

    #[test]
    fn type_only_and_missing_are_violations() {
        assert_eq!(
            matcher("TypeError"),
            MessageMatcher::ErrorTypeOnly("TypeError".to_string())
        );
        assert_eq!(matcher("Error"), MessageMatcher::ErrorTypeOnly("Error".to_string()));
        assert!(!matcher("ValidationError").is_compliant());
        assert!(!classify_message_argument(None).is_compliant());
    }

    #[test]
    fn unknown_shapes_stay_permissive() {
        for argument in [
            "expectedError",
            "errors.TypeError",
            "matchesMessage('x')",
            "(e) => e instanceof TypeError",
            "{ name: 'TypeError' }",
            "// note\n/x/",
        ] {
            let found = matcher(argument);
            assert!(found.is_compliant(), "{argument:?} classified as {found:?}");
        }
    }

    #[test]
    fn message_inside_string_does_not_make_a_validator() {
        assert_eq!(
            matcher("(e) => log('.message')"),
            MessageMatcher::Unrecognized
        );
    }

    #[test]
    fn negated_matcher_is_recognized_through_whitespace() {
        let code = "expect(fn).not.toThrow(); expect(fn) . not\n  .toThrow(); knot.toThrow()";
        let dots: Vec<_> = code.match_indices(".toThrow").map(|(index, _)| index).collect();

        assert!(is_negated(code, dots[0]));
        assert!(is_negated(code, dots[1]));
        assert!(!is_negated(code, dots[2]));
    }
}
