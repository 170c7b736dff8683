use std::path::Path;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TestsiftError {
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File '{path}' is not valid UTF-8")]
    InvalidUtf8 {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Invalid configuration{}: {message}", config_location(.path))]
    InvalidConfig {
        path: Option<String>,
        message: String,
    },

    #[error("Failed to serialize response JSON: {source}")]
    ResponseSerialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid name glob pattern '{pattern}': {message}")]
    InvalidNamePattern { pattern: String, message: String },
}

impl TestsiftError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let (r#type, suggestion) = match self {
            Self::Io { .. } => ("io_error", None),
            Self::InvalidUtf8 { .. } => (
                "invalid_utf8",
                Some("Only UTF-8 encoded JavaScript/TypeScript sources can be analyzed".to_string()),
            ),
            Self::InvalidConfig { .. } => (
                "invalid_config",
                Some(
                    "Check testsift.toml keys: test_functions, throws_functions, assert_throw_methods, rules"
                        .to_string(),
                ),
            ),
            Self::ResponseSerialization { .. } => ("serialization_error", None),
            Self::InvalidRequest { .. } => ("invalid_request", None),
            Self::InvalidNamePattern { .. } => (
                "invalid_name_pattern",
                Some("Use a valid glob pattern such as 'rejects *'".to_string()),
            ),
        };

        ErrorResponse {
            error: ErrorBody {
                r#type: r#type.to_string(),
                message: self.to_string(),
                suggestion,
            },
        }
    }
}

fn config_location(path: &Option<String>) -> String {
    path.as_deref()
        .map(|path| format!(" in '{path}'"))
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::TestsiftError;

    fn assert_error_type(
        error: TestsiftError,
        expected_type: &str,
        expected_suggestion_substring: Option<&str>,
    ) {
        let response = error.to_error_response();
        assert_eq!(response.error.r#type, expected_type);

        match (
            response.error.suggestion.as_deref(),
            expected_suggestion_substring,
        ) {
            (Some(actual), Some(expected_substring)) => {
                assert!(
                    actual.contains(expected_substring),
                    "suggestion should contain '{expected_substring}', got '{actual}'"
                );
            }
            (None, None) => {}
            (actual, expected) => {
                panic!("suggestion mismatch; actual={actual:?}, expected_contains={expected:?}")
            }
        }
    }

    #[test]
    fn io_errors_map_to_io_error_without_suggestion() {
        assert_error_type(
            TestsiftError::Io {
                path: "fixture.test.js".to_string(),
                source: std::io::Error::other("boom"),
            },
            "io_error",
            None,
        );
    }

    #[test]
    fn invalid_utf8_suggests_encoding() {
        let source = String::from_utf8(vec![0xff, 0xfe]).expect_err("bytes are not utf-8");
        assert_error_type(
            TestsiftError::InvalidUtf8 {
                path: "fixture.test.js".to_string(),
                source,
            },
            "invalid_utf8",
            Some("UTF-8"),
        );
    }

    #[test]
    fn invalid_config_message_names_the_file_when_known() {
        let with_path = TestsiftError::InvalidConfig {
            path: Some("testsift.toml".to_string()),
            message: "unknown rule 'speed'".to_string(),
        };
        let without_path = TestsiftError::InvalidConfig {
            path: None,
            message: "empty list".to_string(),
        };

        assert_eq!(
            with_path.to_string(),
            "Invalid configuration in 'testsift.toml': unknown rule 'speed'"
        );
        assert_eq!(without_path.to_string(), "Invalid configuration: empty list");
        assert_error_type(with_path, "invalid_config", Some("test_functions"));
    }

    #[test]
    fn request_and_pattern_errors_keep_distinct_types() {
        assert_error_type(
            TestsiftError::InvalidRequest {
                message: "At least one FILE is required".to_string(),
            },
            "invalid_request",
            None,
        );
        assert_error_type(
            TestsiftError::InvalidNamePattern {
                pattern: "[".to_string(),
                message: "invalid range".to_string(),
            },
            "invalid_name_pattern",
            Some("glob"),
        );
    }

    #[test]
    fn serialization_errors_map_to_serialization_error() {
        let source =
            serde_json::from_str::<serde_json::Value>("{").expect_err("invalid JSON should fail");
        assert_error_type(
            TestsiftError::ResponseSerialization { source },
            "serialization_error",
            None,
        );
    }
}
