use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TestsiftError;
use crate::rules::RuleId;
use crate::structure::DEFAULT_TEST_FUNCTIONS;

pub const CONFIG_FILE_NAME: &str = "testsift.toml";

/// Analyzer settings, read from `testsift.toml`.
///
/// ```toml
/// test_functions = ["test", "it", "describe"]
/// throws_functions = ["assert.throws", "assert.rejects"]
/// assert_throw_methods = ["toThrow", "toThrowError"]
/// rules = ["narration", "boundary", "exception-message"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AnalyzerConfig {
    pub test_functions: Vec<String>,
    pub throws_functions: Vec<String>,
    pub assert_throw_methods: Vec<String>,
    pub rules: Vec<RuleId>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            test_functions: DEFAULT_TEST_FUNCTIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            throws_functions: vec!["assert.throws".to_string(), "assert.rejects".to_string()],
            assert_throw_methods: vec!["toThrow".to_string(), "toThrowError".to_string()],
            rules: RuleId::ALL.to_vec(),
        }
    }
}

impl AnalyzerConfig {
    /// Uses `explicit` when given, otherwise `testsift.toml` in the current
    /// directory if present, otherwise the defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, TestsiftError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            return Self::load(local);
        }

        tracing::debug!("no {CONFIG_FILE_NAME} found, using default configuration");
        Ok(Self::default())
    }

    pub fn load(path: &Path) -> Result<Self, TestsiftError> {
        let text = std::fs::read_to_string(path).map_err(|error| TestsiftError::io(path, error))?;
        let config = Self::from_toml_str(&text, Some(path))?;
        tracing::debug!(path = %path.display(), rules = ?config.rules, "loaded configuration");
        Ok(config)
    }

    pub fn from_toml_str(text: &str, path: Option<&Path>) -> Result<Self, TestsiftError> {
        let config: Self = toml::from_str(text).map_err(|error| TestsiftError::InvalidConfig {
            path: path.map(|path| path.display().to_string()),
            message: error.message().to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn with_rules(mut self, rules: Vec<RuleId>) -> Self {
        if !rules.is_empty() {
            self.rules = rules;
        }
        self
    }

    pub fn validate(&self, path: Option<&Path>) -> Result<(), TestsiftError> {
        let invalid = |message: String| TestsiftError::InvalidConfig {
            path: path.map(|path| path.display().to_string()),
            message,
        };

        if self.test_functions.is_empty() {
            return Err(invalid(
                "test_functions must name at least one identifier".to_string(),
            ));
        }
        for name in &self.test_functions {
            if !is_identifier(name) {
                return Err(invalid(format!(
                    "test_functions entry '{name}' is not a JavaScript identifier"
                )));
            }
        }
        for name in &self.throws_functions {
            if name.split('.').any(|part| !is_identifier(part)) {
                return Err(invalid(format!(
                    "throws_functions entry '{name}' must be a dotted identifier path such as 'assert.throws'"
                )));
            }
        }
        for name in &self.assert_throw_methods {
            if !is_identifier(name) {
                return Err(invalid(format!(
                    "assert_throw_methods entry '{name}' is not a JavaScript identifier"
                )));
            }
        }

        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || matches!(first, '_' | '$'))
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$'))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::tempdir;

    use super::AnalyzerConfig;
    use crate::rules::RuleId;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AnalyzerConfig::from_toml_str("", None).expect("empty config should parse");
        assert_eq!(config, AnalyzerConfig::default());
        assert_eq!(config.rules, RuleId::ALL.to_vec());
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let config = AnalyzerConfig::from_toml_str(
            "throws_functions = [\"assert.throws\", \"t.throws\"]\nrules = [\"exception-message\"]\n",
            None,
        )
        .expect("config should parse");

        assert_eq!(config.throws_functions, vec!["assert.throws", "t.throws"]);
        assert_eq!(config.rules, vec![RuleId::ExceptionMessage]);
        assert_eq!(config.test_functions, vec!["test", "it", "describe"]);
    }

    #[test]
    fn unknown_keys_and_rules_are_rejected_with_path() {
        let unknown_key = AnalyzerConfig::from_toml_str(
            "colour = true\n",
            Some(Path::new("testsift.toml")),
        )
        .expect_err("unknown key should fail");
        assert!(unknown_key.to_string().contains("testsift.toml"));

        let unknown_rule = AnalyzerConfig::from_toml_str("rules = [\"speed\"]\n", None)
            .expect_err("unknown rule should fail");
        assert!(unknown_rule.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn non_identifier_entries_are_rejected() {
        for document in [
            "test_functions = []\n",
            "test_functions = [\"it(\"]\n",
            "throws_functions = [\"assert..throws\"]\n",
            "assert_throw_methods = [\"to Throw\"]\n",
        ] {
            assert!(
                AnalyzerConfig::from_toml_str(document, None).is_err(),
                "{document:?} should be rejected"
            );
        }
    }

    #[test]
    fn load_reads_file_and_reports_missing_file_as_io_error() {
        let directory = tempdir().expect("tempdir should be created");
        let path = directory.path().join("testsift.toml");
        std::fs::write(&path, "assert_throw_methods = [\"toThrow\"]\n")
            .expect("config write should succeed");

        let config = AnalyzerConfig::load(&path).expect("config should load");
        assert_eq!(config.assert_throw_methods, vec!["toThrow"]);

        let missing = AnalyzerConfig::load(&directory.path().join("absent.toml"))
            .expect_err("missing file should fail");
        assert_eq!(missing.to_error_response().error.r#type, "io_error");
    }

    #[test]
    fn cli_rules_override_configured_rules_when_present() {
        let config = AnalyzerConfig::default().with_rules(vec![RuleId::Boundary]);
        assert_eq!(config.rules, vec![RuleId::Boundary]);

        let unchanged = AnalyzerConfig::default().with_rules(Vec::new());
        assert_eq!(unchanged.rules, RuleId::ALL.to_vec());
    }
}
