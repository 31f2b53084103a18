//! Error handling for Flexion
//!
//! This module provides the error types used across the crate. Configuration
//! problems (bad rule tables, unknown tags) are reported eagerly at load time;
//! per-table problems never surface as errors, only as diagnostics.

use std::fmt;

/// Configuration error detected while validating a rule table, tag
/// vocabulary extension, or language policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A rule refers to a tag that is not in the vocabulary
    UnknownTag { rule: String, tag: String },
    /// A rule restricts on a part of speech that is not recognized
    UnknownPartOfSpeech { rule: String, pos: String },
    /// A decision node has no `then`, `else` or `default` to fall back to
    DeadDecisionBranch { rule: String },
    /// A rule table entry has an empty key
    EmptyRuleKey,
    /// Input could not be parsed (file loading, JSON tables)
    InvalidInput { message: String },
    /// IO error (for file operations)
    IoError { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownTag { rule, tag } => {
                write!(f, "rule {:?} contains unknown tag {:?}", rule, tag)
            }
            ConfigError::UnknownPartOfSpeech { rule, pos } => {
                write!(
                    f,
                    "rule {:?} restricts on unknown part of speech {:?}",
                    rule, pos
                )
            }
            ConfigError::DeadDecisionBranch { rule } => {
                write!(
                    f,
                    "rule {:?} has a decision node with no then/else/default branch",
                    rule
                )
            }
            ConfigError::EmptyRuleKey => write!(f, "rule table contains an empty key"),
            ConfigError::InvalidInput { message } => {
                write!(f, "invalid input: {}", message)
            }
            ConfigError::IoError { message } => write!(f, "IO error: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type for configuration loading. Validation collects all problems
/// rather than stopping at the first one.
pub type ConfigResult<T> = Result<T, Vec<ConfigError>>;

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unknown_tag(rule: impl Into<String>, tag: impl Into<String>) -> Self {
        ConfigError::UnknownTag {
            rule: rule.into(),
            tag: tag.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_display() {
        let err = ConfigError::unknown_tag("plural", "plurral");
        let msg = err.to_string();
        assert!(msg.contains("plural"));
        assert!(msg.contains("plurral"));
    }

    #[test]
    fn test_dead_branch_display() {
        let err = ConfigError::DeadDecisionBranch {
            rule: "singular".to_string(),
        };
        assert!(err.to_string().contains("then/else/default"));
    }
}
