//! Parser configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What the script driver does when a statement fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicy {
    /// Stop at the first failed statement.
    Abort,
    /// Record the error, skip to the next `;`, keep parsing.
    #[default]
    SkipToTerminator,
}

/// Knobs for a parse run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub recovery: RecoveryPolicy,
    /// Cache decision outcomes by (decision, token position) within one statement.
    pub memoize_decisions: bool,
    /// Expression / pattern nesting limit. Deeper input is a syntax error
    /// rather than a stack overflow.
    pub max_nesting_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            recovery: RecoveryPolicy::SkipToTerminator,
            memoize_decisions: true,
            max_nesting_depth: 256,
        }
    }
}

impl ParserConfig {
    /// Abort on first error instead of recovering.
    pub fn strict() -> Self {
        Self { recovery: RecoveryPolicy::Abort, ..Self::default() }
    }

    pub fn with_recovery(mut self, recovery: RecoveryPolicy) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_memoization(mut self, enabled: bool) -> Self {
        self.memoize_decisions = enabled;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Load from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_nesting_depth == 0 {
            return Err(Error::Config("max_nesting_depth must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.recovery, RecoveryPolicy::SkipToTerminator);
        assert!(config.memoize_decisions);
        assert_eq!(config.max_nesting_depth, 256);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ParserConfig::from_json(r#"{"recovery": "abort"}"#).unwrap();
        assert_eq!(config.recovery, RecoveryPolicy::Abort);
        assert_eq!(config.max_nesting_depth, 256);
    }

    #[test]
    fn test_from_json_rejects_zero_depth() {
        let err = ParserConfig::from_json(r#"{"max_nesting_depth": 0}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builders() {
        let config = ParserConfig::strict().with_memoization(false).with_max_nesting_depth(8);
        assert_eq!(config.recovery, RecoveryPolicy::Abort);
        assert!(!config.memoize_decisions);
        assert_eq!(config.max_nesting_depth, 8);
    }
}
