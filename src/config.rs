use serde::{Deserialize, Serialize};

use crate::error::{LexiqError, Result};

/// Configuration for query translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Upper bound on full passes through the lowering pipeline.
    pub max_lowering_rounds: usize,
    /// Similarity used when a fuzzy call gives none.
    pub default_fuzzy_similarity: f32,
    /// Cap on the edit distance of fuzzy queries.
    pub max_fuzzy_edits: u32,
    /// Wildcard token matching any value, used for null tests.
    pub all_values_token: String,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self {
            max_lowering_rounds: 8,
            default_fuzzy_similarity: 0.5,
            max_fuzzy_edits: 2,
            all_values_token: "*".to_string(),
        }
    }

    pub fn builder() -> CompilerConfigBuilder {
        CompilerConfigBuilder::default()
    }

    /// Load from a JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_lowering_rounds == 0 {
            return Err(LexiqError::invalid_config(
                "max_lowering_rounds must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.default_fuzzy_similarity) {
            return Err(LexiqError::invalid_config(format!(
                "default_fuzzy_similarity must be within [0, 1], got {}",
                self.default_fuzzy_similarity
            )));
        }
        if self.all_values_token.is_empty() {
            return Err(LexiqError::invalid_config(
                "all_values_token must not be empty",
            ));
        }
        Ok(())
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct CompilerConfigBuilder {
    config: CompilerConfig,
}

impl CompilerConfigBuilder {
    pub fn max_lowering_rounds(mut self, rounds: usize) -> Self {
        self.config.max_lowering_rounds = rounds;
        self
    }

    pub fn default_fuzzy_similarity(mut self, similarity: f32) -> Self {
        self.config.default_fuzzy_similarity = similarity;
        self
    }

    pub fn max_fuzzy_edits(mut self, edits: u32) -> Self {
        self.config.max_fuzzy_edits = edits;
        self
    }

    pub fn all_values_token(mut self, token: impl Into<String>) -> Self {
        self.config.all_values_token = token.into();
        self
    }

    pub fn build(self) -> Result<CompilerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration for a snapshot [`Context`](crate::context::Context).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Label carried into log lines.
    pub name: String,
    /// Run snapshot-loading callbacks before publishing a reloaded snapshot.
    pub prewarm: bool,
}

impl ContextConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prewarm: true,
        }
    }

    pub fn with_prewarm(mut self, prewarm: bool) -> Self {
        self.prewarm = prewarm;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::new("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.max_lowering_rounds, 8);
        assert_eq!(config.all_values_token, "*");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_compiler_from_json_partial() {
        let config = CompilerConfig::from_json(r#"{"max_fuzzy_edits": 1}"#).unwrap();
        assert_eq!(config.max_fuzzy_edits, 1);
        assert_eq!(config.max_lowering_rounds, 8);

        let err = CompilerConfig::from_json(r#"{"max_lowering_rounds": 0}"#).unwrap_err();
        assert!(matches!(err, LexiqError::InvalidConfig(_)));
    }

    #[test]
    fn test_builder_validates() {
        assert!(
            CompilerConfig::builder()
                .default_fuzzy_similarity(1.5)
                .build()
                .is_err()
        );
        let config = CompilerConfig::builder()
            .all_values_token("?*")
            .build()
            .unwrap();
        assert_eq!(config.all_values_token, "?*");
    }

    #[test]
    fn test_context_config_json() {
        let config = ContextConfig::from_json(r#"{"name": "products"}"#).unwrap();
        assert_eq!(config.name, "products");
        assert!(config.prewarm);
    }
}
