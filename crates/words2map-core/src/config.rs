use serde::{Deserialize, Serialize};

/// Heuristics of the keyword research pipeline.
///
/// Every field has a serde default so a partial `[research]` table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// How many top keywords are combined into the derived vector.
    #[serde(default = "default_keyword_count")]
    pub keyword_count: usize,
    /// Minimum raw occurrence count for an n-gram to be considered.
    #[serde(default = "default_min_frequency")]
    pub min_frequency: usize,
    /// Longest n-gram extracted.
    #[serde(default = "default_max_ngram")]
    pub max_ngram: usize,
    /// Search results requested per phrase.
    #[serde(default = "default_results_per_search")]
    pub results_per_search: u32,
    /// Attempts made at the search step before giving up.
    #[serde(default = "default_max_search_attempts")]
    pub max_search_attempts: u32,
    /// Pause between search attempts, in milliseconds.
    #[serde(default)]
    pub retry_delay_ms: u64,
    /// Upper bound on a single page fetch and extraction, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Denominator of the rarity ratio. Defaults to the store size.
    #[serde(default)]
    pub max_word_index: Option<u32>,
}

fn default_keyword_count() -> usize {
    25
}

fn default_min_frequency() -> usize {
    3
}

fn default_max_ngram() -> usize {
    3
}

fn default_results_per_search() -> u32 {
    10
}

fn default_max_search_attempts() -> u32 {
    3
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            keyword_count: default_keyword_count(),
            min_frequency: default_min_frequency(),
            max_ngram: default_max_ngram(),
            results_per_search: default_results_per_search(),
            max_search_attempts: default_max_search_attempts(),
            retry_delay_ms: 0,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_word_index: None,
        }
    }
}

impl ResearchConfig {
    /// Reject values that would make the pipeline meaningless.
    pub fn validate(&self) -> crate::Words2MapResult<()> {
        if self.keyword_count == 0 {
            return Err(crate::Words2MapError::Config(
                "keyword_count must be at least 1".to_string(),
            ));
        }
        if self.max_ngram == 0 {
            return Err(crate::Words2MapError::Config(
                "max_ngram must be at least 1".to_string(),
            ));
        }
        if self.max_search_attempts == 0 {
            return Err(crate::Words2MapError::Config(
                "max_search_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_word_index == Some(0) {
            return Err(crate::Words2MapError::Config(
                "max_word_index must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ResearchConfig::default();
        assert_eq!(cfg.keyword_count, 25);
        assert_eq!(cfg.min_frequency, 3);
        assert_eq!(cfg.max_ngram, 3);
        assert_eq!(cfg.results_per_search, 10);
        assert_eq!(cfg.max_search_attempts, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: ResearchConfig = toml::from_str("keyword_count = 10").unwrap();
        assert_eq!(cfg.keyword_count, 10);
        assert_eq!(cfg.min_frequency, 3);
        assert_eq!(cfg.max_word_index, None);
    }

    #[test]
    fn test_validate_rejects_zero_keywords() {
        let cfg = ResearchConfig {
            keyword_count: 0,
            ..ResearchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let cfg = ResearchConfig {
            max_search_attempts: 0,
            ..ResearchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
