use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Knobs for the multi-restart search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Number of independent trials.
    pub iterations: usize,
    /// Base seed; trial `i` shuffles with `seed + i`. Drawn at random when unset.
    pub seed: Option<u64>,
    /// Run trials on the rayon pool in batches.
    pub parallel: bool,
    /// Trials per batch, and per progress report, when `parallel` is set.
    pub batch_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            iterations: 12_500,
            seed: None,
            parallel: false,
            batch_size: 64,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid search config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("iterations must be at least 1")]
    ZeroIterations,
    #[error("batch_size must be at least 1")]
    ZeroBatch,
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<SearchConfig, ConfigError> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = SearchConfig::from_json(r#"{"iterations": 10, "seed": 7}"#).unwrap();
        assert_eq!(config.iterations, 10);
        assert_eq!(config.seed, Some(7));
        assert!(!config.parallel);
        assert_eq!(config.batch_size, 64);
    }

    #[test]
    fn rejects_zero_iterations() {
        assert!(matches!(
            SearchConfig::from_json(r#"{"iterations": 0}"#),
            Err(ConfigError::ZeroIterations)
        ));
        assert!(matches!(
            SearchConfig::default().with_batch_size(0).validate(),
            Err(ConfigError::ZeroBatch)
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(matches!(
            SearchConfig::from_json(r#"{"iterations": 3, "workers": 2}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
