//! Configuration for the vector store and RAG services.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters shared by [`VectorStoreService`](crate::VectorStoreService)
/// and [`RagService`](crate::RagService).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Number of results returned when the caller does not specify a limit.
    pub default_limit: usize,
    /// Minimum similarity kept by advanced search. Low on purpose: short
    /// documents score low even when relevant.
    pub similarity_threshold: f32,
    /// Candidates fetched per requested result, so filtering needs no second round trip.
    pub over_fetch_factor: usize,
    /// Maximum characters of each document shown to the model.
    pub context_char_limit: usize,
    /// Number of most recent conversation turns included in a prompt.
    pub history_window: usize,
    /// Number of uploads listed in a documents summary.
    pub recent_uploads_limit: usize,
    /// Maximum documents scanned when building a documents summary.
    pub summary_scan_limit: usize,
    /// Upper bound on a single embedding call.
    pub embedding_timeout: Duration,
    /// Upper bound on a single generation call.
    pub generation_timeout: Duration,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            similarity_threshold: 0.05,
            over_fetch_factor: 2,
            context_char_limit: 1000,
            history_window: 4,
            recent_uploads_limit: 10,
            summary_scan_limit: 1000,
            embedding_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(60),
        }
    }
}

impl RagConfig {
    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if:
    /// - `default_limit`, `over_fetch_factor` or `context_char_limit` is zero
    /// - `similarity_threshold` is not finite
    /// - either timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == 0 {
            return Err(RagError::Configuration("default_limit must be greater than zero".into()));
        }
        if self.over_fetch_factor == 0 {
            return Err(RagError::Configuration(
                "over_fetch_factor must be greater than zero".into(),
            ));
        }
        if self.context_char_limit == 0 {
            return Err(RagError::Configuration(
                "context_char_limit must be greater than zero".into(),
            ));
        }
        if !self.similarity_threshold.is_finite() {
            return Err(RagError::Configuration(format!(
                "similarity_threshold ({}) must be a finite number",
                self.similarity_threshold
            )));
        }
        if self.embedding_timeout.is_zero() || self.generation_timeout.is_zero() {
            return Err(RagError::Configuration("timeouts must be greater than zero".into()));
        }
        Ok(())
    }

    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the default number of results.
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Set the minimum similarity threshold for advanced search.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the candidate over-fetch factor.
    pub fn over_fetch_factor(mut self, factor: usize) -> Self {
        self.config.over_fetch_factor = factor;
        self
    }

    /// Set the per-document excerpt length in characters.
    pub fn context_char_limit(mut self, limit: usize) -> Self {
        self.config.context_char_limit = limit;
        self
    }

    /// Set how many recent conversation turns reach the prompt.
    pub fn history_window(mut self, turns: usize) -> Self {
        self.config.history_window = turns;
        self
    }

    /// Set how many recent uploads a summary lists.
    pub fn recent_uploads_limit(mut self, limit: usize) -> Self {
        self.config.recent_uploads_limit = limit;
        self
    }

    /// Set how many documents a summary scans.
    pub fn summary_scan_limit(mut self, limit: usize) -> Self {
        self.config.summary_scan_limit = limit;
        self
    }

    /// Set the embedding call timeout.
    pub fn embedding_timeout(mut self, timeout: Duration) -> Self {
        self.config.embedding_timeout = timeout;
        self
    }

    /// Set the generation call timeout.
    pub fn generation_timeout(mut self, timeout: Duration) -> Self {
        self.config.generation_timeout = timeout;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if [`RagConfig::validate`] fails.
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
