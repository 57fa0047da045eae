//! Reducer configuration.

use crate::error::{ReducerError, Result};
use crate::types::Budget;
use serde::{Deserialize, Serialize};

/// Immutable reduction policy, threaded explicitly through every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Absolute item budget (total across arrays for trees).
    pub target_size: Option<usize>,
    /// Absolute token budget (total across arrays for trees).
    pub target_tokens: Option<usize>,
    /// Fraction of records to drop when no absolute budget is set.
    pub reduction_ratio: f64,
    pub preserve_anomalies: bool,
    pub preserve_extremes: bool,
    /// Minimum records retained per array.
    pub min_points: usize,
    /// Arrays with fewer records are not compressed inside trees.
    pub min_array_size: usize,
    /// Arrays with a lower estimated cost are not compressed inside trees.
    pub min_array_tokens: usize,
    /// Opaque label copied into metadata.
    pub method: String,
    pub sequence_key: String,
    pub significant_cols: Vec<String>,
    /// Exact dotted paths or single path segments to leave alone.
    pub skip_fields: Vec<String>,
    /// Regular expressions searched in the full dotted path.
    pub skip_patterns: Vec<String>,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            target_size: None,
            target_tokens: None,
            reduction_ratio: 0.3,
            preserve_anomalies: true,
            preserve_extremes: true,
            min_points: 3,
            min_array_size: 10,
            min_array_tokens: 200,
            method: "hybrid".into(),
            sequence_key: "Cycle".into(),
            significant_cols: Vec::new(),
            skip_fields: Vec::new(),
            skip_patterns: Vec::new(),
        }
    }
}

impl ReducerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an already-parsed options mapping. Unknown keys are ignored,
    /// missing keys take their defaults.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value.clone())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_target_size(mut self, n: usize) -> Self {
        self.target_size = Some(n);
        self
    }

    pub fn with_target_tokens(mut self, n: usize) -> Self {
        self.target_tokens = Some(n);
        self
    }

    pub fn with_reduction_ratio(mut self, ratio: f64) -> Self {
        self.reduction_ratio = ratio;
        self
    }

    pub fn with_anomalies(mut self, on: bool) -> Self {
        self.preserve_anomalies = on;
        self
    }

    pub fn with_extremes(mut self, on: bool) -> Self {
        self.preserve_extremes = on;
        self
    }

    pub fn with_min_points(mut self, n: usize) -> Self {
        self.min_points = n;
        self
    }

    pub fn with_min_array_size(mut self, n: usize) -> Self {
        self.min_array_size = n;
        self
    }

    pub fn with_min_array_tokens(mut self, n: usize) -> Self {
        self.min_array_tokens = n;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_sequence_key(mut self, key: impl Into<String>) -> Self {
        self.sequence_key = key.into();
        self
    }

    pub fn with_significant_cols<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.significant_cols = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skip_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_skip_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// The one budget this configuration asks for.
    pub fn budget(&self) -> Budget {
        match (self.target_size, self.target_tokens) {
            (Some(n), _) => Budget::Items(n),
            (None, Some(n)) => Budget::Tokens(n),
            (None, None) => Budget::Ratio(self.reduction_ratio),
        }
    }

    /// Check the policy is coherent. Skip patterns are compiled here too so a
    /// bad expression surfaces before any data is touched.
    pub fn validate(&self) -> Result<()> {
        if self.target_size.is_some() && self.target_tokens.is_some() {
            return Err(ReducerError::ConflictingBudgets);
        }
        if !self.reduction_ratio.is_finite() || !(0.0..=1.0).contains(&self.reduction_ratio) {
            return Err(ReducerError::InvalidRatio(self.reduction_ratio));
        }
        if self.sequence_key.is_empty() {
            return Err(ReducerError::InvalidConfig("sequence_key must not be empty".into()));
        }
        for pattern in &self.skip_patterns {
            regex::Regex::new(pattern).map_err(|source| ReducerError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
