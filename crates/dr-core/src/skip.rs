//! Compiled skip rules for dotted array paths.

use crate::config::ReducerConfig;
use crate::error::{ReducerError, Result};
use crate::types::SkipReason;
use regex::Regex;

#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    fields: Vec<String>,
    patterns: Vec<Regex>,
}

impl SkipRules {
    pub fn new(fields: &[String], patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| ReducerError::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields: fields.to_vec(), patterns })
    }

    pub fn from_config(config: &ReducerConfig) -> Result<Self> {
        Self::new(&config.skip_fields, &config.skip_patterns)
    }

    /// First rule matching `path`: exact path, then any path segment, then
    /// pattern search.
    pub fn check(&self, path: &str) -> Option<SkipReason> {
        if let Some(f) = self.fields.iter().find(|f| f.as_str() == path) {
            return Some(SkipReason::ExactPath(f.clone()));
        }
        for segment in path.split('.') {
            if let Some(f) = self.fields.iter().find(|f| f.as_str() == segment) {
                return Some(SkipReason::PathSegment(f.clone()));
            }
        }
        self.patterns
            .iter()
            .find(|re| re.is_match(path))
            .map(|re| SkipReason::Pattern(re.as_str().to_string()))
    }
}
