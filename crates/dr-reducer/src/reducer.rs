//! Reducer entry point: dispatches on the top-level shape of the input.

use crate::columns::{is_record_array, ArrayProfile};
use crate::cost::{estimate_array_tokens, estimate_tokens};
use crate::{salience, selector, walker};
use dr_core::{
    percentage, reduction_ratio, ArrayMetadata, Budget, Metadata, ReducerConfig, Result, SkipRules,
};
use serde_json::Value;
use tracing::debug;

/// Reduced data plus what happened to it.
#[derive(Debug, Clone)]
pub struct Reduction {
    pub data: Value,
    pub metadata: Metadata,
}

impl Reduction {
    /// `{"data": ..., "metadata": ...}`.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "data": self.data,
            "metadata": self.metadata,
        })
    }
}

/// One compressed record array.
#[derive(Debug, Clone)]
pub struct ArrayReduction {
    pub records: Vec<Value>,
    pub metadata: ArrayMetadata,
}

/// Budgeted record-array reducer. Holds the validated configuration and the
/// compiled skip rules; stateless across calls.
#[derive(Debug, Clone)]
pub struct DataReducer {
    config: ReducerConfig,
    skip_rules: SkipRules,
}

impl DataReducer {
    pub fn new(config: ReducerConfig) -> Result<Self> {
        config.validate()?;
        let skip_rules = SkipRules::from_config(&config)?;
        Ok(Self { config, skip_rules })
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    pub fn skip_rules(&self) -> &SkipRules {
        &self.skip_rules
    }

    /// Reduce any value: record arrays are compressed directly, mappings are
    /// walked for nested arrays, anything else comes back untouched.
    pub fn reduce(&self, data: Value) -> Reduction {
        match data {
            Value::Array(items) => {
                if items.is_empty() || is_record_array(&items) {
                    let budget = self.config.budget();
                    if let Some(metadata) = self.below_floor(&items, budget) {
                        return Reduction { data: Value::Array(items), metadata: Metadata::Array(metadata) };
                    }
                    let out = self.compress_array(items, budget);
                    Reduction { data: Value::Array(out.records), metadata: Metadata::Array(out.metadata) }
                } else {
                    let tokens = estimate_array_tokens(&items);
                    let metadata = ArrayMetadata::unchanged(
                        items.len(),
                        tokens,
                        "Array elements are not all records",
                    );
                    Reduction { data: Value::Array(items), metadata: Metadata::Array(metadata) }
                }
            }
            Value::Object(_) => {
                let (data, report) = walker::reduce_tree(self, data);
                Reduction { data, metadata: Metadata::Tree(report) }
            }
            other => {
                let metadata = Metadata::Unsupported {
                    message: "Data format not supported".into(),
                    original_type: type_name(&other).into(),
                    original_tokens: estimate_tokens(&other),
                };
                Reduction { data: other, metadata }
            }
        }
    }

    /// Top-level arrays below the size floor, or at or below the token floor
    /// under a token budget, are left alone.
    fn below_floor(&self, items: &[Value], budget: Budget) -> Option<ArrayMetadata> {
        if items.is_empty() {
            return None;
        }
        let n = items.len();
        let tokens = estimate_array_tokens(items);
        let too_small = n < self.config.min_array_size
            || (budget.is_tokens() && tokens <= self.config.min_array_tokens);
        if !too_small {
            return None;
        }
        debug!(n, tokens, "array below compression floor");
        Some(ArrayMetadata::unchanged(n, tokens, "Data too small for compression"))
    }

    /// Compress one record array toward `budget`.
    pub fn compress_array(&self, records: Vec<Value>, budget: Budget) -> ArrayReduction {
        let n = records.len();
        if n == 0 {
            return ArrayReduction { records, metadata: ArrayMetadata::unchanged(0, 0, "Empty data") };
        }
        let original_tokens = estimate_array_tokens(&records);
        if n <= self.config.min_points {
            let metadata = ArrayMetadata::unchanged(n, original_tokens, "Data too small for compression");
            return ArrayReduction { records, metadata };
        }

        let fits = match budget {
            Budget::Tokens(t) => original_tokens <= t,
            _ => selector::item_target(budget, n, self.config.min_points) == Some(n),
        };
        let selection = if fits {
            debug!(n, original_tokens, ?budget, "array already within budget");
            selector::Selection { indices: (0..n).collect(), tokens: original_tokens }
        } else {
            let profile = ArrayProfile::build(&records, &self.config);
            let salient = salience::salient_indices(&profile, &self.config);
            debug!(n, salient = salient.len(), ?budget, "salient indices found");
            selector::select(&profile, salient, budget, self.config.min_points)
        };

        let kept = take_indices(records, &selection.indices);
        let compression_ratio = reduction_ratio(n, kept.len());
        let token_compression_ratio = reduction_ratio(original_tokens, selection.tokens);
        let metadata = ArrayMetadata {
            original_size: n,
            compressed_size: kept.len(),
            original_tokens,
            compressed_tokens: selection.tokens,
            compression_ratio,
            token_compression_ratio,
            compression_percentage: percentage(compression_ratio),
            token_compression_percentage: percentage(token_compression_ratio),
            preserved_indices: selection.indices,
            method: Some(self.config.method.clone()),
            message: None,
            config_used: Some(self.config.clone()),
        };
        ArrayReduction { records: kept, metadata }
    }
}

/// Move out the records at `indices` (strictly increasing).
fn take_indices(records: Vec<Value>, indices: &[usize]) -> Vec<Value> {
    let mut wanted = indices.iter().peekable();
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, r)| {
            if wanted.peek() == Some(&&i) {
                wanted.next();
                Some(r)
            } else {
                None
            }
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
