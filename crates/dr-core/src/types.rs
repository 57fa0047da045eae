use crate::config::ReducerConfig;
use serde::{Deserialize, Serialize};

/// The single budget an array is compressed towards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Budget {
    /// Keep `floor(n * (1 - ratio))` records.
    Ratio(f64),
    /// Keep this many records.
    Items(usize),
    /// Keep the estimated token cost at or under this ceiling.
    Tokens(usize),
}

impl Budget {
    pub fn is_tokens(&self) -> bool {
        matches!(self, Self::Tokens(_))
    }
}

/// Role a field plays in the analysis of one array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Consistently numeric; feeds anomaly, extreme and significance statistics.
    Numeric,
    /// Explicitly configured; every value change is a transition to keep.
    Significant,
    /// The configured sequence/time key; never analysed.
    SequenceKey,
    /// Carried through untouched.
    Inert,
}

/// Why a discovered array was left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ExactPath(String),
    PathSegment(String),
    Pattern(String),
    BelowMinSize { size: usize, min: usize },
    BelowMinTokens { tokens: usize, min: usize },
}

impl SkipReason {
    pub fn describe(&self) -> String {
        match self {
            Self::ExactPath(p) => format!("Matched skip field {p:?} (exact path)"),
            Self::PathSegment(s) => format!("Matched skip field {s:?} (path segment)"),
            Self::Pattern(p) => format!("Matched skip pattern {p:?}"),
            Self::BelowMinSize { size, min } => {
                format!("Below minimum array size ({size} < {min})")
            }
            Self::BelowMinTokens { tokens, min } => {
                format!("Below minimum token threshold ({tokens} < {min})")
            }
        }
    }
}

/// Per-array decision made once during discovery.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayPlan {
    Skip(SkipReason),
    Compress(Budget),
}

/// Metadata for one compressed (or passed-through) record array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayMetadata {
    pub original_size: usize,
    pub compressed_size: usize,
    pub original_tokens: usize,
    pub compressed_tokens: usize,
    pub compression_ratio: f64,
    pub token_compression_ratio: f64,
    pub compression_percentage: String,
    pub token_compression_percentage: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub preserved_indices: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub config_used: Option<ReducerConfig>,
}

impl ArrayMetadata {
    /// Metadata for an array returned verbatim.
    pub fn unchanged(size: usize, tokens: usize, message: impl Into<String>) -> Self {
        Self {
            original_size: size,
            compressed_size: size,
            original_tokens: tokens,
            compressed_tokens: tokens,
            compression_ratio: 0.0,
            token_compression_ratio: 0.0,
            compression_percentage: percentage(0.0),
            token_compression_percentage: percentage(0.0),
            preserved_indices: Vec::new(),
            method: None,
            message: Some(message.into()),
            config_used: None,
        }
    }
}

/// Outcome of one array inside a tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionDetail {
    pub path: String,
    pub original_size: usize,
    pub compressed_size: usize,
    pub original_tokens: usize,
    pub compressed_tokens: usize,
    pub compression_ratio: f64,
    pub token_compression_ratio: f64,
    pub allocated_target: Option<usize>,
    pub proportion_of_compressible: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedDetail {
    pub path: String,
    pub size: usize,
    pub tokens: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetAllocation {
    pub path: String,
    pub allocated_target: Option<usize>,
    pub proportion: f64,
}

/// Aggregate report over every array discovered in a tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeReport {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    pub arrays_found: usize,
    pub arrays_compressible: usize,
    pub arrays_skipped: usize,
    pub arrays_compressed: usize,
    pub total_original_tokens: usize,
    pub total_compressible_tokens: usize,
    pub total_skipped_tokens: usize,
    pub total_compressed_tokens: usize,
    pub total_original_size: usize,
    pub total_compressed_size: usize,
    pub overall_compression_ratio: f64,
    pub overall_compression_percentage: String,
    pub compressible_compression_ratio: f64,
    pub compressible_compression_percentage: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_total: Option<Budget>,
    pub compression_details: Vec<CompressionDetail>,
    pub skipped_details: Vec<SkippedDetail>,
    pub target_distribution: Vec<TargetAllocation>,
}

/// Metadata attached to any reduction, shaped by the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metadata {
    Array(ArrayMetadata),
    Tree(TreeReport),
    Unsupported {
        message: String,
        original_type: String,
        original_tokens: usize,
    },
}

/// `"70.0%"` style rendering of a ratio.
pub fn percentage(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// `(original - compressed) / original`, 0 when nothing was there.
pub fn reduction_ratio(original: usize, compressed: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64
}
