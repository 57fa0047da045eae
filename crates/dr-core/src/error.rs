use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReducerError {
    #[error("target_size and target_tokens are mutually exclusive")]
    ConflictingBudgets,
    #[error("Invalid reduction ratio: {0} (expected a value in [0, 1])")]
    InvalidRatio(f64),
    #[error("Invalid skip pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReducerError>;
