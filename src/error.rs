use crate::formula::{EvaluationError, SyntaxError};
use crate::seed::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Formula Syntax Error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Formula Evaluation Error for '{keyword}': {source}")]
    Evaluation {
        keyword: String,
        #[source]
        source: EvaluationError,
    },

    #[error("Seed Source Error: {0}")]
    Source(#[from] SourceError),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Invalid Keyword: {0}")]
    InvalidKeyword(String),
}

pub type KoResult<T> = Result<T, OptimizerError>;
