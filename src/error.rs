use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors surfaced to callers of the analysis pipeline.
///
/// Insufficient data is deliberately not an error: it is reported as a
/// warning outcome (see `compare::ComparisonOutcome`) so callers always
/// receive a structured result.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Invalid request parameter (bad date range, unparseable date).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Anything unexpected; logged with context before propagation.
    #[error("internal error: {0}")]
    Internal(String),
}
