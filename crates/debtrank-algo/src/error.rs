//! Error taxonomy for network construction and simulation.
//!
//! Every variant is raised while building or validating inputs; once a
//! solver run has passed validation its iteration loop cannot fail.

use debtrank_core::SparseError;
use thiserror::Error;

/// Unified error type for DebtRank operations.
#[derive(Error, Debug)]
pub enum DebtRankError {
    /// Matrix and vector dimensions disagree
    #[error("Shape error: {0}")]
    Shape(String),

    /// Non-positive (or missing) capital referenced by an exposure
    #[error("Division error: institution {institution} has non-positive capital {capital}")]
    Division { institution: usize, capital: f64 },

    /// Total exposure is zero, so loan fractions are undefined
    #[error("Degenerate network: total exposure is zero")]
    DegenerateNetwork,

    /// Unknown operator name or invalid solver settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed edges, capitals or shocks
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Other sparse-store failures
    #[error("Sparse error: {0}")]
    Sparse(SparseError),

    /// Reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing a configuration file or encoding a report
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience type alias for Results using DebtRankError.
pub type DebtRankResult<T> = Result<T, DebtRankError>;

impl From<SparseError> for DebtRankError {
    fn from(err: SparseError) -> Self {
        match err {
            SparseError::UnknownOperator(_) | SparseError::OperatorKind { .. } => {
                DebtRankError::Configuration(err.to_string())
            }
            SparseError::ShapeMismatch { .. }
            | SparseError::IndexOutOfBounds { .. }
            | SparseError::IndexOutOfRange { .. } => DebtRankError::Shape(err.to_string()),
            other => DebtRankError::Sparse(other),
        }
    }
}

impl From<toml::de::Error> for DebtRankError {
    fn from(err: toml::de::Error) -> Self {
        DebtRankError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for DebtRankError {
    fn from(err: serde_json::Error) -> Self {
        DebtRankError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DebtRankError::Division {
            institution: 2,
            capital: 0.0,
        };
        assert!(err.to_string().contains("institution 2"));
        assert!(DebtRankError::DegenerateNetwork
            .to_string()
            .contains("total exposure is zero"));
    }

    #[test]
    fn test_sparse_error_mapping() {
        let err: DebtRankError = SparseError::UnknownOperator("nope".into()).into();
        assert!(matches!(err, DebtRankError::Configuration(_)));

        let err: DebtRankError = SparseError::ShapeMismatch {
            context: "mat_vec",
            expected: 3,
            found: 2,
        }
        .into();
        assert!(matches!(err, DebtRankError::Shape(_)));

        let err: DebtRankError = SparseError::DivisionByZero { numerator: 1.0 }.into();
        assert!(matches!(err, DebtRankError::Sparse(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing config");
        let err: DebtRankError = io_err.into();
        assert!(matches!(err, DebtRankError::Io(_)));
    }
}
